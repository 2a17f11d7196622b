//! bundle-plan - build configuration resolution for federated web bundles
//!
//! This crate turns a declarative bundler descriptor plus an environment
//! context into a fully resolved, validated build plan that an external
//! bundler engine consumes. Resolution is a pure, single-pass transform:
//! identical inputs produce byte-identical canonical JSON.

pub mod config;
pub mod descriptor;
pub mod digest;
pub mod env;
pub mod logging;
pub mod pipeline;
pub mod resolve;

pub use config::{ConfigError, LayeredDescriptor, LoadOptions};
pub use descriptor::ConfigurationDescriptor;
pub use env::{EnvValue, EnvironmentContext, Mode};
pub use pipeline::{build_plan, PipelineError, PlanOutcome, PlanRequest};
pub use resolve::{ResolvedConfiguration, Resolver, ValidationError};
