//! Pipeline orchestration
//!
//! Load layers → capture environment → resolve. This is the only place that
//! touches ambient state (current directory, process environment, dotenv
//! files); everything it hands to the resolver is explicit.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{ConfigError, ConfigOrigin, LayeredDescriptor, LoadOptions};
use crate::env::{EnvError, EnvironmentContext, Mode};
use crate::resolve::{PlanError, ResolvedConfiguration, ResolvedPlugin, Resolver, ValidationError};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(ConfigError),

    #[error("environment error: {0}")]
    Env(#[from] EnvError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("output error: {0}")]
    Plan(#[from] PlanError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Field(field) => PipelineError::Validation(field),
            other => PipelineError::Config(other),
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything needed to produce a plan
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Project root; relative roots are taken from the current directory
    pub root: PathBuf,
    pub mode: Mode,
    pub load: LoadOptions,
    pub use_dotenv: bool,
    pub check_paths: bool,
}

impl PlanRequest {
    pub fn new(root: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            root: root.into(),
            mode,
            load: LoadOptions::default(),
            use_dotenv: true,
            check_paths: true,
        }
    }
}

/// A resolved plan and the environment it was resolved against
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: ResolvedConfiguration,
    pub env: EnvironmentContext,
}

/// Run the full pipeline for a request
pub fn build_plan(request: &PlanRequest) -> PipelineResult<PlanOutcome> {
    let root = absolute_root(&request.root)?;

    let layered = LayeredDescriptor::build(&root, request.mode, &request.load)?;
    let referenced = layered.descriptor.referenced_vars();
    let env = EnvironmentContext::capture(request.mode, &root, &referenced, request.use_dotenv)?;

    let plan = Resolver::new(&root)
        .check_paths(request.check_paths)
        .resolve(&layered.descriptor, &env)?
        .with_sources(layered.sources);

    tracing::info!(mode = %request.mode, layers = plan.sources.len(), "resolved build plan");
    Ok(PlanOutcome { plan, env })
}

fn absolute_root(root: &Path) -> io::Result<PathBuf> {
    if root.is_absolute() {
        Ok(root.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}

impl PlanOutcome {
    /// Human-readable summary of layers, env references and mode branches
    pub fn to_human(&self) -> String {
        let plan = &self.plan;
        let mut lines = Vec::new();

        lines.push(format!("Mode: {}", plan.mode));
        lines.push(format!("Context: {}", plan.context));

        lines.push(String::new());
        lines.push("Layers (lowest precedence first):".to_string());
        for source in &plan.sources {
            let origin = match source.origin {
                ConfigOrigin::Builtin => "builtin",
                ConfigOrigin::File => "file",
                ConfigOrigin::Mode => "mode overrides",
                ConfigOrigin::Cli => "cli",
            };
            let mut line = format!("  - {}", origin);
            if let Some(path) = &source.path {
                line.push_str(&format!(" {}", path));
            }
            if let Some(digest) = &source.digest {
                line.push_str(&format!(" (sha256 {})", &digest[..digest.len().min(12)]));
            }
            lines.push(line);
        }

        lines.push(String::new());
        lines.push("Mode branches:".to_string());
        lines.push(format!("  output.filename: {}", plan.output.filename));
        if let Some(chunk) = &plan.output.chunk_filename {
            lines.push(format!("  output.chunk_filename: {}", chunk));
        }
        let devtool = serde_json::to_value(&plan.devtool)
            .map(|v| v.to_string())
            .unwrap_or_default();
        lines.push(format!("  devtool: {}", devtool));
        if let Some(tc) = plan.type_check() {
            lines.push(format!(
                "  type-check: {}",
                if tc.blocking { "blocking" } else { "non-blocking" }
            ));
        }

        lines.push(String::new());
        lines.push("Environment references:".to_string());
        if plan.env_references.is_empty() {
            lines.push("  (none)".to_string());
        }
        for name in &plan.env_references {
            let state = if self.env.get(name).is_some() { "set" } else { "undefined" };
            lines.push(format!("  {}: {}", name, state));
        }

        lines.push(String::new());
        lines.push("Aliases:".to_string());
        for (name, path) in &plan.resolve.alias {
            lines.push(format!("  {} -> {}", name, path));
        }

        let kinds: Vec<&str> = plan.plugins.iter().map(ResolvedPlugin::kind).collect();
        lines.push(String::new());
        lines.push(format!("Plugins: {}", kinds.join(", ")));

        lines.join("\n")
    }
}
