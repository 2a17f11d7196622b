//! Descriptor layering
//!
//! Implements the 4-layer descriptor merge:
//! 1. Built-in defaults
//! 2. Project descriptor file (bundle-plan.toml)
//! 3. The file's `[overrides.<mode>]` table for the active mode
//! 4. CLI `--set` overrides

mod defaults;
mod loader;
mod merge;

pub use defaults::{builtin_descriptor, DEFAULT_CONTAINER_NAME};
pub use loader::{
    discover_descriptor, ConfigError, ConfigOrigin, ConfigSource, LayeredDescriptor, LoadOptions,
    DISCOVERY_CANDIDATES, OVERRIDES_KEY,
};
pub use merge::{deep_merge, merge_layers, overlay_at_path, parse_assignment};
