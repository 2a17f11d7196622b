//! Layered descriptor loading with provenance
//!
//! Captures the merged descriptor plus information about where each layer
//! came from. File layers carry the SHA-256 of their raw bytes so a plan
//! can be traced back to the exact descriptor that produced it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::builtin_descriptor;
use super::merge::{deep_merge, merge_layers};
use crate::descriptor::ConfigurationDescriptor;
use crate::digest::sha256_hex;
use crate::env::Mode;
use crate::resolve::ValidationError;

/// File names probed in the project root, in order
pub const DISCOVERY_CANDIDATES: &[&str] = &["bundle-plan.toml", ".bundle-plan.toml", "bundle-plan.json"];

/// Key holding per-mode override tables inside a descriptor file
pub const OVERRIDES_KEY: &str = "overrides";

/// Origin of a descriptor layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Mode,
    Cli,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// How to assemble the layers
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Explicit descriptor file; when None the project root is searched
    pub config_path: Option<PathBuf>,

    /// Start from the built-in descriptor
    pub use_builtin: bool,

    /// CLI overlays, applied last in order
    pub overrides: Vec<Value>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            use_builtin: true,
            overrides: Vec::new(),
        }
    }
}

/// Merged descriptor with the layers that produced it
#[derive(Debug, Clone)]
pub struct LayeredDescriptor {
    pub descriptor: ConfigurationDescriptor,

    /// Sources in precedence order (lowest first)
    pub sources: Vec<ConfigSource>,
}

impl LayeredDescriptor {
    /// Build the descriptor for `mode` from all layers
    pub fn build(root: &Path, mode: Mode, options: &LoadOptions) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        if options.use_builtin {
            layers.push(builtin_descriptor());
            sources.push(ConfigSource {
                origin: ConfigOrigin::Builtin,
                path: None,
                digest: None,
            });
        }

        // Layers 2 and 3: descriptor file and its override table for `mode`
        let file = match &options.config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::IoError(format!(
                    "descriptor file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.clone()),
            None => discover_descriptor(root),
        };

        if let Some(path) = file {
            let (mut value, digest) = load_descriptor_file(&path)?;
            let mode_layer = take_mode_overrides(&mut value, mode)?;
            let shown = path.to_string_lossy().to_string();
            tracing::debug!(file = %shown, digest = %digest, "loaded descriptor file");

            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(shown.clone()),
                digest: Some(digest),
            });

            if let Some(overlay) = mode_layer {
                tracing::debug!(mode = %mode, "applying mode override table");
                layers.push(overlay);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Mode,
                    path: Some(shown),
                    digest: None,
                });
            }
        } else {
            tracing::debug!(root = %root.display(), "no descriptor file found; using built-in layers only");
        }

        // Layer 4: CLI overrides
        if !options.overrides.is_empty() {
            let cli = options
                .overrides
                .iter()
                .cloned()
                .fold(Value::Null, deep_merge);
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        if !merged.is_object() {
            return Err(ConfigError::ValidationError(
                "descriptor is empty: no built-in layer and no descriptor file".to_string(),
            ));
        }

        let descriptor = ConfigurationDescriptor::from_value(merged)?;

        Ok(Self {
            descriptor,
            sources,
        })
    }
}

/// Find a descriptor file in the project root
pub fn discover_descriptor(root: &Path) -> Option<PathBuf> {
    DISCOVERY_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| path.is_file())
}

/// Load and parse a descriptor file, returning the value and digest
fn load_descriptor_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
    let digest = sha256_hex(&bytes);

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let value = match ext.as_str() {
        "toml" => {
            let toml_value: toml::Value = toml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
            toml_to_json(toml_value)?
        }
        "json" => serde_json::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?,
        other => {
            return Err(ConfigError::ParseError(format!(
                "unsupported descriptor extension '.{}' for file {}",
                other,
                path.display()
            )));
        }
    };

    if !value.is_object() {
        return Err(ConfigError::ParseError(format!(
            "descriptor root must be a table: {}",
            path.display()
        )));
    }

    Ok((value, digest))
}

/// Remove the override table from a file value and return the entry for `mode`
fn take_mode_overrides(value: &mut Value, mode: Mode) -> Result<Option<Value>, ConfigError> {
    let Some(table) = value.as_object_mut().and_then(|m| m.remove(OVERRIDES_KEY)) else {
        return Ok(None);
    };

    let Value::Object(mut table) = table else {
        return Err(ConfigError::ValidationError(format!(
            "`{}` must be a table keyed by mode",
            OVERRIDES_KEY
        )));
    };

    if let Some(key) = table
        .keys()
        .find(|k| !matches!(k.as_str(), "development" | "production"))
    {
        return Err(ConfigError::ValidationError(format!(
            "`{}.{}`: unknown mode, expected 'development' or 'production'",
            OVERRIDES_KEY, key
        )));
    }

    match table.remove(mode.as_str()) {
        Some(overlay @ Value::Object(_)) => Ok(Some(overlay)),
        Some(_) => Err(ConfigError::ValidationError(format!(
            "`{}.{}` must be a table",
            OVERRIDES_KEY, mode
        ))),
        None => Ok(None),
    }
}

/// Convert TOML Value to JSON Value; NaN and infinities have no JSON form
fn toml_to_json(toml: toml::Value) -> Result<Value, ConfigError> {
    Ok(match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ConfigError::ParseError(format!("float {} has no JSON representation", f)))?,
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(
            arr.into_iter()
                .map(toml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| Ok((k, toml_to_json(v)?)))
                .collect::<Result<serde_json::Map<_, _>, ConfigError>>()?,
        ),
    })
}

/// Descriptor loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A merged descriptor field with the wrong shape or type
    #[error(transparent)]
    Field(#[from] ValidationError),
}
