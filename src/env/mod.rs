//! Build mode and environment context
//!
//! The [`EnvironmentContext`] is the only input to resolution that comes from
//! outside the descriptor. It is captured once, up front, from the process
//! environment and optional dotenv files; the resolver never reads ambient
//! state itself.

mod template;

pub use template::{is_valid_var_name, EnvTemplate, EnvValue, TemplateError};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Prefix of variables exposed to application code without being referenced
pub const EXPOSED_PREFIX: &str = "REACT_APP_";

/// Variables always captured in addition to the exposed prefix
pub const ALWAYS_CAPTURED: &[&str] = &["PUBLIC_URL", "NODE_ENV"];

/// Environment errors
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid mode '{0}': expected 'development' or 'production'")]
    InvalidMode(String),

    #[error("failed to read dotenv file {path}: {message}")]
    Dotenv { path: String, message: String },
}

/// Build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }

    /// Mode implied by a `NODE_ENV` value; anything unrecognised is development
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("production") => Mode::Production,
            _ => Mode::Development,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            _ => Err(EnvError::InvalidMode(s.to_string())),
        }
    }
}

/// Mode flag plus the environment variables visible to resolution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentContext {
    mode: Mode,
    vars: BTreeMap<String, String>,
}

impl EnvironmentContext {
    /// Empty context for the given mode
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            vars: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var(name, value);
        self
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Build a context from an arbitrary variable source, keeping only
    /// exposed variables and the ones the descriptor references.
    pub fn from_vars<I>(mode: Mode, vars: I, referenced: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars = vars
            .into_iter()
            .filter(|(name, _)| is_captured(name, referenced))
            .collect();
        Self { mode, vars }
    }

    /// Capture from dotenv files under `root` (when `use_dotenv`) and the
    /// process environment. Process variables win over every dotenv file.
    pub fn capture(
        mode: Mode,
        root: &Path,
        referenced: &BTreeSet<String>,
        use_dotenv: bool,
    ) -> Result<Self, EnvError> {
        // Non-UTF-8 variables cannot be embedded in a plan
        let process = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::capture_from(mode, root, referenced, use_dotenv, process)
    }

    /// Like [`capture`](Self::capture), with `process_vars` standing in for
    /// the process environment
    pub fn capture_from<I>(
        mode: Mode,
        root: &Path,
        referenced: &BTreeSet<String>,
        use_dotenv: bool,
        process_vars: I,
    ) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged = BTreeMap::new();

        if use_dotenv {
            for name in dotenv_files(mode) {
                let path = root.join(&name);
                if !path.is_file() {
                    continue;
                }
                let entries = read_dotenv(&path)?;
                tracing::debug!(file = %path.display(), count = entries.len(), "loaded dotenv file");
                merged.extend(entries);
            }
        }

        merged.extend(process_vars);

        let context = Self::from_vars(mode, merged, referenced);
        tracing::debug!(mode = %mode, captured = context.vars.len(), "captured environment");
        Ok(context)
    }
}

fn is_captured(name: &str, referenced: &BTreeSet<String>) -> bool {
    name.starts_with(EXPOSED_PREFIX) || ALWAYS_CAPTURED.contains(&name) || referenced.contains(name)
}

/// Dotenv file names for a mode, lowest precedence first
pub fn dotenv_files(mode: Mode) -> Vec<String> {
    vec![
        ".env".to_string(),
        format!(".env.{}", mode),
        ".env.local".to_string(),
        format!(".env.{}.local", mode),
    ]
}

/// Parse a dotenv file without touching the process environment
fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>, EnvError> {
    let to_err = |e: dotenvy::Error| EnvError::Dotenv {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    dotenvy::from_path_iter(path)
        .map_err(to_err)?
        .map(|item| item.map_err(to_err))
        .collect()
}
