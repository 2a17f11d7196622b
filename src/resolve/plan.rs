//! Resolved configuration (the build plan)
//!
//! Everything here is concrete: one mode branch, substituted environment
//! values, absolute paths. Maps are ordered and no timestamps are recorded,
//! so the canonical JSON of a plan depends only on its inputs.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::config::ConfigSource;
use crate::descriptor::{
    CssModulesSection, DevtoolSetting, HtmlPluginSpec, OptimizationSection, ReactPluginSpec,
    SvgrSpec,
};
use crate::digest::sha256_hex;
use crate::env::{EnvValue, Mode};

/// Schema version for resolved plans
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "bundle-plan/resolved@1";

/// Plan output errors
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfiguration {
    pub schema_version: u32,
    pub schema_id: String,
    pub mode: Mode,

    /// Absolute project root
    pub context: String,

    pub entry: BTreeMap<String, String>,
    pub output: ResolvedOutput,
    pub devtool: DevtoolSetting,
    pub module: ResolvedModule,
    pub resolve: ResolvedResolve,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_modules: Option<CssModulesSection>,

    pub plugins: Vec<ResolvedPlugin>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<ResolvedDevServer>,

    pub optimization: OptimizationSection,

    /// Environment variables the descriptor referenced
    pub env_references: BTreeSet<String>,

    /// Descriptor layers, lowest precedence first
    pub sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOutput {
    /// Absolute output directory
    pub path: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_filename: Option<String>,
    pub public_path: EnvValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_prefix: Option<EnvValue>,
    pub clean: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedModule {
    pub rules: Vec<ResolvedRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRule {
    pub test: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub loaders: Option<Vec<ResolvedLoader>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLoader {
    pub loader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResolve {
    pub extensions: Vec<String>,
    /// Alias name → absolute directory
    pub alias: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResolvedPlugin {
    Clean,
    Html(HtmlPluginSpec),
    TypeCheck(ResolvedTypeCheck),
    Define(ResolvedDefine),
    ModuleFederation(ResolvedFederation),
    React(ReactPluginSpec),
    Svgr(SvgrSpec),
}

impl ResolvedPlugin {
    /// The `kind` tag this plugin serializes with
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedPlugin::Clean => "clean",
            ResolvedPlugin::Html(_) => "html",
            ResolvedPlugin::TypeCheck(_) => "type-check",
            ResolvedPlugin::Define(_) => "define",
            ResolvedPlugin::ModuleFederation(_) => "module-federation",
            ResolvedPlugin::React(_) => "react",
            ResolvedPlugin::Svgr(_) => "svgr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTypeCheck {
    /// Absolute tsconfig path
    pub config_file: String,
    pub blocking: bool,
    /// Inverse of `blocking`, in the checker's own terms
    #[serde(rename = "async")]
    pub run_async: bool,
    pub build_mode: String,
    pub memory_limit: u32,
    pub profile: bool,
    pub semantic: bool,
    pub syntactic: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedDefine {
    /// Identifier → JavaScript expression
    pub definitions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFederation {
    pub name: String,
    pub filename: String,
    pub exposes: BTreeMap<String, String>,
    pub remotes: BTreeMap<String, EnvValue>,
    pub shared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDevServer {
    /// Absolute static directory
    pub static_dir: String,
    pub history_api_fallback: bool,
    pub port: u16,
    pub hot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl ResolvedConfiguration {
    /// Attach descriptor provenance
    pub fn with_sources(mut self, sources: Vec<ConfigSource>) -> Self {
        self.sources = sources;
        self
    }

    /// RFC 8785 canonical JSON bytes
    pub fn to_canonical_vec(&self) -> Result<Vec<u8>, PlanError> {
        serde_json_canonicalizer::to_vec(self).map_err(|e| PlanError::Canonicalization(e.to_string()))
    }

    /// Plan digest: SHA-256 hex of the canonical JSON
    pub fn digest(&self) -> Result<String, PlanError> {
        Ok(sha256_hex(&self.to_canonical_vec()?))
    }

    /// Serialize to JSON (pretty printed)
    pub fn to_json_pretty(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write canonical or pretty JSON to a file
    pub fn write_to_file(&self, path: &Path, canonical: bool) -> Result<(), PlanError> {
        let bytes = if canonical {
            self.to_canonical_vec()?
        } else {
            self.to_json_pretty()?.into_bytes()
        };
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.resolve.alias.get(name).map(String::as_str)
    }

    /// All define expressions across define plugins
    pub fn definitions(&self) -> BTreeMap<&str, &str> {
        self.plugins
            .iter()
            .filter_map(|p| match p {
                ResolvedPlugin::Define(define) => Some(define),
                _ => None,
            })
            .flat_map(|d| d.definitions.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .collect()
    }

    pub fn type_check(&self) -> Option<&ResolvedTypeCheck> {
        self.plugins.iter().find_map(|p| match p {
            ResolvedPlugin::TypeCheck(tc) => Some(tc),
            _ => None,
        })
    }

    pub fn federation(&self) -> Option<&ResolvedFederation> {
        self.plugins.iter().find_map(|p| match p {
            ResolvedPlugin::ModuleFederation(mf) => Some(mf),
            _ => None,
        })
    }
}
