//! Plugin declarations
//!
//! Plugins are tagged by `kind`. Each kind carries only the settings this
//! crate resolves; everything else is the bundler's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{default_true, ModeValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Empty the output directory before emitting
    Clean,
    Html(HtmlPluginSpec),
    TypeCheck(TypeCheckSpec),
    Define(DefineSpec),
    ModuleFederation(FederationSpec),
    React(ReactPluginSpec),
    Svgr(SvgrSpec),
}

impl PluginSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            PluginSpec::Clean => "clean",
            PluginSpec::Html(_) => "html",
            PluginSpec::TypeCheck(_) => "type-check",
            PluginSpec::Define(_) => "define",
            PluginSpec::ModuleFederation(_) => "module-federation",
            PluginSpec::React(_) => "react",
            PluginSpec::Svgr(_) => "svgr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlPluginSpec {
    pub template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Out-of-process TypeScript checking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCheckSpec {
    #[serde(default = "default_tsconfig")]
    pub config_file: String,

    /// Whether type errors block the build
    pub blocking: ModeValue<bool>,

    #[serde(default = "default_build_mode")]
    pub build_mode: String,

    /// Checker memory limit in MiB
    #[serde(default = "default_memory_limit")]
    pub memory_limit: u32,

    #[serde(default)]
    pub profile: bool,

    #[serde(default = "default_true")]
    pub semantic: bool,

    #[serde(default = "default_true")]
    pub syntactic: bool,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_tsconfig() -> String {
    "tsconfig.json".to_string()
}

fn default_build_mode() -> String {
    "write-references".to_string()
}

fn default_memory_limit() -> u32 {
    2048
}

/// Compile-time constant replacement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefineSpec {
    #[serde(default)]
    pub definitions: BTreeMap<String, DefineSource>,
}

/// Where a define value comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefineSource {
    /// Environment variable, embedded as a string literal
    Env { env: String },
    /// Literal JSON value
    Json { json: Value },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Public request (`./Button`) → module path
    #[serde(default)]
    pub exposes: BTreeMap<String, String>,

    /// Remote name → `name@url` env template
    #[serde(default)]
    pub remotes: BTreeMap<String, String>,

    /// Packages shared as singletons
    #[serde(default)]
    pub shared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactPluginSpec {
    pub runtime: String,
}

impl Default for ReactPluginSpec {
    fn default() -> Self {
        Self {
            runtime: "automatic".to_string(),
        }
    }
}

/// SVG-as-component transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgrSpec {
    pub export_type: String,
    pub svgo: bool,
}

impl Default for SvgrSpec {
    fn default() -> Self {
        Self {
            export_type: "named".to_string(),
            svgo: true,
        }
    }
}
