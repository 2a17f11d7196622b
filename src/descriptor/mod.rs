//! Typed configuration descriptor
//!
//! The descriptor is what a project declares in `bundle-plan.toml` after
//! all layers are merged. It is deserialized once from the merged JSON value
//! and never mutated afterwards; the resolver only reads it.

mod plugins;

pub use plugins::{
    DefineSource, DefineSpec, FederationSpec, HtmlPluginSpec, PluginSpec, ReactPluginSpec,
    SvgrSpec, TypeCheckSpec,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::env::{EnvTemplate, Mode};
use crate::resolve::ValidationError;

/// Per-mode pair of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerMode<T> {
    pub development: T,
    pub production: T,
}

/// A value that is either shared by both modes or given per mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeValue<T> {
    PerMode(PerMode<T>),
    Both(T),
}

impl<T> ModeValue<T> {
    /// Select the branch for `mode`
    pub fn select(&self, mode: Mode) -> &T {
        match self {
            ModeValue::PerMode(pair) => match mode {
                Mode::Development => &pair.development,
                Mode::Production => &pair.production,
            },
            ModeValue::Both(value) => value,
        }
    }
}

/// Source-map strategy: `false` or a devtool name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DevtoolSetting {
    Flag(bool),
    Name(String),
}

/// Root descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationDescriptor {
    /// Chunk name → entry module, relative to the project root
    pub entry: BTreeMap<String, String>,

    pub output: OutputSection,

    pub devtool: ModeValue<DevtoolSetting>,

    #[serde(default)]
    pub module: ModuleSection,

    #[serde(default)]
    pub resolve: ResolveSection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_modules: Option<CssModulesSection>,

    #[serde(default)]
    pub plugins: Vec<PluginSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerSection>,

    #[serde(default)]
    pub optimization: OptimizationSection,
}

/// Output rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_path")]
    pub path: String,

    pub filename: ModeValue<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_filename: Option<ModeValue<String>>,

    /// Env template
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Env template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_prefix: Option<String>,

    #[serde(default)]
    pub clean: bool,
}

fn default_output_path() -> String {
    "dist".to_string()
}

fn default_public_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSection {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// A module transform rule: either a loader chain or an asset type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Regex matched against module paths
    pub test: String,

    /// Regex matched against the importing module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Regex flags; only `i` is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub loaders: Option<Vec<LoaderSpec>>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

/// Loader reference: bare name or name with options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoaderSpec {
    Name(String),
    Entry {
        loader: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<Value>,
    },
}

impl LoaderSpec {
    pub fn name(&self) -> &str {
        match self {
            LoaderSpec::Name(name) => name,
            LoaderSpec::Entry { loader, .. } => loader,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            LoaderSpec::Name(_) => None,
            LoaderSpec::Entry { options, .. } => options.as_ref(),
        }
    }
}

/// Module resolution settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveSection {
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Alias name → directory relative to the project root
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CssModulesSection {
    #[serde(default = "default_true")]
    pub auto: bool,

    #[serde(default = "default_local_ident_name")]
    pub local_ident_name: String,

    #[serde(default = "default_export_locals_convention")]
    pub export_locals_convention: String,
}

fn default_local_ident_name() -> String {
    "[name]__[local]___[hash:base64:5]".to_string()
}

fn default_export_locals_convention() -> String {
    "camelCaseOnly".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevServerSection {
    /// Static file directory, relative to the project root
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default)]
    pub history_api_fallback: bool,

    pub port: u16,

    #[serde(default)]
    pub hot: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

fn default_static_dir() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationSection {
    #[serde(default = "default_module_ids")]
    pub module_ids: String,

    #[serde(default = "default_runtime_chunk")]
    pub runtime_chunk: String,

    #[serde(default)]
    pub split_chunks: SplitChunksSection,
}

impl Default for OptimizationSection {
    fn default() -> Self {
        Self {
            module_ids: default_module_ids(),
            runtime_chunk: default_runtime_chunk(),
            split_chunks: SplitChunksSection::default(),
        }
    }
}

fn default_module_ids() -> String {
    "deterministic".to_string()
}

fn default_runtime_chunk() -> String {
    "single".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitChunksSection {
    #[serde(default)]
    pub cache_groups: BTreeMap<String, CacheGroupSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheGroupSpec {
    pub test: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_chunks")]
    pub chunks: String,

    #[serde(default)]
    pub priority: i32,
}

fn default_chunks() -> String {
    "all".to_string()
}

impl ConfigurationDescriptor {
    /// Deserialize from a merged JSON value.
    ///
    /// Shape and type errors carry the dotted path of the offending field;
    /// errors at the top level are reported against `descriptor`.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        serde_path_to_error::deserialize(value).map_err(|err| {
            let path = err.path().to_string();
            let field = if path == "." { "descriptor".to_string() } else { path };
            ValidationError::new(field, err.into_inner().to_string())
        })
    }

    /// Every template string in the descriptor, with its field path
    pub fn env_templates(&self) -> Vec<(String, &str)> {
        let mut out = vec![("output.public_path".to_string(), self.output.public_path.as_str())];
        if let Some(prefix) = &self.output.asset_prefix {
            out.push(("output.asset_prefix".to_string(), prefix.as_str()));
        }
        for (index, plugin) in self.plugins.iter().enumerate() {
            if let PluginSpec::ModuleFederation(spec) = plugin {
                for (name, url) in &spec.remotes {
                    out.push((format!("plugins[{}].remotes.{}", index, name), url.as_str()));
                }
            }
        }
        out
    }

    /// Names of all environment variables the descriptor references.
    ///
    /// Malformed templates are skipped here; the resolver reports them.
    pub fn referenced_vars(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .env_templates()
            .into_iter()
            .filter_map(|(_, raw)| EnvTemplate::parse(raw).ok())
            .flat_map(|t| t.variables().map(str::to_string).collect::<Vec<_>>())
            .collect();

        for plugin in &self.plugins {
            if let PluginSpec::Define(spec) = plugin {
                for source in spec.definitions.values() {
                    if let DefineSource::Env { env } = source {
                        names.insert(env.clone());
                    }
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "entry": {"main": "./src/index.tsx"},
            "output": {
                "filename": {"development": "[name].js", "production": "[name].[contenthash].js"}
            },
            "devtool": {"development": "inline-source-map", "production": "source-map"}
        })
    }

    #[test]
    fn test_parse_minimal_descriptor() {
        let desc = ConfigurationDescriptor::from_value(minimal()).unwrap();
        assert_eq!(desc.output.path, "dist");
        assert_eq!(desc.output.public_path, "/");
        assert!(desc.plugins.is_empty());
        assert_eq!(desc.optimization.module_ids, "deterministic");
    }

    #[test]
    fn test_mode_value_select() {
        let desc = ConfigurationDescriptor::from_value(minimal()).unwrap();
        assert_eq!(desc.output.filename.select(Mode::Development), "[name].js");
        assert_eq!(
            desc.output.filename.select(Mode::Production),
            "[name].[contenthash].js"
        );
    }

    #[test]
    fn test_mode_value_shared() {
        let value: ModeValue<DevtoolSetting> = serde_json::from_value(json!(false)).unwrap();
        assert!(matches!(value, ModeValue::Both(_)));
        assert_eq!(value.select(Mode::Production), &DevtoolSetting::Flag(false));
    }

    #[test]
    fn test_mode_value_rejects_unknown_mode_key() {
        let result: Result<ModeValue<String>, _> =
            serde_json::from_value(json!({"development": "a", "staging": "b"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let mut value = minimal();
        value["outptu"] = json!({});
        let err = ConfigurationDescriptor::from_value(value).unwrap_err();
        assert!(err.reason.contains("outptu"));
    }

    #[test]
    fn test_type_errors_name_field() {
        let mut value = minimal();
        value["dev_server"] = json!({"port": 70000});
        let err = ConfigurationDescriptor::from_value(value).unwrap_err();
        assert_eq!(err.field, "dev_server.port");

        let mut value = minimal();
        value["dev_server"] = json!({"port": "abc"});
        assert_eq!(ConfigurationDescriptor::from_value(value).unwrap_err().field, "dev_server.port");

        let mut value = minimal();
        value["output"]["filename"] = json!(5);
        assert_eq!(ConfigurationDescriptor::from_value(value).unwrap_err().field, "output.filename");
    }

    #[test]
    fn test_loader_forms() {
        let rule: RuleSpec = serde_json::from_value(json!({
            "test": "\\.css$",
            "use": ["style-loader", {"loader": "css-loader", "options": {"modules": true}}]
        }))
        .unwrap();
        let loaders = rule.loaders.unwrap();
        assert_eq!(loaders[0].name(), "style-loader");
        assert!(loaders[0].options().is_none());
        assert_eq!(loaders[1].name(), "css-loader");
        assert_eq!(loaders[1].options().unwrap()["modules"], true);
    }

    #[test]
    fn test_referenced_vars() {
        let mut value = minimal();
        value["output"]["public_path"] = json!("${PUBLIC_URL:-/}");
        value["plugins"] = json!([
            {"kind": "define", "definitions": {
                "process.env.REACT_APP_AUTH_BASE_URL": {"env": "REACT_APP_AUTH_BASE_URL"},
                "process.env.FLAG": {"json": true}
            }},
            {"kind": "module-federation", "name": "host", "remotes": {
                "remote": "remote@${REMOTE_URL}/remoteEntry.js"
            }}
        ]);
        let desc = ConfigurationDescriptor::from_value(value).unwrap();
        let vars: Vec<String> = desc.referenced_vars().into_iter().collect();
        assert_eq!(vars, vec!["PUBLIC_URL", "REACT_APP_AUTH_BASE_URL", "REMOTE_URL"]);
    }
}
