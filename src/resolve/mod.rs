//! Configuration resolver
//!
//! Turns a [`ConfigurationDescriptor`] plus an [`EnvironmentContext`] into a
//! [`ResolvedConfiguration`] in a single synchronous pass:
//! - selects the active mode's branch of every mode value
//! - substitutes environment templates (missing → [`EnvValue::Undefined`])
//! - absolutizes aliases and output paths against the project root
//! - validates every field, failing on the first [`ValidationError`]
//!
//! The only ambient state consulted is the existence of alias directories,
//! and only when path checking is enabled.

mod paths;
mod plan;

pub use paths::{is_within, join_root, normalize};
pub use plan::{
    PlanError, ResolvedConfiguration, ResolvedDefine, ResolvedDevServer, ResolvedFederation,
    ResolvedLoader, ResolvedModule, ResolvedOutput, ResolvedPlugin, ResolvedResolve, ResolvedRule,
    ResolvedTypeCheck, SCHEMA_ID, SCHEMA_VERSION,
};

use globset::Glob;
use regex_lite::RegexBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::descriptor::{
    ConfigurationDescriptor, DefineSource, DevServerSection, DevtoolSetting, FederationSpec,
    OptimizationSection, OutputSection, PluginSpec, RuleSpec, TypeCheckSpec,
};
use crate::env::{is_valid_var_name, EnvTemplate, EnvValue, EnvironmentContext, Mode};

/// Define key that mirrors the build mode
pub const NODE_ENV_KEY: &str = "process.env.NODE_ENV";

/// Container entry file name when a federation plugin does not set one
pub const DEFAULT_REMOTE_ENTRY: &str = "remoteEntry.js";

const ASSET_TYPES: &[&str] = &["asset", "asset/resource", "asset/inline", "asset/source"];
const EXPORT_CONVENTIONS: &[&str] = &["asIs", "camelCase", "camelCaseOnly", "dashes", "dashesOnly"];
const TYPE_CHECK_BUILD_MODES: &[&str] = &["readonly", "write-tsbuildinfo", "write-dts", "write-references"];
const MODULE_IDS: &[&str] = &["deterministic", "named", "natural", "size"];
const RUNTIME_CHUNKS: &[&str] = &["single", "multiple", "disabled"];
const CHUNK_SELECTORS: &[&str] = &["all", "async", "initial"];
const HASH_PLACEHOLDERS: &[&str] = &["[contenthash", "[chunkhash", "[fullhash", "[hash"];

/// A malformed descriptor field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation error at `{field}`: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `resolve.alias.components`
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

type Result<T> = std::result::Result<T, ValidationError>;

/// Resolves descriptors against a fixed project root
#[derive(Debug, Clone)]
pub struct Resolver {
    project_root: PathBuf,
    check_paths: bool,
}

impl Resolver {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            check_paths: true,
        }
    }

    /// Toggle the alias directory existence check (on by default)
    pub fn check_paths(mut self, enabled: bool) -> Self {
        self.check_paths = enabled;
        self
    }

    /// Resolve a descriptor for the context's mode
    pub fn resolve(
        &self,
        descriptor: &ConfigurationDescriptor,
        env: &EnvironmentContext,
    ) -> Result<ResolvedConfiguration> {
        if !self.project_root.is_absolute() {
            return Err(ValidationError::new(
                "context",
                format!("project root must be absolute, got '{}'", self.project_root.display()),
            ));
        }
        let root = normalize(&self.project_root);
        let mode = env.mode();
        tracing::debug!(mode = %mode, root = %root.display(), "resolving descriptor");

        let entry = resolve_entry(&descriptor.entry)?;
        let output = resolve_output(&root, &descriptor.output, mode, env)?;
        let devtool = resolve_devtool(descriptor.devtool.select(mode))?;

        let rules = descriptor
            .module
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| resolve_rule(&format!("module.rules[{}]", i), rule))
            .collect::<Result<Vec<_>>>()?;

        let resolve = ResolvedResolve {
            extensions: validate_extensions(&descriptor.resolve.extensions)?,
            alias: self.resolve_aliases(&root, &descriptor.resolve.alias)?,
        };

        if let Some(css) = &descriptor.css_modules {
            if css.local_ident_name.trim().is_empty() {
                return Err(ValidationError::new("css_modules.local_ident_name", "must not be empty"));
            }
            expect_one_of("css_modules.export_locals_convention", &css.export_locals_convention, EXPORT_CONVENTIONS)?;
        }

        let plugins = resolve_plugins(&root, &descriptor.plugins, mode, env)?;

        let dev_server = descriptor
            .dev_server
            .as_ref()
            .map(|ds| resolve_dev_server(&root, ds))
            .transpose()?;

        validate_optimization(&descriptor.optimization)?;

        Ok(ResolvedConfiguration {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            mode,
            context: paths::display(&root),
            entry,
            output,
            devtool,
            module: ResolvedModule { rules },
            resolve,
            css_modules: descriptor.css_modules.clone(),
            plugins,
            dev_server,
            optimization: descriptor.optimization.clone(),
            env_references: descriptor.referenced_vars(),
            sources: Vec::new(),
        })
    }

    fn resolve_aliases(
        &self,
        root: &Path,
        aliases: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let mut resolved = BTreeMap::new();
        for (name, target) in aliases {
            let field = format!("resolve.alias.{}", name);
            if name.trim().is_empty() {
                return Err(ValidationError::new("resolve.alias", "alias name must not be empty"));
            }
            if target.trim().is_empty() {
                return Err(ValidationError::new(field, "alias target must not be empty"));
            }

            let path = join_root(root, target);
            if !is_within(root, &path) {
                return Err(ValidationError::new(
                    field,
                    format!("'{}' escapes the project root", target),
                ));
            }
            if self.check_paths && !path.is_dir() {
                return Err(ValidationError::new(
                    field,
                    format!("directory does not exist: {}", path.display()),
                ));
            }

            resolved.insert(name.clone(), paths::display(&path));
        }
        Ok(resolved)
    }
}

fn resolve_entry(entry: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
    if entry.is_empty() {
        return Err(ValidationError::new("entry", "at least one entry point is required"));
    }
    for (name, module) in entry {
        if name.trim().is_empty() {
            return Err(ValidationError::new("entry", "entry name must not be empty"));
        }
        if module.trim().is_empty() {
            return Err(ValidationError::new(format!("entry.{}", name), "module path must not be empty"));
        }
    }
    Ok(entry.clone())
}

fn resolve_output(
    root: &Path,
    output: &OutputSection,
    mode: Mode,
    env: &EnvironmentContext,
) -> Result<ResolvedOutput> {
    if output.path.trim().is_empty() {
        return Err(ValidationError::new("output.path", "must not be empty"));
    }

    let filename = output.filename.select(mode);
    validate_filename("output.filename", filename, mode)?;
    tracing::debug!(mode = %mode, filename = %filename, "selected output filename");

    let chunk_filename = match &output.chunk_filename {
        Some(value) => {
            let selected = value.select(mode);
            validate_filename("output.chunk_filename", selected, mode)?;
            Some(selected.clone())
        }
        None => None,
    };

    let public_path = render_template("output.public_path", &output.public_path, env)?;
    let asset_prefix = output
        .asset_prefix
        .as_ref()
        .map(|raw| render_template("output.asset_prefix", raw, env))
        .transpose()?;

    Ok(ResolvedOutput {
        path: paths::display(&join_root(root, &output.path)),
        filename: filename.clone(),
        chunk_filename,
        public_path,
        asset_prefix,
        clean: output.clean,
    })
}

/// Production filenames must carry a content hash; development ones must
/// carry no hash at all.
fn validate_filename(field: &str, filename: &str, mode: Mode) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    match mode {
        Mode::Production if !filename.contains("[contenthash") => Err(ValidationError::new(
            field,
            format!("production filename '{}' must include [contenthash]", filename),
        )),
        Mode::Development if HASH_PLACEHOLDERS.iter().any(|h| filename.contains(h)) => {
            Err(ValidationError::new(
                field,
                format!("development filename '{}' must not include a hash", filename),
            ))
        }
        _ => Ok(()),
    }
}

fn resolve_devtool(setting: &DevtoolSetting) -> Result<DevtoolSetting> {
    match setting {
        DevtoolSetting::Flag(false) => Ok(setting.clone()),
        DevtoolSetting::Flag(true) => Err(ValidationError::new(
            "devtool",
            "`true` is not a strategy; use false or a devtool name",
        )),
        DevtoolSetting::Name(name) if is_known_devtool(name) => Ok(setting.clone()),
        DevtoolSetting::Name(name) => Err(ValidationError::new(
            "devtool",
            format!("unknown devtool '{}'", name),
        )),
    }
}

/// `eval`, or `[inline-|hidden-|eval-][nosources-][cheap-[module-]]source-map`
fn is_known_devtool(name: &str) -> bool {
    if name == "eval" {
        return true;
    }
    let mut rest = name;
    for prefix in ["inline-", "hidden-", "eval-"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    rest = rest.strip_prefix("nosources-").unwrap_or(rest);
    if let Some(stripped) = rest.strip_prefix("cheap-") {
        rest = stripped.strip_prefix("module-").unwrap_or(stripped);
    }
    rest == "source-map"
}

fn resolve_rule(field: &str, rule: &RuleSpec) -> Result<ResolvedRule> {
    let case_insensitive = match rule.flags.as_deref() {
        None | Some("") => false,
        Some("i") => true,
        Some(other) => {
            return Err(ValidationError::new(
                format!("{}.flags", field),
                format!("unsupported regex flags '{}'; only 'i' is allowed", other),
            ));
        }
    };

    compile_regex(&format!("{}.test", field), &rule.test, case_insensitive)?;
    if let Some(issuer) = &rule.issuer {
        compile_regex(&format!("{}.issuer", field), issuer, false)?;
    }

    let loaders = match (&rule.loaders, &rule.asset_type) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::new(field, "set either `use` or `type`, not both"));
        }
        (None, None) => {
            return Err(ValidationError::new(field, "one of `use` or `type` is required"));
        }
        (Some(loaders), None) => {
            if loaders.is_empty() {
                return Err(ValidationError::new(format!("{}.use", field), "loader list must not be empty"));
            }
            let resolved = loaders
                .iter()
                .enumerate()
                .map(|(i, loader)| {
                    if loader.name().trim().is_empty() {
                        return Err(ValidationError::new(
                            format!("{}.use[{}]", field, i),
                            "loader name must not be empty",
                        ));
                    }
                    Ok(ResolvedLoader {
                        loader: loader.name().to_string(),
                        options: loader.options().cloned(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(resolved)
        }
        (None, Some(asset_type)) => {
            expect_one_of(&format!("{}.type", field), asset_type, ASSET_TYPES)?;
            None
        }
    };

    Ok(ResolvedRule {
        test: rule.test.clone(),
        issuer: rule.issuer.clone(),
        flags: rule.flags.clone().filter(|f| !f.is_empty()),
        loaders,
        asset_type: rule.asset_type.clone(),
    })
}

fn compile_regex(field: &str, pattern: &str, case_insensitive: bool) -> Result<()> {
    if pattern.is_empty() {
        return Err(ValidationError::new(field, "pattern must not be empty"));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map(|_| ())
        .map_err(|e| ValidationError::new(field, format!("invalid regex: {}", e)))
}

fn validate_extensions(extensions: &[String]) -> Result<Vec<String>> {
    for (i, ext) in extensions.iter().enumerate() {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ValidationError::new(
                format!("resolve.extensions[{}]", i),
                format!("'{}' must start with '.'", ext),
            ));
        }
    }
    Ok(extensions.to_vec())
}

fn render_template(field: &str, raw: &str, env: &EnvironmentContext) -> Result<EnvValue> {
    let template = EnvTemplate::parse(raw).map_err(|e| ValidationError::new(field, e.to_string()))?;
    let value = template.render(env);
    if value.is_undefined() {
        tracing::warn!(field = %field, template = %raw, "referenced environment variable is not set; value is undefined");
    }
    Ok(value)
}

fn resolve_plugins(
    root: &Path,
    plugins: &[PluginSpec],
    mode: Mode,
    env: &EnvironmentContext,
) -> Result<Vec<ResolvedPlugin>> {
    let mut resolved = Vec::with_capacity(plugins.len() + 1);
    let mut defined: BTreeMap<String, usize> = BTreeMap::new();
    let mut federation_at: Option<usize> = None;

    for (index, plugin) in plugins.iter().enumerate() {
        let field = format!("plugins[{}]", index);
        tracing::debug!(index, kind = plugin.kind(), "resolving plugin");
        let next = match plugin {
            PluginSpec::Clean => ResolvedPlugin::Clean,
            PluginSpec::Html(spec) => {
                if spec.template.trim().is_empty() {
                    return Err(ValidationError::new(format!("{}.template", field), "must not be empty"));
                }
                ResolvedPlugin::Html(spec.clone())
            }
            PluginSpec::TypeCheck(spec) => {
                ResolvedPlugin::TypeCheck(resolve_type_check(root, &field, spec, mode)?)
            }
            PluginSpec::Define(spec) => {
                let mut definitions = BTreeMap::new();
                for (key, source) in &spec.definitions {
                    let key_field = format!("{}.definitions.{}", field, key);
                    if key.trim().is_empty() {
                        return Err(ValidationError::new(format!("{}.definitions", field), "key must not be empty"));
                    }
                    if let Some(first) = defined.insert(key.clone(), index) {
                        return Err(ValidationError::new(
                            key_field,
                            format!("already defined by plugins[{}]", first),
                        ));
                    }
                    definitions.insert(key.clone(), define_expression(&key_field, source, env)?);
                }
                ResolvedPlugin::Define(ResolvedDefine { definitions })
            }
            PluginSpec::ModuleFederation(spec) => {
                if let Some(first) = federation_at {
                    return Err(ValidationError::new(
                        field,
                        format!("only one module-federation plugin is allowed (first at plugins[{}])", first),
                    ));
                }
                federation_at = Some(index);
                ResolvedPlugin::ModuleFederation(resolve_federation(&field, spec, env)?)
            }
            PluginSpec::React(spec) => {
                expect_one_of(&format!("{}.runtime", field), &spec.runtime, &["automatic", "classic"])?;
                ResolvedPlugin::React(spec.clone())
            }
            PluginSpec::Svgr(spec) => {
                expect_one_of(&format!("{}.export_type", field), &spec.export_type, &["named", "default"])?;
                ResolvedPlugin::Svgr(spec.clone())
            }
        };
        resolved.push(next);
    }

    if !defined.contains_key(NODE_ENV_KEY) {
        let expression = EnvValue::Defined(mode.as_str().to_string()).to_js_expression();
        let first_define = resolved
            .iter()
            .position(|p| matches!(p, ResolvedPlugin::Define(_)));
        match first_define {
            Some(at) => {
                if let ResolvedPlugin::Define(define) = &mut resolved[at] {
                    define.definitions.insert(NODE_ENV_KEY.to_string(), expression);
                }
            }
            None => {
                let mut definitions = BTreeMap::new();
                definitions.insert(NODE_ENV_KEY.to_string(), expression);
                resolved.push(ResolvedPlugin::Define(ResolvedDefine { definitions }));
            }
        }
    }

    Ok(resolved)
}

fn define_expression(field: &str, source: &DefineSource, env: &EnvironmentContext) -> Result<String> {
    match source {
        DefineSource::Env { env: name } => {
            if !is_valid_var_name(name) {
                return Err(ValidationError::new(field, format!("invalid variable name '{}'", name)));
            }
            let value = match env.get(name) {
                Some(v) => EnvValue::Defined(v.to_string()),
                None => {
                    tracing::warn!(field = %field, variable = %name, "environment variable is not set; defining as undefined");
                    EnvValue::Undefined
                }
            };
            Ok(value.to_js_expression())
        }
        DefineSource::Json { json } => Ok(json.to_string()),
    }
}

fn resolve_type_check(
    root: &Path,
    field: &str,
    spec: &TypeCheckSpec,
    mode: Mode,
) -> Result<ResolvedTypeCheck> {
    if spec.config_file.trim().is_empty() {
        return Err(ValidationError::new(format!("{}.config_file", field), "must not be empty"));
    }
    expect_one_of(&format!("{}.build_mode", field), &spec.build_mode, TYPE_CHECK_BUILD_MODES)?;
    if spec.memory_limit == 0 {
        return Err(ValidationError::new(format!("{}.memory_limit", field), "must be greater than zero"));
    }

    for (list, globs) in [("include", &spec.include), ("exclude", &spec.exclude)] {
        for (i, pattern) in globs.iter().enumerate() {
            Glob::new(pattern).map_err(|e| {
                ValidationError::new(format!("{}.{}[{}]", field, list, i), format!("invalid glob: {}", e))
            })?;
        }
    }

    let blocking = *spec.blocking.select(mode);
    tracing::debug!(mode = %mode, blocking, "selected type-check behavior");

    Ok(ResolvedTypeCheck {
        config_file: paths::display(&join_root(root, &spec.config_file)),
        blocking,
        run_async: !blocking,
        build_mode: spec.build_mode.clone(),
        memory_limit: spec.memory_limit,
        profile: spec.profile,
        semantic: spec.semantic,
        syntactic: spec.syntactic,
        include: spec.include.clone(),
        exclude: spec.exclude.clone(),
    })
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn resolve_federation(
    field: &str,
    spec: &FederationSpec,
    env: &EnvironmentContext,
) -> Result<ResolvedFederation> {
    if !is_js_identifier(&spec.name) {
        return Err(ValidationError::new(
            format!("{}.name", field),
            format!("'{}' is not a valid JavaScript identifier", spec.name),
        ));
    }

    let filename = spec
        .filename
        .clone()
        .unwrap_or_else(|| DEFAULT_REMOTE_ENTRY.to_string());
    if filename.trim().is_empty() {
        return Err(ValidationError::new(format!("{}.filename", field), "must not be empty"));
    }

    for (request, module) in &spec.exposes {
        let key_field = format!("{}.exposes.{}", field, request);
        if !request.starts_with("./") {
            return Err(ValidationError::new(key_field, "exposed request must start with './'"));
        }
        if module.trim().is_empty() {
            return Err(ValidationError::new(key_field, "module path must not be empty"));
        }
    }

    let mut remotes = BTreeMap::new();
    for (name, raw) in &spec.remotes {
        let key_field = format!("{}.remotes.{}", field, name);
        if !is_js_identifier(name) {
            return Err(ValidationError::new(key_field, "remote name is not a valid JavaScript identifier"));
        }
        remotes.insert(name.clone(), render_template(&key_field, raw, env)?);
    }

    if let Some(i) = spec.shared.iter().position(|s| s.trim().is_empty()) {
        return Err(ValidationError::new(format!("{}.shared[{}]", field, i), "must not be empty"));
    }

    Ok(ResolvedFederation {
        name: spec.name.clone(),
        filename,
        exposes: spec.exposes.clone(),
        remotes,
        shared: spec.shared.clone(),
    })
}

fn resolve_dev_server(root: &Path, spec: &DevServerSection) -> Result<ResolvedDevServer> {
    if spec.port == 0 {
        return Err(ValidationError::new("dev_server.port", "must be between 1 and 65535"));
    }
    if spec.static_dir.trim().is_empty() {
        return Err(ValidationError::new("dev_server.static_dir", "must not be empty"));
    }
    if let Some(host) = &spec.host {
        if host.trim().is_empty() {
            return Err(ValidationError::new("dev_server.host", "must not be empty when set"));
        }
    }

    Ok(ResolvedDevServer {
        static_dir: paths::display(&join_root(root, &spec.static_dir)),
        history_api_fallback: spec.history_api_fallback,
        port: spec.port,
        hot: spec.hot,
        host: spec.host.clone(),
    })
}

fn validate_optimization(spec: &OptimizationSection) -> Result<()> {
    expect_one_of("optimization.module_ids", &spec.module_ids, MODULE_IDS)?;
    expect_one_of("optimization.runtime_chunk", &spec.runtime_chunk, RUNTIME_CHUNKS)?;

    for (name, group) in &spec.split_chunks.cache_groups {
        let field = format!("optimization.split_chunks.cache_groups.{}", name);
        compile_regex(&format!("{}.test", field), &group.test, false)?;
        expect_one_of(&format!("{}.chunks", field), &group.chunks, CHUNK_SELECTORS)?;
        if let Some(chunk_name) = &group.name {
            if chunk_name.trim().is_empty() {
                return Err(ValidationError::new(format!("{}.name", field), "must not be empty when set"));
            }
        }
    }
    Ok(())
}

fn expect_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("'{}' is not one of: {}", value, allowed.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_descriptor;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let tmp = TempDir::new().expect("tmp");
        for dir in ["src/components", "src/utils", "src/assets"] {
            fs::create_dir_all(tmp.path().join(dir)).expect("mkdir");
        }
        tmp
    }

    fn builtin() -> ConfigurationDescriptor {
        ConfigurationDescriptor::from_value(builtin_descriptor()).expect("builtin")
    }

    fn with_patch(patch: serde_json::Value) -> ConfigurationDescriptor {
        let merged = crate::config::deep_merge(builtin_descriptor(), patch);
        ConfigurationDescriptor::from_value(merged).expect("descriptor")
    }

    #[test]
    fn test_resolve_builtin_production() {
        let tmp = project();
        let env = EnvironmentContext::new(Mode::Production);
        let plan = Resolver::new(tmp.path()).resolve(&builtin(), &env).unwrap();

        assert_eq!(plan.mode, Mode::Production);
        assert_eq!(plan.output.filename, "[name].[contenthash].js");
        assert_eq!(plan.devtool, DevtoolSetting::Name("source-map".to_string()));
        assert!(plan.type_check().unwrap().blocking);
        assert!(!plan.type_check().unwrap().run_async);
        assert_eq!(plan.output.public_path, EnvValue::Defined("/".to_string()));
    }

    #[test]
    fn test_resolve_builtin_development() {
        let tmp = project();
        let env = EnvironmentContext::new(Mode::Development);
        let plan = Resolver::new(tmp.path()).resolve(&builtin(), &env).unwrap();

        assert_eq!(plan.output.filename, "[name].js");
        assert_eq!(plan.devtool, DevtoolSetting::Name("inline-source-map".to_string()));
        assert!(plan.type_check().unwrap().run_async);
    }

    #[test]
    fn test_relative_root_rejected() {
        let env = EnvironmentContext::new(Mode::Development);
        let err = Resolver::new("relative/root").resolve(&builtin(), &env).unwrap_err();
        assert_eq!(err.field, "context");
    }

    #[test]
    fn test_production_filename_requires_content_hash() {
        let tmp = project();
        let desc = with_patch(json!({"output": {"filename": "[name].js"}}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Production))
            .unwrap_err();
        assert_eq!(err.field, "output.filename");
    }

    #[test]
    fn test_development_filename_rejects_hash() {
        let tmp = project();
        let desc = with_patch(json!({"output": {"chunk_filename": "[id].[chunkhash].js"}}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "output.chunk_filename");
    }

    #[test]
    fn test_single_bundle_filename_allowed() {
        assert!(validate_filename("f", "bundle.[contenthash].js", Mode::Production).is_ok());
        assert!(validate_filename("f", "bundle.js", Mode::Development).is_ok());
        assert!(validate_filename("f", "[id].[contenthash:8].js", Mode::Production).is_ok());
        assert!(validate_filename("f", "bundle.js", Mode::Production).is_err());
    }

    #[test]
    fn test_known_devtools() {
        for name in ["eval", "source-map", "inline-source-map", "eval-cheap-module-source-map", "hidden-nosources-source-map"] {
            assert!(is_known_devtool(name), "{}", name);
        }
        for name in ["", "inline", "cheap-eval-source-map", "source-maps"] {
            assert!(!is_known_devtool(name), "{}", name);
        }
    }

    #[test]
    fn test_devtool_true_rejected() {
        let err = resolve_devtool(&DevtoolSetting::Flag(true)).unwrap_err();
        assert_eq!(err.field, "devtool");
    }

    #[test]
    fn test_missing_alias_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/utils")).unwrap();
        fs::create_dir_all(tmp.path().join("src/assets")).unwrap();

        let err = Resolver::new(tmp.path())
            .resolve(&builtin(), &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "resolve.alias.components");
    }

    #[test]
    fn test_path_check_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        let plan = Resolver::new(tmp.path())
            .check_paths(false)
            .resolve(&builtin(), &EnvironmentContext::new(Mode::Development))
            .unwrap();
        assert!(plan.alias("components").unwrap().ends_with("src/components"));
    }

    #[test]
    fn test_alias_escaping_root_rejected() {
        let tmp = project();
        let desc = with_patch(json!({"resolve": {"alias": {"shared": "../shared"}}}));
        let err = Resolver::new(tmp.path())
            .check_paths(false)
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "resolve.alias.shared");
    }

    #[test]
    fn test_rule_needs_use_or_type() {
        let rule = RuleSpec {
            test: "\\.md$".to_string(),
            issuer: None,
            flags: None,
            loaders: None,
            asset_type: None,
        };
        assert_eq!(resolve_rule("module.rules[0]", &rule).unwrap_err().field, "module.rules[0]");
    }

    #[test]
    fn test_rule_bad_regex_and_flags() {
        let mut rule = RuleSpec {
            test: "\\.(ts|tsx$".to_string(),
            issuer: None,
            flags: None,
            loaders: None,
            asset_type: Some("asset".to_string()),
        };
        assert_eq!(resolve_rule("r", &rule).unwrap_err().field, "r.test");

        rule.test = "\\.ts$".to_string();
        rule.flags = Some("g".to_string());
        assert_eq!(resolve_rule("r", &rule).unwrap_err().field, "r.flags");
    }

    #[test]
    fn test_rule_bad_asset_type() {
        let rule = RuleSpec {
            test: "\\.png$".to_string(),
            issuer: None,
            flags: None,
            loaders: None,
            asset_type: Some("asset/url".to_string()),
        };
        assert_eq!(resolve_rule("r", &rule).unwrap_err().field, "r.type");
    }

    #[test]
    fn test_define_env_and_undefined() {
        let tmp = project();
        let env = EnvironmentContext::new(Mode::Production)
            .with_var("REACT_APP_AUTH_BASE_URL", "https://auth.example.com");
        let plan = Resolver::new(tmp.path()).resolve(&builtin(), &env).unwrap();
        let defs = plan.definitions();

        assert_eq!(defs["process.env.REACT_APP_AUTH_BASE_URL"], "\"https://auth.example.com\"");
        assert_eq!(defs["process.env.REACT_APP_APPLICATION_BASE_URL"], "undefined");
        assert_eq!(defs[NODE_ENV_KEY], "\"production\"");
    }

    #[test]
    fn test_explicit_node_env_kept() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "define", "definitions": {"process.env.NODE_ENV": {"json": ""}}}
        ]}));
        let plan = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Production))
            .unwrap();
        assert_eq!(plan.definitions()[NODE_ENV_KEY], "\"\"");
        assert_eq!(plan.plugins.len(), 1);
    }

    #[test]
    fn test_node_env_added_without_define_plugin() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [{"kind": "clean"}]}));
        let plan = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap();
        assert_eq!(plan.plugins.len(), 2);
        assert_eq!(plan.definitions()[NODE_ENV_KEY], "\"development\"");
    }

    #[test]
    fn test_duplicate_define_key() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "define", "definitions": {"A": {"json": 1}}},
            {"kind": "define", "definitions": {"A": {"json": 2}}}
        ]}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "plugins[1].definitions.A");
    }

    #[test]
    fn test_federation_validation() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "module-federation", "name": "my-remote"}
        ]}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "plugins[0].name");

        let desc = with_patch(json!({"plugins": [
            {"kind": "module-federation", "name": "shell", "exposes": {"Button": "./src/Button"}}
        ]}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "plugins[0].exposes.Button");
    }

    #[test]
    fn test_federation_remotes_substituted() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "module-federation", "name": "shell", "remotes": {
                "catalog": "catalog@${CATALOG_URL}/remoteEntry.js",
                "cart": "cart@${CART_URL:-http://localhost:9001}/remoteEntry.js"
            }}
        ]}));
        let env = EnvironmentContext::new(Mode::Development)
            .with_var("CATALOG_URL", "https://catalog.example.com");
        let plan = Resolver::new(tmp.path()).resolve(&desc, &env).unwrap();
        let mf = plan.federation().unwrap();

        assert_eq!(mf.filename, DEFAULT_REMOTE_ENTRY);
        assert_eq!(
            mf.remotes["catalog"],
            EnvValue::Defined("catalog@https://catalog.example.com/remoteEntry.js".to_string())
        );
        assert_eq!(
            mf.remotes["cart"],
            EnvValue::Defined("cart@http://localhost:9001/remoteEntry.js".to_string())
        );
    }

    #[test]
    fn test_second_federation_plugin_rejected() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "module-federation", "name": "a"},
            {"kind": "module-federation", "name": "b"}
        ]}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "plugins[1]");
    }

    #[test]
    fn test_invalid_type_check_glob() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "type-check", "blocking": true, "include": ["src/**/*.{ts,tsx"]}
        ]}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "plugins[0].include[0]");
    }

    #[test]
    fn test_malformed_public_path_template() {
        let tmp = project();
        let desc = with_patch(json!({"output": {"public_path": "${PUBLIC_URL"}}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "output.public_path");
    }

    #[test]
    fn test_dev_server_port_zero() {
        let tmp = project();
        let desc = with_patch(json!({"dev_server": {"port": 0}}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "dev_server.port");
    }

    #[test]
    fn test_optimization_values() {
        let tmp = project();
        let desc = with_patch(json!({"optimization": {"split_chunks": {"cache_groups": {
            "vendor": {"chunks": "some"}
        }}}}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "optimization.split_chunks.cache_groups.vendor.chunks");

        let desc = with_patch(json!({"optimization": {"module_ids": "hashed"}}));
        let err = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap_err();
        assert_eq!(err.field, "optimization.module_ids");
    }

    #[test]
    fn test_extension_without_dot() {
        assert_eq!(
            validate_extensions(&[".ts".to_string(), "tsx".to_string()]).unwrap_err().field,
            "resolve.extensions[1]"
        );
    }

    #[test]
    fn test_plugin_kind_matches_serialized_tag() {
        let tmp = project();
        let desc = with_patch(json!({"plugins": [
            {"kind": "clean"},
            {"kind": "react"},
            {"kind": "svgr"},
            {"kind": "module-federation", "name": "shell"}
        ]}));
        let plan = Resolver::new(tmp.path())
            .resolve(&desc, &EnvironmentContext::new(Mode::Development))
            .unwrap();

        let kinds: Vec<&str> = plan.plugins.iter().map(ResolvedPlugin::kind).collect();
        assert_eq!(kinds, vec!["clean", "react", "svgr", "module-federation", "define"]);
        for plugin in &plan.plugins {
            assert_eq!(serde_json::to_value(plugin).unwrap()["kind"], plugin.kind());
        }
    }

    #[test]
    fn test_error_display_names_field() {
        let err = ValidationError::new("output.filename", "must not be empty");
        assert_eq!(err.to_string(), "validation error at `output.filename`: must not be empty");
    }
}
