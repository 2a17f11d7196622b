//! Environment templates (`${NAME}` / `${NAME:-fallback}`)
//!
//! Descriptor strings that may embed environment variables are parsed into
//! an [`EnvTemplate`] and rendered against an [`EnvironmentContext`].
//! Rendering never fails: a reference to a missing variable without a
//! fallback turns the whole value into [`EnvValue::Undefined`].

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::EnvironmentContext;

/// Template syntax errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated variable reference starting at byte {0}")]
    Unterminated(usize),

    #[error("invalid variable name '{0}'")]
    InvalidName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var {
        name: String,
        fallback: Option<String>,
    },
}

/// A parsed environment template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvTemplate {
    segments: Vec<Segment>,
}

/// Result of substituting an environment template.
///
/// `Undefined` is the explicit sentinel for a missing variable and
/// serializes as JSON `null`, which no defined string can collide with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvValue {
    Defined(String),
    Undefined,
}

impl EnvValue {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            EnvValue::Defined(s) => Some(s),
            EnvValue::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, EnvValue::Undefined)
    }

    /// JavaScript expression for this value, as a define plugin embeds it
    pub fn to_js_expression(&self) -> String {
        match self {
            // A JSON string literal is a valid JS string literal
            EnvValue::Defined(s) => serde_json::Value::String(s.clone()).to_string(),
            EnvValue::Undefined => "undefined".to_string(),
        }
    }
}

impl Serialize for EnvValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EnvValue::Defined(s) => serializer.serialize_str(s),
            EnvValue::Undefined => serializer.serialize_none(),
        }
    }
}

/// Check a variable name against `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl EnvTemplate {
    /// Parse a template string.
    ///
    /// `$$` is a literal `$`; a `$` not followed by `{` or `$` is kept as is.
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = input;
        let mut offset = 0;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(stripped) = after.strip_prefix('$') {
                literal.push('$');
                offset += pos + 2;
                rest = stripped;
                continue;
            }

            let Some(body) = after.strip_prefix('{') else {
                literal.push('$');
                offset += pos + 1;
                rest = after;
                continue;
            };

            let close = body
                .find('}')
                .ok_or(TemplateError::Unterminated(offset + pos))?;
            let inner = &body[..close];
            let (name, fallback) = match inner.split_once(":-") {
                Some((name, fallback)) => (name, Some(fallback.to_string())),
                None => (inner, None),
            };

            if !is_valid_var_name(name) {
                return Err(TemplateError::InvalidName(name.to_string()));
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Var {
                name: name.to_string(),
                fallback,
            });

            let consumed = pos + 2 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Names of all referenced variables, in template order
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render against an environment context
    pub fn render(&self, env: &EnvironmentContext) -> EnvValue {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                // `:-` applies to unset and empty values alike
                Segment::Var { name, fallback } => match (env.get(name), fallback) {
                    (Some(value), Some(fallback)) if value.is_empty() => out.push_str(fallback),
                    (Some(value), _) => out.push_str(value),
                    (None, Some(fallback)) => out.push_str(fallback),
                    (None, None) => return EnvValue::Undefined,
                },
            }
        }
        EnvValue::Defined(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Mode;

    fn env() -> EnvironmentContext {
        EnvironmentContext::new(Mode::Development)
            .with_var("PUBLIC_URL", "/app/")
            .with_var("REACT_APP_AUTH_BASE_URL", "https://auth.example.com")
    }

    #[test]
    fn test_plain_literal() {
        let t = EnvTemplate::parse("/static/").unwrap();
        assert_eq!(t.variables().count(), 0);
        assert_eq!(t.render(&env()), EnvValue::Defined("/static/".to_string()));
    }

    #[test]
    fn test_substitutes_defined_variable() {
        let t = EnvTemplate::parse("${PUBLIC_URL}assets").unwrap();
        assert_eq!(t.render(&env()), EnvValue::Defined("/app/assets".to_string()));
    }

    #[test]
    fn test_fallback_used_when_missing() {
        let t = EnvTemplate::parse("${CDN_URL:-/}").unwrap();
        assert_eq!(t.render(&env()), EnvValue::Defined("/".to_string()));
    }

    #[test]
    fn test_fallback_used_when_empty() {
        let ctx = env().with_var("CDN_URL", "");
        let t = EnvTemplate::parse("${CDN_URL:-/}").unwrap();
        assert_eq!(t.render(&ctx), EnvValue::Defined("/".to_string()));
        let t = EnvTemplate::parse("${CDN_URL}").unwrap();
        assert_eq!(t.render(&ctx), EnvValue::Defined(String::new()));
    }

    #[test]
    fn test_empty_fallback() {
        let t = EnvTemplate::parse("x${CDN_URL:-}y").unwrap();
        assert_eq!(t.render(&env()), EnvValue::Defined("xy".to_string()));
    }

    #[test]
    fn test_missing_without_fallback_is_undefined() {
        let t = EnvTemplate::parse("prefix-${REACT_APP_APPLICATION_BASE_URL}").unwrap();
        assert_eq!(t.render(&env()), EnvValue::Undefined);
    }

    #[test]
    fn test_dollar_escapes() {
        let t = EnvTemplate::parse("$$HOME and $5").unwrap();
        assert_eq!(t.variables().count(), 0);
        assert_eq!(t.render(&env()), EnvValue::Defined("$HOME and $5".to_string()));
    }

    #[test]
    fn test_unterminated_reference() {
        let err = EnvTemplate::parse("abc${PUBLIC_URL").unwrap_err();
        assert_eq!(err, TemplateError::Unterminated(3));
    }

    #[test]
    fn test_invalid_name() {
        let err = EnvTemplate::parse("${1BAD}").unwrap_err();
        assert_eq!(err, TemplateError::InvalidName("1BAD".to_string()));
        assert!(EnvTemplate::parse("${}").is_err());
    }

    #[test]
    fn test_variables_listed_in_order() {
        let t = EnvTemplate::parse("${B}/${A:-x}/${B}").unwrap();
        let vars: Vec<&str> = t.variables().collect();
        assert_eq!(vars, vec!["B", "A", "B"]);
    }

    #[test]
    fn test_js_expression() {
        assert_eq!(
            EnvValue::Defined("https://a\"b".to_string()).to_js_expression(),
            "\"https://a\\\"b\""
        );
        assert_eq!(EnvValue::Undefined.to_js_expression(), "undefined");
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let json = serde_json::to_value(EnvValue::Undefined).unwrap();
        assert!(json.is_null());
        let json = serde_json::to_value(EnvValue::Defined("/".to_string())).unwrap();
        assert_eq!(json, "/");
    }
}
