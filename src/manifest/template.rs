//! `{{ bundle.* }}` template rendering for step bodies.
//!
//! # Syntax
//!
//! - `{{ bundle.parameters.port }}` - substitutes the variable, surrounding
//!   whitespace inside the braces is ignored
//! - anything outside `{{ ... }}` is copied unchanged
//!
//! Undefined variables are an error rather than an empty substitution, so a
//! typo in a manifest fails the step before the mixin runs.

use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

static EXPRESSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("Invalid template expression regex"));

static VARIABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*(\.[A-Za-z0-9_\-]+)*$")
        .expect("Invalid template variable regex")
});

/// Error type for template rendering failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A variable was referenced but not provided.
    #[error("undefined variable '{name}' in template")]
    UndefinedVariable { name: String },

    /// The text between the braces is not a variable path.
    #[error("invalid template expression '{{{{{expression}}}}}'")]
    InvalidExpression { expression: String },
}

/// Render a template string by substituting variables.
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }

    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for captures in EXPRESSION_REGEX.captures_iter(template) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = inner.as_str().trim();

        if !VARIABLE_REGEX.is_match(name) {
            return Err(TemplateError::InvalidExpression {
                expression: inner.as_str().to_string(),
            });
        }

        let value = variables
            .get(name)
            .ok_or_else(|| TemplateError::UndefinedVariable {
                name: name.to_string(),
            })?;

        result.push_str(&template[last..whole.start()]);
        result.push_str(value);
        last = whole.end();
    }

    result.push_str(&template[last..]);
    Ok(result)
}

/// Render every string in a YAML value. Mapping keys are left untouched.
pub fn render_value(
    value: &Value,
    variables: &HashMap<String, String>,
) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) => Ok(Value::String(render_template(s, variables)?)),
        Value::Sequence(items) => items
            .iter()
            .map(|item| render_value(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut rendered = serde_yaml::Mapping::with_capacity(map.len());
            for (key, item) in map {
                rendered.insert(key.clone(), render_value(item, variables)?);
            }
            Ok(Value::Mapping(rendered))
        }
        Value::Tagged(tagged) => {
            let mut tagged = (**tagged).clone();
            tagged.value = render_value(&tagged.value, variables)?;
            Ok(Value::Tagged(Box::new(tagged)))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_substitution() {
        let vars = vars(&[("bundle.parameters.port", "3306")]);
        let result = render_template("--port={{ bundle.parameters.port }}", &vars).unwrap();
        assert_eq!(result, "--port=3306");
    }

    #[test]
    fn test_whitespace_inside_braces_is_optional() {
        let vars = vars(&[("bundle.name", "mysql")]);
        assert_eq!(render_template("{{bundle.name}}", &vars).unwrap(), "mysql");
        assert_eq!(
            render_template("{{   bundle.name   }}", &vars).unwrap(),
            "mysql"
        );
    }

    #[test]
    fn test_multiple_substitutions() {
        let vars = vars(&[
            ("bundle.images.db.repository", "registry.local/mysql"),
            ("bundle.images.db.tag", "8"),
        ]);
        let result = render_template(
            "{{ bundle.images.db.repository }}:{{ bundle.images.db.tag }}",
            &vars,
        )
        .unwrap();
        assert_eq!(result, "registry.local/mysql:8");
    }

    #[test]
    fn test_no_expressions() {
        let result = render_template("plain { text }", &HashMap::new()).unwrap();
        assert_eq!(result, "plain { text }");
    }

    #[test]
    fn test_undefined_variable() {
        let err = render_template("{{ bundle.parameters.missing }}", &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UndefinedVariable {
                name: "bundle.parameters.missing".to_string()
            }
        );
        assert!(err.to_string().contains("bundle.parameters.missing"));
    }

    #[test]
    fn test_invalid_expression() {
        let err = render_template("{{ not a variable }}", &HashMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidExpression { .. }));
        assert_eq!(err.to_string(), "invalid template expression '{{ not a variable }}'");
    }

    #[test]
    fn test_render_value_walks_nested_structures() {
        let vars = vars(&[
            ("bundle.parameters.port", "3306"),
            ("bundle.outputs.host", "10.0.0.5"),
        ]);
        let value: Value = serde_yaml::from_str(
            r#"
description: "Connect to {{ bundle.outputs.host }}"
arguments:
  - "--port"
  - "{{ bundle.parameters.port }}"
flags:
  verbose: true
  retries: 3
"#,
        )
        .unwrap();

        let rendered = render_value(&value, &vars).unwrap();

        assert_eq!(rendered["description"], "Connect to 10.0.0.5");
        assert_eq!(rendered["arguments"][1], "3306");
        assert_eq!(rendered["flags"]["verbose"], true);
        assert_eq!(rendered["flags"]["retries"], 3);
    }

    #[test]
    fn test_render_value_propagates_errors() {
        let value: Value = serde_yaml::from_str("args: ['{{ bundle.nope }}']").unwrap();
        assert!(render_value(&value, &HashMap::new()).is_err());
    }
}
