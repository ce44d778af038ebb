//! Manifest data model.
//!
//! The manifest is YAML. Standard actions (`install`, `upgrade`,
//! `uninstall`) are top-level step lists; any other top-level key holding a
//! step list is a custom action.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Output name → raw bytes produced by a step.
///
/// Values are kept byte for byte; they are only decoded (lossily) where they
/// meet text, in templates and masking.
pub type ProducedOutputs = BTreeMap<String, Vec<u8>>;

/// Actions every bundle may define.
pub const STANDARD_ACTIONS: &[&str] = &["install", "upgrade", "uninstall"];

/// `applyTo` scoping: an empty list means every action.
pub fn applies_to(apply_to: &[String], action: &str) -> bool {
    apply_to.is_empty() || apply_to.iter().any(|a| a == action)
}

/// A parsed bundle manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Mixins the bundle uses; every step must name one of these.
    #[serde(default)]
    pub mixins: Vec<MixinDeclaration>,

    /// Images referenced by steps, keyed by alias.
    #[serde(default)]
    pub images: BTreeMap<String, ImageDefinition>,

    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,

    #[serde(default)]
    pub credentials: Vec<CredentialDefinition>,

    #[serde(default)]
    pub outputs: Vec<OutputDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<Vec<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<Vec<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall: Option<Vec<Step>>,

    /// Metadata for custom actions (the steps themselves are top-level keys).
    #[serde(default)]
    pub custom_actions: BTreeMap<String, Value>,

    /// Custom action step lists and unknown fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Manifest {
    /// Steps declared for `action`, or `None` when the action is not defined.
    pub fn steps_for(&self, action: &str) -> Result<Option<Vec<Step>>, serde_yaml::Error> {
        let standard = match action {
            "install" => &self.install,
            "upgrade" => &self.upgrade,
            "uninstall" => &self.uninstall,
            _ => {
                return match self.extra.get(action) {
                    Some(value @ Value::Sequence(_)) => {
                        serde_yaml::from_value(value.clone()).map(Some)
                    }
                    _ => Ok(None),
                };
            }
        };
        Ok(standard.clone())
    }

    /// Every action name an `applyTo` list may refer to.
    pub fn known_actions(&self) -> BTreeSet<String> {
        let mut actions: BTreeSet<String> =
            STANDARD_ACTIONS.iter().map(|a| a.to_string()).collect();
        actions.extend(self.custom_actions.keys().cloned());
        for (key, value) in &self.extra {
            if matches!(value, Value::Sequence(_))
                && serde_yaml::from_value::<Vec<Step>>(value.clone()).is_ok()
            {
                actions.insert(key.clone());
            }
        }
        actions
    }

    /// Names of the declared mixins.
    pub fn mixin_names(&self) -> BTreeSet<&str> {
        self.mixins.iter().filter_map(MixinDeclaration::name).collect()
    }
}

/// A mixin entry: either a bare name or `{name: config}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MixinDeclaration {
    Name(String),
    Configured(BTreeMap<String, Value>),
}

impl MixinDeclaration {
    pub fn name(&self) -> Option<&str> {
        match self {
            MixinDeclaration::Name(name) => Some(name),
            MixinDeclaration::Configured(map) if map.len() == 1 => {
                map.keys().next().map(String::as_str)
            }
            MixinDeclaration::Configured(_) => None,
        }
    }
}

/// One unit of work: a mixin name and the body handed to that mixin.
///
/// In YAML a step is a single-key mapping:
///
/// ```yaml
/// - exec:
///     description: "Create the database"
///     command: ./create-db.sh
///     outputs:
///       - name: dbHost
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    mixin: String,
    body: Value,
}

impl Step {
    pub fn new(mixin: impl Into<String>, body: Value) -> Self {
        Self {
            mixin: mixin.into(),
            body,
        }
    }

    pub fn mixin(&self) -> &str {
        &self.mixin
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn description(&self) -> Option<&str> {
        self.body.get("description").and_then(Value::as_str)
    }

    /// Names of the outputs this step declares.
    pub fn output_names(&self) -> Vec<&str> {
        self.body
            .get("outputs")
            .and_then(Value::as_sequence)
            .map(|outputs| {
                outputs
                    .iter()
                    .filter_map(|o| o.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Same mixin, new body.
    pub fn with_body(&self, body: Value) -> Self {
        Self {
            mixin: self.mixin.clone(),
            body,
        }
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.mixin, &self.body)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_yaml::Mapping::deserialize(deserializer)?;
        if map.len() != 1 {
            return Err(de::Error::custom(format!(
                "a step must have exactly one mixin key, found {}",
                map.len()
            )));
        }

        let Some((key, body)) = map.into_iter().next() else {
            return Err(de::Error::custom("a step must have exactly one mixin key"));
        };
        let mixin = key
            .as_str()
            .ok_or_else(|| de::Error::custom("step mixin key must be a string"))?
            .to_string();

        if !matches!(body, Value::Mapping(_) | Value::Null) {
            return Err(de::Error::custom(format!(
                "step body for mixin '{}' must be a mapping",
                mixin
            )));
        }

        Ok(Self { mixin, body })
    }
}

/// An image the bundle references by alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDefinition {
    pub repository: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A bundle parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,

    /// Parameter type (`string`, `integer`, `boolean`, `file`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Environment variable holding the value (default: upper-cased name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    /// Where a `file` parameter is materialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub sensitive: bool,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apply_to: Vec<String>,
}

impl ParameterDefinition {
    pub fn env_var(&self) -> String {
        self.env.clone().unwrap_or_else(|| env_name(&self.name))
    }

    pub fn is_file(&self) -> bool {
        self.param_type.as_deref() == Some("file")
    }

    pub fn applies_to(&self, action: &str) -> bool {
        applies_to(&self.apply_to, action)
    }
}

/// A bundle credential. Credential values are always sensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    /// File the credential is mounted at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apply_to: Vec<String>,
}

fn default_required() -> bool {
    true
}

impl CredentialDefinition {
    pub fn env_var(&self) -> String {
        self.env.clone().unwrap_or_else(|| env_name(&self.name))
    }

    pub fn applies_to(&self, action: &str) -> bool {
        applies_to(&self.apply_to, action)
    }
}

/// A bundle-level output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// File to collect the output from when no step produces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apply_to: Vec<String>,
}

impl OutputDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn applies_to(&self, action: &str) -> bool {
        applies_to(&self.apply_to, action)
    }
}

/// `db-password` → `DB_PASSWORD`.
fn env_name(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}
