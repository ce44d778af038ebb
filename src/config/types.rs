//! Configuration types and defaults for cnab-run.

use crate::console::DEFAULT_MASK;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default root of the bundle filesystem layout inside the invocation image.
pub const DEFAULT_CNAB_ROOT: &str = "/cnab";

/// Per-mixin invocation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixinSettings {
    /// Command used instead of `<mixins_dir>/<name>/<name>`.
    ///
    /// Parsed with shell-words; the action name and `--runtime` are appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Environment variables to set for the mixin process.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

// Default value functions for serde
pub(crate) fn default_cnab_root() -> String {
    DEFAULT_CNAB_ROOT.to_string()
}
pub(crate) fn default_mask() -> String {
    DEFAULT_MASK.to_string()
}
