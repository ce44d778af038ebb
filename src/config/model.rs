//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Runtime configuration.
///
/// Every field is optional in the YAML; a missing file is the same as an
/// empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the bundle filesystem layout (default: "/cnab").
    ///
    /// bundle.json, the relocation mapping, the manifest and both output
    /// directories are resolved relative to this root.
    #[serde(default = "default_cnab_root")]
    pub cnab_root: String,

    /// Directory holding one sub-directory per installed mixin
    /// (default: "{cnab_root}/app/mixins").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins_dir: Option<String>,

    /// Replacement printed in place of sensitive values.
    #[serde(default = "default_mask")]
    pub mask: String,

    /// Per-mixin settings keyed by mixin name.
    #[serde(default)]
    pub mixins: BTreeMap<String, MixinSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cnab_root: default_cnab_root(),
            mixins_dir: None,
            mask: default_mask(),
            mixins: BTreeMap::new(),
        }
    }
}
