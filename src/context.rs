//! Runtime filesystem layout and process environment.
//!
//! The runtime reads and writes a fixed set of locations inside the
//! invocation image. They are all derived from one root (default `/cnab`) so
//! tests and local runs can relocate the whole layout:
//!
//! ```text
//! {root}/bundle.json                     bundle metadata
//! {root}/app/relocation-mapping.json     optional image relocation map
//! {root}/app/porter.yaml                 bundle manifest
//! {root}/app/porter/outputs/             mixin output channel
//! {root}/app/outputs/                    bundle output store
//! ```

use crate::config::Config;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding the installation name.
pub const ENV_INSTALLATION_NAME: &str = "CNAB_INSTALLATION_NAME";

/// Environment variable holding the bundle name.
pub const ENV_BUNDLE_NAME: &str = "CNAB_BUNDLE_NAME";

/// Environment variable holding the requested action.
pub const ENV_ACTION: &str = "CNAB_ACTION";

/// Environment variable pointing at the runtime config file.
pub const ENV_CONFIG: &str = "CNAB_RUN_CONFIG";

/// Resolved paths for one runtime invocation. All paths share `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// Root of the layout (default: `/cnab`).
    pub root: PathBuf,

    /// Bundle metadata (`{root}/bundle.json`).
    pub bundle_file: PathBuf,

    /// Optional relocation mapping (`{root}/app/relocation-mapping.json`).
    pub relocation_file: PathBuf,

    /// Default manifest location (`{root}/app/porter.yaml`).
    pub manifest_file: PathBuf,

    /// Directory a running mixin writes its outputs into.
    pub mixin_outputs_dir: PathBuf,

    /// Directory holding finalized bundle outputs.
    pub bundle_outputs_dir: PathBuf,
}

impl RuntimePaths {
    /// Build the layout under `root`.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let app = root.join("app");

        Self {
            bundle_file: root.join("bundle.json"),
            relocation_file: app.join("relocation-mapping.json"),
            manifest_file: app.join("porter.yaml"),
            mixin_outputs_dir: app.join("porter").join("outputs"),
            bundle_outputs_dir: app.join("outputs"),
            root,
        }
    }

    /// Build the layout from the configured root.
    pub fn from_config(config: &Config) -> Self {
        Self::rooted_at(&config.cnab_root)
    }

    /// Path of a finalized bundle output.
    pub fn bundle_output_path(&self, name: &str) -> PathBuf {
        self.bundle_outputs_dir.join(name)
    }
}

/// Values read from the process environment.
///
/// The installation and bundle names are used only for the banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeEnv {
    pub installation_name: String,
    pub bundle_name: String,
    pub action: Option<String>,
}

impl RuntimeEnv {
    /// Read the runtime environment of the current process.
    pub fn from_env() -> Self {
        Self {
            installation_name: env::var(ENV_INSTALLATION_NAME).unwrap_or_default(),
            bundle_name: env::var(ENV_BUNDLE_NAME).unwrap_or_default(),
            action: env::var(ENV_ACTION).ok().filter(|a| !a.trim().is_empty()),
        }
    }
}
