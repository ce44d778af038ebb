//! Command implementations for cnab-run.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the invocation setup both commands share.

mod check;
mod run;

use crate::cli::{CommonArgs, Command};
use crate::config::Config;
use crate::context::{ENV_CONFIG, RuntimeEnv, RuntimePaths};
use crate::error::{Result, RuntimeError};
use std::path::PathBuf;
use tracing::debug;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run::cmd_run(args),
        Command::Check(args) => check::cmd_check(args),
    }
}

/// Everything resolved from arguments, config and environment before a
/// command touches the manifest.
#[derive(Debug)]
pub(crate) struct Invocation {
    pub config: Config,
    pub paths: RuntimePaths,
    pub env: RuntimeEnv,
    pub action: String,
    pub manifest_path: PathBuf,
}

pub(crate) fn resolve_invocation(args: &CommonArgs) -> Result<Invocation> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(root) = &args.root {
        config.cnab_root = root.clone();
        config.validate()?;
    }

    let paths = RuntimePaths::from_config(&config);
    let env = RuntimeEnv::from_env();

    let action = args
        .action
        .clone()
        .filter(|a| !a.trim().is_empty())
        .or_else(|| env.action.clone())
        .ok_or_else(|| {
            RuntimeError::UserError(
                "no action specified\nFix: pass --action <name> or set CNAB_ACTION.".to_string(),
            )
        })?;

    let manifest_path = args
        .manifest
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.manifest_file.clone());

    debug!(
        action = %action,
        root = %paths.root.display(),
        manifest = %manifest_path.display(),
        "resolved invocation"
    );

    Ok(Invocation {
        config,
        paths,
        env,
        action,
        manifest_path,
    })
}

/// Load the config named on the command line or by `CNAB_RUN_CONFIG`.
///
/// With neither set the defaults are used.
fn load_config(explicit: Option<&str>) -> Result<Config> {
    let path = explicit
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_CONFIG).ok().filter(|p| !p.is_empty()));

    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ENV_ACTION;
    use serial_test::serial;
    use tempfile::TempDir;

    fn common(action: Option<&str>, root: Option<&str>) -> CommonArgs {
        CommonArgs {
            action: action.map(str::to_string),
            root: root.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn action_from_argument_wins_over_environment() {
        unsafe {
            std::env::set_var(ENV_ACTION, "upgrade");
            std::env::remove_var(ENV_CONFIG);
        }

        let invocation = resolve_invocation(&common(Some("install"), None)).unwrap();
        assert_eq!(invocation.action, "install");

        let invocation = resolve_invocation(&common(None, None)).unwrap();
        assert_eq!(invocation.action, "upgrade");

        unsafe {
            std::env::remove_var(ENV_ACTION);
        }
    }

    #[test]
    #[serial]
    fn missing_action_is_a_user_error() {
        unsafe {
            std::env::remove_var(ENV_ACTION);
            std::env::remove_var(ENV_CONFIG);
        }

        let err = resolve_invocation(&common(None, None)).unwrap_err();
        assert!(matches!(err, RuntimeError::UserError(_)));
        assert!(err.to_string().contains("CNAB_ACTION"));
    }

    #[test]
    #[serial]
    fn root_override_moves_the_layout() {
        unsafe {
            std::env::remove_var(ENV_CONFIG);
        }

        let invocation = resolve_invocation(&common(Some("install"), Some("/tmp/run"))).unwrap();
        assert_eq!(invocation.paths.root, PathBuf::from("/tmp/run"));
        assert_eq!(
            invocation.manifest_path,
            PathBuf::from("/tmp/run/app/porter.yaml")
        );
        assert_eq!(
            invocation.config.resolved_mixins_dir(),
            PathBuf::from("/tmp/run/app/mixins")
        );
    }

    #[test]
    #[serial]
    fn config_is_read_from_environment() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cnab-run.yaml");
        std::fs::write(&config_path, "cnab_root: /srv/cnab\nmask: \"[hidden]\"\n").unwrap();
        unsafe {
            std::env::set_var(ENV_CONFIG, &config_path);
        }

        let invocation = resolve_invocation(&common(Some("install"), None)).unwrap();
        assert_eq!(invocation.paths.root, PathBuf::from("/srv/cnab"));
        assert_eq!(invocation.config.mask, "[hidden]");

        unsafe {
            std::env::remove_var(ENV_CONFIG);
        }
    }

    #[test]
    #[serial]
    fn explicit_missing_config_fails() {
        let args = CommonArgs {
            action: Some("install".to_string()),
            config: Some("/nonexistent/cnab-run.yaml".to_string()),
            ..Default::default()
        };

        let err = resolve_invocation(&args).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
