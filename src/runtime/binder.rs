//! Binding of step outputs to declared bundle outputs.

use super::store::OutputStore;
use crate::error::Result;
use crate::manifest::{OutputDefinition, ProducedOutputs};
use tracing::debug;

/// Persist every produced value that matches an in-scope bundle output.
///
/// Values with no matching definition are step-internal and are dropped.
/// Matches whose `applyTo` excludes `action` are skipped.
pub fn bind_outputs(
    store: &OutputStore,
    definitions: &[OutputDefinition],
    action: &str,
    outputs: &ProducedOutputs,
) -> Result<()> {
    for (name, value) in outputs {
        let Some(definition) = definitions.iter().find(|d| &d.name == name) else {
            continue;
        };

        if !definition.applies_to(action) {
            debug!(output = %name, action, "output not in scope, skipping");
            continue;
        }

        store.ensure()?;
        store.write(&definition.name, value)?;
        debug!(output = %name, "bound bundle output");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scoped(name: &str, actions: &[&str]) -> OutputDefinition {
        OutputDefinition {
            apply_to: actions.iter().map(|a| a.to_string()).collect(),
            ..OutputDefinition::new(name)
        }
    }

    fn produced(pairs: &[(&str, &str)]) -> ProducedOutputs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn undeclared_outputs_are_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        let definitions = vec![OutputDefinition::new("dbHost")];

        bind_outputs(
            &store,
            &definitions,
            "install",
            &produced(&[("dbHost", "10.0.0.5"), ("scratch", "tmp")]),
        )
        .unwrap();

        assert!(store.contains("dbHost"));
        assert!(!store.contains("scratch"));
    }

    #[test]
    fn apply_to_limits_binding() {
        let temp_dir = TempDir::new().unwrap();
        let definitions = vec![scoped("dbPassword", &["install"])];
        let values = produced(&[("dbPassword", "hunter2")]);

        let install_store = OutputStore::new(temp_dir.path().join("install"));
        bind_outputs(&install_store, &definitions, "install", &values).unwrap();
        assert_eq!(
            fs::read_to_string(install_store.path_for("dbPassword")).unwrap(),
            "hunter2"
        );

        let upgrade_store = OutputStore::new(temp_dir.path().join("upgrade"));
        bind_outputs(&upgrade_store, &definitions, "upgrade", &values).unwrap();
        assert!(!upgrade_store.contains("dbPassword"));
        assert!(!upgrade_store.dir().exists());
    }

    #[test]
    fn write_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the store directory should be.
        let blocked = temp_dir.path().join("outputs");
        fs::write(&blocked, "").unwrap();
        let store = OutputStore::new(&blocked);

        let err = bind_outputs(
            &store,
            &[OutputDefinition::new("dbHost")],
            "install",
            &produced(&[("dbHost", "10.0.0.5")]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("outputs"));
    }

    #[test]
    fn binary_values_are_written_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        let blob = vec![0x1f, 0x8b, 0xff, 0xfe];
        let outputs = ProducedOutputs::from([("cert".to_string(), blob.clone())]);

        bind_outputs(&store, &[OutputDefinition::new("cert")], "install", &outputs).unwrap();

        assert_eq!(fs::read(store.path_for("cert")).unwrap(), blob);
    }
}
