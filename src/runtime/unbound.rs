//! Collection of declared outputs that no step produced.

use super::store::OutputStore;
use crate::console::Console;
use crate::error::OutputCollectionErrors;
use crate::manifest::OutputDefinition;
use std::path::Path;
use tracing::debug;

/// Copy every in-scope, file-backed output missing from the store.
///
/// Failures are collected and the pass continues with the next output.
pub fn resolve_unbound_outputs(
    store: &OutputStore,
    definitions: &[OutputDefinition],
    action: &str,
    console: &mut Console,
) -> OutputCollectionErrors {
    let mut errors = OutputCollectionErrors::new();

    if let Err(e) = store.ensure() {
        errors.push(e);
        return errors;
    }

    if !definitions.is_empty() {
        console.println("Collecting bundle outputs...");
    }

    for definition in definitions {
        if store.contains(&definition.name) {
            continue;
        }

        let Some(path) = definition.path.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };

        if !definition.applies_to(action) {
            continue;
        }

        match store.copy_from(&definition.name, Path::new(path)) {
            Ok(()) => debug!(output = %definition.name, "collected unbound output"),
            Err(e) => errors.push(e),
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::test_support::test_console;
    use std::fs;
    use tempfile::TempDir;

    fn file_output(name: &str, path: &Path) -> OutputDefinition {
        OutputDefinition {
            path: Some(path.to_string_lossy().to_string()),
            ..OutputDefinition::new(name)
        }
    }

    #[test]
    fn copies_file_backed_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("kubeconfig.yaml");
        fs::write(&source, "apiVersion: v1\n").unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        let (mut console, out, _err) = test_console();

        let errors = resolve_unbound_outputs(
            &store,
            &[file_output("kubeconfig", &source), OutputDefinition::new("dbHost")],
            "install",
            &mut console,
        );

        assert!(errors.is_empty());
        assert_eq!(
            fs::read_to_string(store.path_for("kubeconfig")).unwrap(),
            "apiVersion: v1\n"
        );
        assert!(!store.contains("dbHost"));
        assert_eq!(out.contents(), "Collecting bundle outputs...\n");
    }

    #[test]
    fn already_bound_outputs_are_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("report.txt");
        fs::write(&source, "from file").unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        store.ensure().unwrap();
        store.write("report", b"from step").unwrap();
        let (mut console, _out, _err) = test_console();

        let errors =
            resolve_unbound_outputs(&store, &[file_output("report", &source)], "install", &mut console);

        assert!(errors.is_empty());
        assert_eq!(fs::read_to_string(store.path_for("report")).unwrap(), "from step");
    }

    #[test]
    fn out_of_scope_outputs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        let definition = OutputDefinition {
            apply_to: vec!["install".to_string()],
            ..file_output("report", &temp_dir.path().join("missing"))
        };
        let (mut console, _out, _err) = test_console();

        let errors = resolve_unbound_outputs(&store, &[definition], "upgrade", &mut console);

        assert!(errors.is_empty());
        assert!(!store.contains("report"));
    }

    #[test]
    fn every_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present");
        fs::write(&present, "ok").unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        let (mut console, _out, _err) = test_console();

        let errors = resolve_unbound_outputs(
            &store,
            &[
                file_output("first", &temp_dir.path().join("missing-1")),
                file_output("present", &present),
                file_output("second", &temp_dir.path().join("missing-2")),
            ],
            "install",
            &mut console,
        );

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors.errors()[0],
            RuntimeError::UnboundOutputCopy { name, .. } if name == "first"
        ));
        assert!(matches!(
            &errors.errors()[1],
            RuntimeError::UnboundOutputCopy { name, .. } if name == "second"
        ));
        assert!(store.contains("present"));
    }

    #[test]
    fn no_definitions_prints_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = OutputStore::new(temp_dir.path().join("outputs"));
        let (mut console, out, _err) = test_console();

        let errors = resolve_unbound_outputs(&store, &[], "install", &mut console);

        assert!(errors.is_empty());
        assert!(out.contents().is_empty());
        assert!(store.dir().is_dir());
    }
}
