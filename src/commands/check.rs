//! Implementation of the `cnab-run check` command.

use super::resolve_invocation;
use crate::cli::CheckArgs;
use crate::error::{Result, RuntimeError};
use crate::manifest::{BundleManifest, RuntimeManifest};
use std::fmt::Write;

/// Load and validate the manifest for the action and print what would run.
pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let invocation = resolve_invocation(&args.common)?;

    let manifest = RuntimeManifest::load(&invocation.manifest_path, invocation.action)
        .map_err(RuntimeError::Validation)?;
    manifest.validate().map_err(RuntimeError::Validation)?;

    print!("{}", check_report(&manifest));
    Ok(())
}

/// Summary of the steps and the bundle outputs in scope for the action.
fn check_report<M: BundleManifest>(manifest: &M) -> String {
    let action = manifest.action();
    let steps = manifest.steps();
    let mut report = String::new();

    let _ = writeln!(
        report,
        "action '{}' is valid: {} step{}",
        action,
        steps.len(),
        if steps.len() == 1 { "" } else { "s" }
    );
    for (i, step) in steps.iter().enumerate() {
        match step.description() {
            Some(description) => {
                let _ = writeln!(report, "  {}. {}: {}", i + 1, step.mixin(), description);
            }
            None => {
                let _ = writeln!(report, "  {}. {}", i + 1, step.mixin());
            }
        }
    }

    let outputs: Vec<&str> = manifest
        .output_definitions()
        .iter()
        .filter(|o| o.applies_to(action))
        .map(|o| o.name.as_str())
        .collect();
    if !outputs.is_empty() {
        let _ = writeln!(report, "outputs: {}", outputs.join(", "));
    }

    report
}
