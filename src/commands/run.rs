//! Implementation of the `cnab-run run` command.

use super::{Invocation, resolve_invocation};
use crate::cli::RunArgs;
use crate::console::Console;
use crate::error::{Result, RuntimeError};
use crate::manifest::RuntimeManifest;
use crate::mixin::{MixinRunner, ProcessMixinRunner};
use crate::runtime::Runtime;

/// Execute the requested action with mixins run as child processes.
pub fn cmd_run(args: RunArgs) -> Result<()> {
    let invocation = resolve_invocation(&args.common)?;

    let mixins = ProcessMixinRunner::from_config(&invocation.config);
    let console = Console::stdio(&invocation.config.mask);
    run_invocation(invocation, mixins, console)
}

/// The banner is printed before the manifest is loaded so a manifest error
/// still follows it.
fn run_invocation<R: MixinRunner>(invocation: Invocation, mixins: R, console: Console) -> Result<()> {
    let mut runtime = Runtime::new(invocation.paths, invocation.env, mixins, console);
    runtime.announce(&invocation.action);

    let mut manifest = RuntimeManifest::load(&invocation.manifest_path, invocation.action)
        .map_err(RuntimeError::Validation)?;

    runtime.run_action(&mut manifest)
}
