//! Action execution engine.
//!
//! [`Runtime::execute`] runs one action end to end:
//!
//! 1. validate and prepare the manifest
//! 2. load bundle.json and the relocation map, then resolve images
//! 3. run each step in order, stopping at the first failure
//! 4. collect declared outputs that no step produced
//!
//! Output collection always runs once the step loop has started, and its
//! failures are only reported as warnings. The action result is the step
//! loop's result.

mod binder;
mod channel;
mod step;
mod store;
mod unbound;


pub use binder::bind_outputs;
pub use channel::OutputChannel;
pub use store::OutputStore;
pub use unbound::resolve_unbound_outputs;

use crate::bundle::load_image_mappings;
use crate::console::Console;
use crate::context::{RuntimeEnv, RuntimePaths};
use crate::error::{Result, RuntimeError};
use crate::manifest::BundleManifest;
use crate::mixin::MixinRunner;
use tracing::{debug, warn};

/// Drives the steps of one action through a [`MixinRunner`].
#[derive(Debug)]
pub struct Runtime<R> {
    paths: RuntimePaths,
    env: RuntimeEnv,
    mixins: R,
    console: Console,
    channel: OutputChannel,
    store: OutputStore,
}

impl<R: MixinRunner> Runtime<R> {
    pub fn new(paths: RuntimePaths, env: RuntimeEnv, mixins: R, console: Console) -> Self {
        Self {
            channel: OutputChannel::new(&paths.mixin_outputs_dir),
            store: OutputStore::new(&paths.bundle_outputs_dir),
            paths,
            env,
            mixins,
            console,
        }
    }

    /// Announce and execute the manifest's action.
    pub fn execute<M: BundleManifest>(&mut self, manifest: &mut M) -> Result<()> {
        self.announce(manifest.action());
        self.run_action(manifest)
    }

    /// Print the banner naming the action, bundle and installation.
    pub fn announce(&mut self, action: &str) {
        self.console.println(&format!(
            "executing {} action from {} (installation: {})",
            action, self.env.bundle_name, self.env.installation_name
        ));
    }

    /// Execute an action whose banner has already been printed.
    pub fn run_action<M: BundleManifest>(&mut self, manifest: &mut M) -> Result<()> {
        let action = manifest.action().to_string();

        manifest.validate().map_err(RuntimeError::Validation)?;
        manifest.prepare().map_err(RuntimeError::Preparation)?;

        let (metadata, relocation) = load_image_mappings(&self.paths)?;
        manifest
            .resolve_images(&metadata, &relocation)
            .map_err(RuntimeError::ImageResolution)?;

        self.channel.ensure()?;

        let result = self.execute_steps(manifest);

        let errors = resolve_unbound_outputs(
            &self.store,
            manifest.output_definitions(),
            &action,
            &mut self.console,
        );
        if let Err(errors) = errors.into_result() {
            warn!(failures = errors.len(), "bundle output collection failed");
            self.console.eprintln(&errors.to_string());
        }

        if result.is_ok() {
            self.console.println("execution completed successfully!");
        }
        result
    }

    fn execute_steps<M: BundleManifest>(&mut self, manifest: &mut M) -> Result<()> {
        // Steps are cloned up front since executing one mutates the manifest.
        let steps = manifest.steps().to_vec();
        for (index, step) in steps.iter().enumerate() {
            debug!(step = index + 1, total = steps.len(), mixin = step.mixin(), "executing step");
            self.execute_step(manifest, step)?;
        }
        Ok(())
    }
}
