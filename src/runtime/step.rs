//! Execution of a single step.

use super::{Runtime, bind_outputs};
use crate::error::{Result, RuntimeError};
use crate::manifest::{BundleManifest, Step};
use crate::mixin::{ActionEnvelope, CommandOptions, MixinError, MixinRunner};

impl<R: MixinRunner> Runtime<R> {
    /// Resolve, run and bind one step. Any failure stops the action.
    pub(super) fn execute_step<M: BundleManifest>(
        &mut self,
        manifest: &mut M,
        step: &Step,
    ) -> Result<()> {
        let resolved = manifest
            .resolve_step(step)
            .map_err(|source| RuntimeError::StepResolution {
                mixin: step.mixin().to_string(),
                source,
            })?;

        // Masking must be current before anything about this step is printed.
        self.console.set_sensitive_values(manifest.sensitive_values());

        if let Some(description) = resolved.description().filter(|d| !d.is_empty()) {
            self.console.println(description);
        }

        let mixin = resolved.mixin().to_string();
        let input = ActionEnvelope::new(manifest.action(), &resolved)
            .to_yaml()
            .map_err(|e| RuntimeError::MixinExecution {
                mixin: mixin.clone(),
                source: MixinError::Input(e.to_string()),
            })?;
        let options = CommandOptions {
            command: manifest.action().to_string(),
            input,
            runtime: true,
        };

        let mut outputs = self
            .mixins
            .run(&mixin, &options, &mut self.console)
            .map_err(|source| RuntimeError::MixinExecution {
                mixin: mixin.clone(),
                source,
            })?;

        // Values written to the channel win over values returned directly.
        outputs.extend(self.channel.drain()?);

        manifest
            .apply_step_outputs(&outputs)
            .map_err(|source| RuntimeError::StepOutputs {
                mixin: mixin.clone(),
                source,
            })?;

        bind_outputs(
            &self.store,
            manifest.output_definitions(),
            manifest.action(),
            &outputs,
        )
    }
}
