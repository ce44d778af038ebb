//! Bundle manifest: the runtime's view of what an action does.
//!
//! The execution engine only talks to the manifest through the
//! [`BundleManifest`] trait:
//!
//! - **validate / prepare**: check the action can run and materialize its
//!   inputs on disk
//! - **resolve_images**: apply bundle.json and the relocation map to the
//!   manifest's image references
//! - **resolve_step**: render one step's templates just before it runs
//! - **apply_step_outputs**: record what a step produced so later steps can
//!   reference it
//!
//! [`RuntimeManifest`] is the YAML-backed implementation used by the CLI.

mod error;
mod model;
mod runtime;
pub mod template;


pub use error::ManifestError;
pub use model::{
    CredentialDefinition, ImageDefinition, Manifest, MixinDeclaration, OutputDefinition,
    ParameterDefinition, ProducedOutputs, STANDARD_ACTIONS, Step, applies_to,
};
pub use runtime::RuntimeManifest;

use crate::bundle::{BundleMetadata, RelocationMap};

/// The manifest operations the execution engine depends on.
pub trait BundleManifest {
    /// Name of the action being executed.
    fn action(&self) -> &str;

    /// Steps of the current action, in declared order.
    fn steps(&self) -> &[Step];

    /// Declared bundle-level outputs.
    fn output_definitions(&self) -> &[OutputDefinition];

    /// Values that must be masked in operator-facing output right now.
    fn sensitive_values(&self) -> Vec<String>;

    fn validate(&self) -> Result<(), ManifestError>;

    fn prepare(&mut self) -> Result<(), ManifestError>;

    fn resolve_images(
        &mut self,
        metadata: &BundleMetadata,
        relocation: &RelocationMap,
    ) -> Result<(), ManifestError>;

    /// Return `step` with templates rendered against the current state.
    fn resolve_step(&self, step: &Step) -> Result<Step, ManifestError>;

    fn apply_step_outputs(&mut self, outputs: &ProducedOutputs) -> Result<(), ManifestError>;
}
