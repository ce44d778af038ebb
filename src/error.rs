//! Error types for the bundle runtime.
//!
//! Every stage of an action wraps the failure with the stage name and the
//! resource involved (mixin name, output name, file path) so the message
//! printed after the banner is enough to diagnose the run.

use crate::exit_codes;
use crate::manifest::ManifestError;
use crate::mixin::MixinError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Bad arguments or configuration.
    #[error("{0}")]
    UserError(String),

    /// The manifest could not be loaded or failed validation.
    #[error("manifest validation failed: {0}")]
    Validation(#[source] ManifestError),

    /// The runtime environment could not be prepared (e.g. file parameters).
    #[error("unable to prepare runtime environment: {0}")]
    Preparation(#[source] ManifestError),

    /// bundle.json or the relocation mapping could not be read or parsed.
    #[error("{0}")]
    ImageMetadata(String),

    /// Bundle images could not be resolved into the manifest.
    #[error("unable to resolve bundle images: {0}")]
    ImageResolution(#[source] ManifestError),

    /// Template substitution or parameter/credential injection failed for a step.
    #[error("unable to resolve step '{mixin}': {source}")]
    StepResolution {
        mixin: String,
        #[source]
        source: ManifestError,
    },

    /// The mixin could not be invoked or reported failure.
    #[error("mixin execution failed for step '{mixin}': {source}")]
    MixinExecution {
        mixin: String,
        #[source]
        source: MixinError,
    },

    /// The mixin output directory could not be listed, read or cleared.
    #[error("could not read step outputs: {0}")]
    OutputRead(String),

    /// Step outputs could not be recorded on the manifest.
    #[error("unable to apply outputs of step '{mixin}': {source}")]
    StepOutputs {
        mixin: String,
        #[source]
        source: ManifestError,
    },

    /// A produced output could not be written to the bundle output directory.
    #[error("unable to write output '{name}' to '{}': {message}", .path.display())]
    OutputBind {
        name: String,
        path: PathBuf,
        message: String,
    },

    /// An output directory could not be created.
    #[error("could not create outputs directory '{}': {message}", .path.display())]
    OutputDirectory { path: PathBuf, message: String },

    /// A declared output file could not be copied into the bundle output directory.
    #[error(
        "unable to copy output '{name}' from '{}' to '{}': {message}",
        .from.display(),
        .to.display()
    )]
    UnboundOutputCopy {
        name: String,
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    /// Every failure collected while resolving unbound outputs.
    #[error(transparent)]
    OutputCollection(#[from] OutputCollectionErrors),
}

impl RuntimeError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::UserError(_) => exit_codes::USER_ERROR,
            RuntimeError::Validation(_)
            | RuntimeError::Preparation(_)
            | RuntimeError::ImageMetadata(_)
            | RuntimeError::ImageResolution(_) => exit_codes::SETUP_FAILURE,
            RuntimeError::StepResolution { .. }
            | RuntimeError::MixinExecution { .. }
            | RuntimeError::OutputRead(_)
            | RuntimeError::StepOutputs { .. }
            | RuntimeError::OutputBind { .. }
            | RuntimeError::OutputDirectory { .. }
            | RuntimeError::UnboundOutputCopy { .. }
            | RuntimeError::OutputCollection(_) => exit_codes::STEP_FAILURE,
        }
    }
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Recoverable failures gathered over one pass, reported together.
///
/// Unlike step execution, which stops at the first error, a collection pass
/// keeps going and records every failure here.
#[derive(Debug, Default)]
pub struct OutputCollectionErrors {
    errors: Vec<RuntimeError>,
}

impl OutputCollectionErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: RuntimeError) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[RuntimeError] {
        &self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise the whole list as one error.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for OutputCollectionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            write!(f, "1 error occurred:")?;
        } else {
            write!(f, "{} errors occurred:", self.errors.len())?;
        }
        for err in &self.errors {
            write!(f, "\n\t* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for OutputCollectionErrors {}
