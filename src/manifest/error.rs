//! Errors raised by the manifest.

use super::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to parse manifest: {0}")]
    Parse(String),

    #[error("action '{0}' is not defined in the manifest")]
    UnknownAction(String),

    #[error("invalid steps for action '{action}': {message}")]
    InvalidSteps { action: String, message: String },

    #[error("step {index} uses mixin '{mixin}' which is not declared in the manifest mixins list")]
    UndeclaredMixin { index: usize, mixin: String },

    #[error("output name '{0}' is not a plain file name")]
    InvalidOutputName(String),

    #[error("output '{0}' is declared more than once")]
    DuplicateOutput(String),

    #[error("{kind} '{name}' applies to unknown action '{action}'")]
    UnknownApplyTo {
        kind: &'static str,
        name: String,
        action: String,
    },

    #[error("required parameter '{name}' has no value\nFix: set {env} or declare a default.")]
    MissingParameter { name: String, env: String },

    #[error(
        "required credential '{name}' is not available\nFix: set {env} or provide the file at the credential path."
    )]
    MissingCredential { name: String, env: String },

    #[error("unable to read credential '{name}' from '{}': {message}", .path.display())]
    CredentialRead {
        name: String,
        path: PathBuf,
        message: String,
    },

    #[error("unable to write file parameter '{name}' to '{}': {message}", .path.display())]
    FileParameter {
        name: String,
        path: PathBuf,
        message: String,
    },

    #[error("image '{name}' has an invalid reference '{reference}'")]
    InvalidImage { name: String, reference: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}
