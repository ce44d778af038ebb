//! Mixin invocation.
//!
//! A mixin executes one step at a time. The runtime sends it an
//! [`ActionEnvelope`] holding the current action and the single step, and
//! blocks until it finishes. Out-of-process mixins report outputs by writing
//! files into the mixin output directory; in-process runners may return them
//! directly from [`MixinRunner::run`].

mod envelope;
mod process;

pub use envelope::ActionEnvelope;
pub use process::ProcessMixinRunner;

use crate::console::Console;
use crate::manifest::ProducedOutputs;
use thiserror::Error;

/// What to ask a mixin to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOptions {
    /// Mixin command, the action name at runtime.
    pub command: String,

    /// Serialized envelope passed on stdin.
    pub input: String,

    /// Execution-phase call, as opposed to a build or lint call.
    pub runtime: bool,
}

#[derive(Error, Debug)]
pub enum MixinError {
    #[error("failed to serialize step input: {0}")]
    Input(String),

    #[error("invalid command for mixin '{mixin}': {message}")]
    Command { mixin: String, message: String },

    #[error("failed to execute '{program}': {message}\nFix: ensure the mixin is installed.")]
    Spawn { program: String, message: String },

    #[error("failed to communicate with mixin process: {0}")]
    Io(String),

    #[error("mixin exited with {}", describe_exit(.code))]
    Exit { code: Option<i32> },

    #[error("{0}")]
    Failed(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Executes steps on behalf of the runtime.
pub trait MixinRunner {
    /// Run `mixin` and block until it completes.
    ///
    /// Anything the mixin prints must go through `console` so sensitive
    /// values stay masked.
    fn run(
        &mut self,
        mixin: &str,
        options: &CommandOptions,
        console: &mut Console,
    ) -> Result<ProducedOutputs, MixinError>;
}
