//! Exit code constants for the cnab-run CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable config, no action given)
//! - 2: Bundle setup failure (manifest validation, preparation, image metadata)
//! - 3: Step failure (resolution, mixin execution, output read/bind)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration.
pub const USER_ERROR: i32 = 1;

/// The bundle could not be set up for execution; no step was run.
pub const SETUP_FAILURE: i32 = 2;

/// A step failed; subsequent steps were not run.
pub const STEP_FAILURE: i32 = 3;
