//! Filesystem utilities for cnab-run.
//!
//! Bundle outputs are written atomically so a reader of the output directory
//! never observes a half-written value, whether the value came from a step or
//! was copied from a path declared in the manifest.

pub mod atomic;
mod copy;

pub use atomic::atomic_write;
pub use copy::copy_file;
