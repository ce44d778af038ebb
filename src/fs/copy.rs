//! Verbatim file copy into the bundle output directory.

use super::atomic_write;
use std::fs;
use std::io;
use std::path::Path;

/// Copy `source` to `destination` byte for byte.
///
/// The destination is written atomically and its parent must exist.
pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> io::Result<()> {
    let content = fs::read(source.as_ref())?;
    atomic_write(destination, &content)
}
