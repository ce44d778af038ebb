//! Bundle metadata and image relocation.
//!
//! At the start of an action the runtime reads the bundle definition
//! (`bundle.json`) and, when present, the relocation mapping written by the
//! CNAB runtime after the bundle was copied to another registry. Both are
//! handed to the manifest so image templates resolve to the references that
//! are actually pullable.

mod reference;

pub use reference::ImageReference;

use crate::context::RuntimePaths;
use crate::error::{Result, RuntimeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::debug;

/// Original image reference → relocated image reference.
pub type RelocationMap = BTreeMap<String, String>;

/// The subset of `bundle.json` the runtime consumes.
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Images used by the bundle, keyed by the alias the manifest refers to.
    #[serde(default)]
    pub images: BTreeMap<String, BundleImage>,

    #[serde(default)]
    pub invocation_images: Vec<BundleImage>,
}

/// An image entry in `bundle.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleImage {
    /// Full image reference, e.g. `docker.io/library/mysql:8`.
    pub image: String,

    #[serde(default)]
    pub image_type: Option<String>,

    /// Digest of the image content (`sha256:...`), when known.
    #[serde(default)]
    pub content_digest: Option<String>,
}

impl BundleMetadata {
    /// Parse bundle metadata from JSON.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Read `bundle.json` and the optional relocation mapping.
///
/// A missing relocation mapping is not an error: an empty map is returned.
/// Any other read or parse failure is.
pub fn load_image_mappings(paths: &RuntimePaths) -> Result<(BundleMetadata, RelocationMap)> {
    let metadata = load_bundle_metadata(&paths.bundle_file)?;
    let relocation = load_relocation_map(&paths.relocation_file)?;

    debug!(
        bundle = %metadata.name,
        images = metadata.images.len(),
        relocated = relocation.len(),
        "loaded image mappings"
    );
    Ok((metadata, relocation))
}

/// Read and parse `bundle.json`.
pub fn load_bundle_metadata(path: &Path) -> Result<BundleMetadata> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RuntimeError::ImageMetadata(format!(
            "couldn't read runtime bundle.json '{}': {}",
            path.display(),
            e
        ))
    })?;

    BundleMetadata::from_json(&content).map_err(|e| {
        RuntimeError::ImageMetadata(format!(
            "couldn't load runtime bundle.json '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Read and parse the relocation mapping, if present.
pub fn load_relocation_map(path: &Path) -> Result<RelocationMap> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RelocationMap::new()),
        Err(e) => {
            return Err(RuntimeError::ImageMetadata(format!(
                "couldn't read relocation file '{}': {}",
                path.display(),
                e
            )));
        }
    };

    serde_json::from_str(&content).map_err(|e| {
        RuntimeError::ImageMetadata(format!(
            "couldn't load relocation file '{}': {}",
            path.display(),
            e
        ))
    })
}
