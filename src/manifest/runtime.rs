//! YAML-backed manifest bound to one action and one process environment.

use super::error::ManifestError;
use super::model::{CredentialDefinition, Manifest, ParameterDefinition, ProducedOutputs, Step};
use super::template::render_value;
use super::{BundleManifest, OutputDefinition};
use crate::bundle::{BundleMetadata, ImageReference, RelocationMap};
use crate::context::ENV_INSTALLATION_NAME;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A manifest prepared for executing a single action.
#[derive(Debug, Clone)]
pub struct RuntimeManifest {
    manifest: Manifest,
    action: String,
    action_defined: bool,
    steps: Vec<Step>,
    installation: String,
    environment: HashMap<String, String>,
    outputs: ProducedOutputs,
    images: BTreeMap<String, ImageReference>,
}

impl RuntimeManifest {
    /// Bind `manifest` to `action`, reading parameters and credentials from
    /// `environment`.
    pub fn new(
        manifest: Manifest,
        action: impl Into<String>,
        environment: HashMap<String, String>,
    ) -> Result<Self, ManifestError> {
        let action = action.into();
        let steps = manifest
            .steps_for(&action)
            .map_err(|e| ManifestError::InvalidSteps {
                action: action.clone(),
                message: e.to_string(),
            })?;

        let images = manifest
            .images
            .iter()
            .map(|(alias, image)| {
                (
                    alias.clone(),
                    ImageReference {
                        repository: image.repository.clone(),
                        tag: image.tag.clone(),
                        digest: image.digest.clone(),
                    },
                )
            })
            .collect();

        Ok(Self {
            action_defined: steps.is_some(),
            steps: steps.unwrap_or_default(),
            installation: environment
                .get(ENV_INSTALLATION_NAME)
                .cloned()
                .unwrap_or_default(),
            manifest,
            action,
            environment,
            outputs: ProducedOutputs::new(),
            images,
        })
    }

    /// Parse a manifest from YAML.
    pub fn from_yaml(
        yaml: &str,
        action: impl Into<String>,
        environment: HashMap<String, String>,
    ) -> Result<Self, ManifestError> {
        let manifest: Manifest =
            serde_yaml::from_str(yaml).map_err(|e| ManifestError::Parse(e.to_string()))?;
        Self::new(manifest, action, environment)
    }

    /// Load a manifest file, reading inputs from the process environment.
    pub fn load<P: AsRef<Path>>(path: P, action: impl Into<String>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_yaml(&content, action, std::env::vars().collect())
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Outputs recorded from the steps run so far.
    pub fn produced_outputs(&self) -> &ProducedOutputs {
        &self.outputs
    }

    /// Current reference for an image alias.
    pub fn image(&self, alias: &str) -> Option<&ImageReference> {
        self.images.get(alias)
    }

    fn parameter_value(&self, param: &ParameterDefinition) -> Option<String> {
        self.environment
            .get(&param.env_var())
            .cloned()
            .or_else(|| param.default.as_ref().map(scalar_to_string))
    }

    fn credential_value(&self, cred: &CredentialDefinition) -> Result<Option<String>, ManifestError> {
        if let Some(value) = self.environment.get(&cred.env_var()) {
            return Ok(Some(value.clone()));
        }

        let Some(path) = &cred.path else {
            return Ok(None);
        };
        match std::fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ManifestError::CredentialRead {
                name: cred.name.clone(),
                path: PathBuf::from(path),
                message: e.to_string(),
            }),
        }
    }

    fn parameters_in_scope(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.manifest
            .parameters
            .iter()
            .filter(|p| p.applies_to(&self.action))
    }

    fn credentials_in_scope(&self) -> impl Iterator<Item = &CredentialDefinition> {
        self.manifest
            .credentials
            .iter()
            .filter(|c| c.applies_to(&self.action))
    }

    /// Variables available to `{{ bundle.* }}` templates.
    fn template_variables(&self) -> Result<HashMap<String, String>, ManifestError> {
        let mut vars = HashMap::new();
        vars.insert("bundle.name".to_string(), self.manifest.name.clone());
        vars.insert("bundle.version".to_string(), self.manifest.version.clone());
        vars.insert("bundle.action".to_string(), self.action.clone());
        vars.insert("bundle.installation".to_string(), self.installation.clone());

        for param in self.parameters_in_scope() {
            if let Some(value) = self.parameter_value(param) {
                vars.insert(format!("bundle.parameters.{}", param.name), value);
            }
        }

        for cred in self.credentials_in_scope() {
            if let Some(value) = self.credential_value(cred)? {
                vars.insert(format!("bundle.credentials.{}", cred.name), value);
            }
        }

        for (name, value) in &self.outputs {
            vars.insert(
                format!("bundle.outputs.{}", name),
                String::from_utf8_lossy(value).into_owned(),
            );
        }

        for (alias, image) in &self.images {
            let prefix = format!("bundle.images.{}", alias);
            vars.insert(format!("{}.repository", prefix), image.repository.clone());
            vars.insert(
                format!("{}.tag", prefix),
                image.tag.clone().unwrap_or_default(),
            );
            vars.insert(
                format!("{}.digest", prefix),
                image.digest.clone().unwrap_or_default(),
            );
            vars.insert(format!("{}.image", prefix), image.to_string());
        }

        Ok(vars)
    }
}

impl BundleManifest for RuntimeManifest {
    fn action(&self) -> &str {
        &self.action
    }

    fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn output_definitions(&self) -> &[OutputDefinition] {
        &self.manifest.outputs
    }

    fn sensitive_values(&self) -> Vec<String> {
        let mut values = Vec::new();

        for param in self.parameters_in_scope().filter(|p| p.sensitive) {
            if let Some(value) = self.parameter_value(param) {
                values.push(value);
            }
        }

        for cred in self.credentials_in_scope() {
            if let Ok(Some(value)) = self.credential_value(cred) {
                values.push(value);
            }
        }

        for output in self.manifest.outputs.iter().filter(|o| o.sensitive) {
            if let Some(value) = self.outputs.get(&output.name) {
                values.push(String::from_utf8_lossy(value).into_owned());
            }
        }

        values
    }

    /// Validation rules:
    /// - the action is defined
    /// - every step names a declared mixin
    /// - output names are unique plain file names
    /// - every `applyTo` entry names a known action
    /// - required parameters and credentials in scope have a value
    fn validate(&self) -> Result<(), ManifestError> {
        if !self.action_defined {
            return Err(ManifestError::UnknownAction(self.action.clone()));
        }

        let mixins = self.manifest.mixin_names();
        for (i, step) in self.steps.iter().enumerate() {
            if !mixins.contains(step.mixin()) {
                return Err(ManifestError::UndeclaredMixin {
                    index: i + 1,
                    mixin: step.mixin().to_string(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for output in &self.manifest.outputs {
            if !is_plain_file_name(&output.name) {
                return Err(ManifestError::InvalidOutputName(output.name.clone()));
            }
            if !seen.insert(output.name.as_str()) {
                return Err(ManifestError::DuplicateOutput(output.name.clone()));
            }
        }

        let known = self.manifest.known_actions();
        let scoped = self
            .manifest
            .outputs
            .iter()
            .map(|o| ("output", &o.name, &o.apply_to))
            .chain(
                self.manifest
                    .parameters
                    .iter()
                    .map(|p| ("parameter", &p.name, &p.apply_to)),
            )
            .chain(
                self.manifest
                    .credentials
                    .iter()
                    .map(|c| ("credential", &c.name, &c.apply_to)),
            );
        for (kind, name, apply_to) in scoped {
            if let Some(action) = apply_to.iter().find(|a| !known.contains(*a)) {
                return Err(ManifestError::UnknownApplyTo {
                    kind,
                    name: name.clone(),
                    action: action.clone(),
                });
            }
        }

        for param in self.parameters_in_scope().filter(|p| p.required) {
            if self.parameter_value(param).is_none() {
                return Err(ManifestError::MissingParameter {
                    name: param.name.clone(),
                    env: param.env_var(),
                });
            }
        }

        for cred in self.credentials_in_scope().filter(|c| c.required) {
            if self.credential_value(cred)?.is_none() {
                return Err(ManifestError::MissingCredential {
                    name: cred.name.clone(),
                    env: cred.env_var(),
                });
            }
        }

        Ok(())
    }

    /// Write in-scope `file` parameters supplied through the environment to
    /// their declared path.
    fn prepare(&mut self) -> Result<(), ManifestError> {
        for param in self.parameters_in_scope().filter(|p| p.is_file()) {
            let (Some(path), Some(value)) = (&param.path, self.environment.get(&param.env_var()))
            else {
                continue;
            };

            let path = PathBuf::from(path);
            let write = || -> io::Result<()> {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, value)
            };
            write().map_err(|e| ManifestError::FileParameter {
                name: param.name.clone(),
                path: path.clone(),
                message: e.to_string(),
            })?;

            debug!(parameter = %param.name, path = %path.display(), "materialized file parameter");
        }
        Ok(())
    }

    fn resolve_images(
        &mut self,
        metadata: &BundleMetadata,
        relocation: &RelocationMap,
    ) -> Result<(), ManifestError> {
        for (alias, bundle_image) in &metadata.images {
            if !self.manifest.images.contains_key(alias) {
                continue;
            }

            let original = &bundle_image.image;
            let reference = relocation.get(original).unwrap_or(original);
            let mut resolved =
                ImageReference::parse(reference).ok_or_else(|| ManifestError::InvalidImage {
                    name: alias.clone(),
                    reference: reference.clone(),
                })?;
            if resolved.digest.is_none() {
                resolved.digest = bundle_image.content_digest.clone();
            }

            debug!(image = %alias, relocated = relocation.contains_key(original), "resolved image");
            self.images.insert(alias.clone(), resolved);
        }
        Ok(())
    }

    fn resolve_step(&self, step: &Step) -> Result<Step, ManifestError> {
        let vars = self.template_variables()?;
        let body = render_value(step.body(), &vars)?;
        Ok(step.with_body(body))
    }

    fn apply_step_outputs(&mut self, outputs: &ProducedOutputs) -> Result<(), ManifestError> {
        for (name, value) in outputs {
            self.outputs.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

/// Output names become file names in the output directories, so they may not
/// contain path separators or name a directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Render a YAML default as the string a template would substitute.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
