/// Model registry module
///
/// Maintains the ordered list of declared hotword models and the flattened
/// index -> label lookup table. Insertion order is the only ordering
/// guarantee and must match the order in which model files are handed to
/// the detection engine, since the engine assigns result indices from
/// that same order.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model {0} declares no hotwords")]
    NoHotwords(PathBuf),

    #[error("Hotword index {index} out of bounds (lookup table has {len} entries)")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Hotword labels attached to a single model file.
///
/// A model file may encode one trigger phrase or several; declarations
/// accept either a bare string or a list and are normalized to an ordered
/// list at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HotwordLabels {
    /// A single trigger phrase.
    Single(String),

    /// An ordered list of trigger phrases sharing one model file.
    List(Vec<String>),
}

impl HotwordLabels {
    /// Normalize to an ordered list of labels.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            HotwordLabels::Single(label) => vec![label],
            HotwordLabels::List(labels) => labels,
        }
    }

    /// Number of labels this declaration carries.
    pub fn len(&self) -> usize {
        match self {
            HotwordLabels::Single(_) => 1,
            HotwordLabels::List(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for HotwordLabels {
    fn from(label: &str) -> Self {
        HotwordLabels::Single(label.to_string())
    }
}

impl From<String> for HotwordLabels {
    fn from(label: String) -> Self {
        HotwordLabels::Single(label)
    }
}

impl From<Vec<String>> for HotwordLabels {
    fn from(labels: Vec<String>) -> Self {
        HotwordLabels::List(labels)
    }
}

impl From<Vec<&str>> for HotwordLabels {
    fn from(labels: Vec<&str>) -> Self {
        HotwordLabels::List(labels.into_iter().map(String::from).collect())
    }
}

/// A declared hotword model: a resource file on disk, an optional
/// engine-specific sensitivity string, and one or more trigger labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotwordModel {
    /// Path to the trained model file. Must exist at registration time.
    pub file: PathBuf,

    /// Engine-specific sensitivity tuning value, opaque to this layer.
    #[serde(default)]
    pub sensitivity: Option<String>,

    /// Label(s) the model triggers on.
    pub hotwords: HotwordLabels,
}

impl HotwordModel {
    pub fn new(file: impl Into<PathBuf>, hotwords: impl Into<HotwordLabels>) -> Self {
        Self {
            file: file.into(),
            sensitivity: None,
            hotwords: hotwords.into(),
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: impl Into<String>) -> Self {
        self.sensitivity = Some(sensitivity.into());
        self
    }
}

/// A model that passed validation, with labels already normalized.
#[derive(Debug, Clone)]
struct RegisteredModel {
    file: PathBuf,
    sensitivity: Option<String>,
    hotwords: Vec<String>,
}

/// Ordered registry of hotword models.
///
/// Index `i` in the flattened lookup table corresponds to detection code
/// `i + 1` returned by the engine; code 0 and negative codes are reserved
/// status values interpreted by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<RegisteredModel>,
    lookup_table: Vec<String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a model, then regenerate the lookup table.
    ///
    /// Fails without touching the registry if the model file does not
    /// exist or the declaration carries no labels; the lookup table,
    /// `model_string` and `sensitivity_string` only ever change together.
    pub fn add(&mut self, model: HotwordModel) -> Result<(), RegistryError> {
        let HotwordModel {
            file,
            sensitivity,
            hotwords,
        } = model;

        if !file.exists() {
            return Err(RegistryError::ModelNotFound(file));
        }

        let hotwords = hotwords.into_vec();
        if hotwords.is_empty() {
            return Err(RegistryError::NoHotwords(file));
        }

        debug!(
            "Registered model {} with {} hotword(s)",
            file.display(),
            hotwords.len()
        );

        self.models.push(RegisteredModel {
            file,
            sensitivity,
            hotwords,
        });
        self.rebuild_lookup();

        Ok(())
    }

    /// Comma-joined model file paths in insertion order; the configuration
    /// string handed to the detection engine at construction.
    pub fn model_string(&self) -> String {
        self.models
            .iter()
            .map(|m| m.file.to_string_lossy())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma-joined per-model sensitivities in insertion order. A model
    /// without a declared sensitivity contributes an empty entry.
    pub fn sensitivity_string(&self) -> String {
        self.models
            .iter()
            .map(|m| m.sensitivity.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Label at `index` in the flattened lookup table.
    pub fn lookup(&self, index: usize) -> Result<&str, RegistryError> {
        self.lookup_table
            .get(index)
            .map(String::as_str)
            .ok_or(RegistryError::IndexOutOfBounds {
                index,
                len: self.lookup_table.len(),
            })
    }

    /// Total number of hotword labels across all registered models.
    pub fn num_hotwords(&self) -> usize {
        self.lookup_table.len()
    }

    /// Number of registered model files.
    pub fn num_models(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn rebuild_lookup(&mut self) {
        self.lookup_table = self
            .models
            .iter()
            .flat_map(|m| m.hotwords.iter().cloned())
            .collect();
    }
}
