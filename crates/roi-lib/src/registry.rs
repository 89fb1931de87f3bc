//! Model artifact registry
//!
//! Loads the per-target ONNX models and feature schemas once at startup
//! and serves them read-only afterwards. A missing or corrupt artifact
//! leaves its target in fallback mode without affecting the other.

use crate::models::Target;
use crate::predictor::{FeatureSchema, RoiModel};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{error, info, warn};

const RENT_MODEL_FILE: &str = "rent_model.onnx";
const RENT_SCHEMA_FILE: &str = "rent_feature_columns.json";
const PRICE_MODEL_FILE: &str = "housing_model.onnx";
const PRICE_SCHEMA_FILE: &str = "housing_feature_columns.json";

/// Why a target's artifacts could not be loaded.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse feature schema {path}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load model {path}")]
    Model {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// A target's model and schema, loaded together.
#[derive(Debug)]
pub struct LoadedTarget {
    pub model: RoiModel,
    pub schema: FeatureSchema,
}

struct Slots {
    rent: Option<LoadedTarget>,
    price: Option<LoadedTarget>,
}

/// Registry of per-target model artifacts.
///
/// Immutable after `load()`; share it behind an `Arc`.
pub struct ModelRegistry {
    model_dir: PathBuf,
    slots: OnceLock<Slots>,
}

impl ModelRegistry {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            slots: OnceLock::new(),
        }
    }

    /// Load every target's artifacts. Idempotent; later calls are no-ops.
    /// Failures are logged and leave the affected target in fallback mode
    /// rather than surfacing an error.
    pub fn load(&self) {
        self.slots.get_or_init(|| Slots {
            rent: self.load_target(Target::Rent),
            price: self.load_target(Target::Price),
        });
    }

    fn load_target(&self, target: Target) -> Option<LoadedTarget> {
        match self.try_load_target(target) {
            Ok(loaded) => {
                info!(
                    target = target.name(),
                    features = loaded.schema.len(),
                    "Model loaded"
                );
                Some(loaded)
            }
            Err(ArtifactError::Missing(path)) => {
                warn!(
                    target = target.name(),
                    path = %path.display(),
                    "Model artifacts not found, predictions will use the fallback formula"
                );
                None
            }
            Err(e) => {
                error!(
                    target = target.name(),
                    error = %e,
                    "Failed to load model artifacts, predictions will use the fallback formula"
                );
                None
            }
        }
    }

    fn try_load_target(&self, target: Target) -> Result<LoadedTarget, ArtifactError> {
        let (model_file, schema_file) = match target {
            Target::Rent => (RENT_MODEL_FILE, RENT_SCHEMA_FILE),
            Target::Price => (PRICE_MODEL_FILE, PRICE_SCHEMA_FILE),
        };
        let schema_path = self.model_dir.join(schema_file);
        let model_path = self.model_dir.join(model_file);

        if !schema_path.exists() {
            return Err(ArtifactError::Missing(schema_path));
        }
        if !model_path.exists() {
            return Err(ArtifactError::Missing(model_path));
        }

        let schema_bytes = fs::read(&schema_path).map_err(|source| ArtifactError::Io {
            path: schema_path.clone(),
            source,
        })?;
        let column_names: Vec<String> =
            serde_json::from_slice(&schema_bytes).map_err(|source| ArtifactError::Schema {
                path: schema_path,
                source,
            })?;
        let schema = FeatureSchema::new(column_names);

        let model_bytes = fs::read(&model_path).map_err(|source| ArtifactError::Io {
            path: model_path.clone(),
            source,
        })?;
        let model =
            RoiModel::from_bytes(&model_bytes, schema.len()).map_err(|source| {
                ArtifactError::Model {
                    path: model_path,
                    source,
                }
            })?;

        Ok(LoadedTarget { model, schema })
    }

    /// The loaded artifacts for a target, if any. Returns `None` before
    /// `load()` has run or when the target is in fallback mode.
    pub fn get(&self, target: Target) -> Option<&LoadedTarget> {
        let slots = self.slots.get()?;
        match target {
            Target::Rent => slots.rent.as_ref(),
            Target::Price => slots.price.as_ref(),
        }
    }

    /// Whether a target has a usable model.
    pub fn is_loaded(&self, target: Target) -> bool {
        self.get(target).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_model_dir_leaves_both_targets_unloaded() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ModelRegistry::new(temp_dir.path());
        registry.load();

        assert!(!registry.is_loaded(Target::Rent));
        assert!(!registry.is_loaded(Target::Price));
        assert!(registry.get(Target::Rent).is_none());
        assert!(registry.get(Target::Price).is_none());
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let registry = ModelRegistry::new("/nonexistent/roi-models");
        registry.load();

        assert!(!registry.is_loaded(Target::Rent));
        assert!(!registry.is_loaded(Target::Price));
    }

    #[test]
    fn test_load_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ModelRegistry::new(temp_dir.path());

        registry.load();
        registry.load();
        registry.load();

        assert!(!registry.is_loaded(Target::Rent));
    }

    #[test]
    fn test_unloaded_registry_serves_none_before_load() {
        let registry = ModelRegistry::new("models");
        assert!(registry.get(Target::Rent).is_none());
        assert!(!registry.is_loaded(Target::Price));
    }

    #[test]
    fn test_corrupt_model_leaves_target_unloaded() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(RENT_SCHEMA_FILE),
            br#"["size_sq_ft", "bedrooms"]"#,
        )
        .unwrap();
        std::fs::write(temp_dir.path().join(RENT_MODEL_FILE), b"not an onnx graph").unwrap();

        let registry = ModelRegistry::new(temp_dir.path());
        registry.load();

        assert!(!registry.is_loaded(Target::Rent));
    }

    #[test]
    fn test_corrupt_schema_leaves_target_unloaded() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(PRICE_SCHEMA_FILE), b"{ not json ]").unwrap();
        std::fs::write(temp_dir.path().join(PRICE_MODEL_FILE), b"bytes").unwrap();

        let registry = ModelRegistry::new(temp_dir.path());
        registry.load();

        assert!(!registry.is_loaded(Target::Price));
    }

    #[test]
    fn test_one_target_failure_does_not_block_the_other() {
        // Rent artifacts corrupt, price artifacts absent entirely; both
        // load attempts run to completion without panicking
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(RENT_SCHEMA_FILE), b"corrupt").unwrap();
        std::fs::write(temp_dir.path().join(RENT_MODEL_FILE), b"corrupt").unwrap();

        let registry = ModelRegistry::new(temp_dir.path());
        registry.load();

        assert!(!registry.is_loaded(Target::Rent));
        assert!(!registry.is_loaded(Target::Price));
    }

    #[test]
    fn test_schema_without_model_reports_missing() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(RENT_SCHEMA_FILE), br#"["size_sq_ft"]"#).unwrap();

        let registry = ModelRegistry::new(temp_dir.path());
        let err = registry.try_load_target(Target::Rent).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_valid_artifacts_load_and_serve() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(RENT_SCHEMA_FILE), br#"["size_sq_ft"]"#).unwrap();
        std::fs::write(
            temp_dir.path().join(RENT_MODEL_FILE),
            crate::predictor::identity_onnx_bytes(),
        )
        .unwrap();

        let registry = ModelRegistry::new(temp_dir.path());
        registry.load();

        assert!(registry.is_loaded(Target::Rent));
        assert!(!registry.is_loaded(Target::Price));
        let loaded = registry.get(Target::Rent).unwrap();
        assert_eq!(loaded.schema.len(), 1);
        assert_eq!(loaded.model.run(&[640.0]).unwrap(), 640.0);
    }
}
