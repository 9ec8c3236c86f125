//! Model promotion
//!
//! Promotion turns a completed run's artifact into an addressable
//! [`ModelVersion`] inside a named [`ModelSlot`]. A slot always points at
//! at most one active version; promoting never deletes a prior version,
//! it only mints a new one, so every promotion stays auditable. Evaluation
//! against a held-out dataset requires the version's core metadata (target
//! column and ordered class labels) to be attached first.
//!
//! Promotion is not safe to run concurrently against the same slot: the
//! manager takes `&mut self` for every mutation, so in-process callers are
//! serialized by the borrow checker; multi-process deployments must
//! serialize `promote` + `set_active` per slot themselves.


use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::artifact::{ArtifactRef, ArtifactStore};
use crate::data::{DataError, DatasetProvider};
use crate::executor::Run;
use crate::trainer::{Trainer, TrainingError};

/// Metadata problems during promotion and evaluation
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("core metadata not set on version {0}; attach it before evaluating")]
    NotSet(String),
}

/// Errors from promotion operations
#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("slot not found: {0}")]
    SlotNotFound(String),

    #[error("version not found: {0}")]
    VersionNotFound(String),

    #[error("version {version_id} belongs to slot {actual_slot_id}, not {slot_id}")]
    SlotMismatch {
        slot_id: String,
        actual_slot_id: String,
        version_id: String,
    },

    #[error("artifact for run {run_id} not found at {location}")]
    ArtifactNotFound { run_id: String, location: String },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("evaluation data error: {0}")]
    Data(#[from] DataError),

    #[error("evaluation scoring failed: {0}")]
    Scoring(#[from] TrainingError),
}

/// Result alias for promotion operations
pub type Result<T> = std::result::Result<T, PromotionError>;

/// What the slot's models predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    BinaryClassification,
    MulticlassClassification,
}

/// A named, stable destination that points at one active model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSlot {
    /// Stable identifier
    pub slot_id: String,
    /// Globally unique name
    pub name: String,
    /// Prediction type served from this slot
    pub prediction_type: PredictionType,
    /// Version id of the currently active version, if any
    pub active_version: Option<String>,
}

/// Metadata a version needs before it can be evaluated or served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreMetadata {
    /// Name of the target column in evaluation datasets
    pub target_column: String,
    /// Class labels in the classifier's internal order
    pub class_labels: Vec<String>,
}

/// Outcome of attaching core metadata to a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOutcome {
    /// No metadata was present; it is now set
    Set,
    /// Identical metadata was already present; no-op
    Unchanged,
    /// Different metadata was present and has been replaced. Prior
    /// evaluation results may no longer be meaningful.
    Overwritten,
}

/// Result of evaluating a version against a held-out dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Name of the evaluation dataset
    pub dataset: String,
    /// Metric name -> score
    pub metrics: BTreeMap<String, f64>,
    /// When the evaluation ran
    pub evaluated_at: DateTime<Utc>,
}

/// One promoted model version.
///
/// Versions are append-only: promotion creates them and `set_active` points
/// the slot at them, but nothing ever deletes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Derived from the source run id plus the promotion timestamp, so
    /// re-promoting the same run stays distinguishable across retries
    pub version_id: String,
    /// Owning slot
    pub slot_id: String,
    /// Run the artifact came from
    pub source_run_id: String,
    /// Handle to the promoted artifact
    pub artifact_location: ArtifactRef,
    /// Target column and class-label order; required before evaluation
    pub core_metadata: Option<CoreMetadata>,
    /// Most recent evaluation, if any
    pub evaluation: Option<EvaluationResult>,
    /// Promotion timestamp
    pub created_at: DateTime<Utc>,
}

/// Persisted layout of a model version, including the derived active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version_id: String,
    pub slot_id: String,
    pub source_run_id: String,
    pub artifact_location: ArtifactRef,
    pub core_metadata: Option<CoreMetadata>,
    pub is_active: bool,
}

/// Manages model slots and promoted versions.
#[derive(Debug, Default)]
pub struct PromotionManager {
    /// Slots by name
    slots: HashMap<String, ModelSlot>,
    /// Versions by version id
    versions: HashMap<String, ModelVersion>,
    next_slot_seq: u64,
}

impl PromotionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot with the given name, creating it if absent.
    /// Idempotent by name; the prediction type of an existing slot wins.
    pub fn get_or_create_slot(
        &mut self,
        name: &str,
        prediction_type: PredictionType,
    ) -> &ModelSlot {
        if !self.slots.contains_key(name) {
            self.next_slot_seq += 1;
            let slot = ModelSlot {
                slot_id: format!("slot-{}", self.next_slot_seq),
                name: name.to_string(),
                prediction_type,
                active_version: None,
            };
            info!(slot_id = %slot.slot_id, name, "slot created");
            self.slots.insert(name.to_string(), slot);
        }
        &self.slots[name]
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Result<&ModelSlot> {
        self.slots
            .get(name)
            .ok_or_else(|| PromotionError::SlotNotFound(name.to_string()))
    }

    /// Promote a run's artifact into a new version of the named slot.
    ///
    /// Verifies the artifact is actually readable before minting the
    /// version; a promotion that fails leaves the slot untouched, so the
    /// previously active version (if any) stays active.
    pub fn promote<A: ArtifactStore>(
        &mut self,
        slot_name: &str,
        run: &Run,
        artifacts: &A,
    ) -> Result<ModelVersion> {
        let slot_id = self.slot(slot_name)?.slot_id.clone();

        if !artifacts.contains(&run.artifact_ref) {
            return Err(PromotionError::ArtifactNotFound {
                run_id: run.run_id.clone(),
                location: run.artifact_ref.location().to_string(),
            });
        }

        let created_at = Utc::now();
        // Same-millisecond retries of the same run get a disambiguating suffix
        let base = format!("{}-{}", run.run_id, created_at.timestamp_millis());
        let mut version_id = base.clone();
        let mut retry = 1;
        while self.versions.contains_key(&version_id) {
            version_id = format!("{base}-{retry}");
            retry += 1;
        }
        let version = ModelVersion {
            version_id,
            slot_id,
            source_run_id: run.run_id.clone(),
            artifact_location: run.artifact_ref.clone(),
            core_metadata: None,
            evaluation: None,
            created_at,
        };

        info!(
            version_id = %version.version_id,
            slot = slot_name,
            source_run_id = %run.run_id,
            "run promoted"
        );
        self.versions
            .insert(version.version_id.clone(), version.clone());
        Ok(version)
    }

    /// Point the slot's active pointer at a version. The only operation
    /// that mutates `active_version`; the previous version is retained.
    pub fn set_active(&mut self, slot_name: &str, version_id: &str) -> Result<()> {
        let slot_id = self.slot(slot_name)?.slot_id.clone();
        let version = self
            .versions
            .get(version_id)
            .ok_or_else(|| PromotionError::VersionNotFound(version_id.to_string()))?;
        if version.slot_id != slot_id {
            return Err(PromotionError::SlotMismatch {
                slot_id,
                actual_slot_id: version.slot_id.clone(),
                version_id: version_id.to_string(),
            });
        }

        // Lookup above guarantees the slot exists
        if let Some(slot) = self.slots.get_mut(slot_name) {
            slot.active_version = Some(version_id.to_string());
        }
        info!(slot = slot_name, version_id, "active version set");
        Ok(())
    }

    /// Attach core metadata to a version.
    ///
    /// Re-attaching identical metadata is a no-op. Re-attaching different
    /// metadata overwrites and returns [`MetadataOutcome::Overwritten`];
    /// callers should treat that as unusual, since it can invalidate prior
    /// evaluation results.
    pub fn set_metadata(
        &mut self,
        version_id: &str,
        metadata: CoreMetadata,
    ) -> Result<MetadataOutcome> {
        let version = self
            .versions
            .get_mut(version_id)
            .ok_or_else(|| PromotionError::VersionNotFound(version_id.to_string()))?;

        let outcome = match &version.core_metadata {
            None => MetadataOutcome::Set,
            Some(existing) if *existing == metadata => return Ok(MetadataOutcome::Unchanged),
            Some(_) => {
                warn!(version_id, "core metadata overwritten with different values");
                MetadataOutcome::Overwritten
            }
        };
        version.core_metadata = Some(metadata);
        Ok(outcome)
    }

    /// Evaluate a version against a named held-out dataset.
    ///
    /// Requires core metadata. The dataset is expected to be disjoint from
    /// the training data; cross-validation estimates generalization, this
    /// is the direct check on the promoted artifact.
    pub fn evaluate<A, T, D>(
        &mut self,
        version_id: &str,
        dataset_name: &str,
        metric_names: &[String],
        artifacts: &A,
        trainer: &T,
        provider: &D,
    ) -> Result<EvaluationResult>
    where
        A: ArtifactStore,
        T: Trainer,
        D: DatasetProvider,
    {
        let version = self
            .versions
            .get(version_id)
            .ok_or_else(|| PromotionError::VersionNotFound(version_id.to_string()))?;
        let metadata = version
            .core_metadata
            .clone()
            .ok_or_else(|| MetadataError::NotSet(version_id.to_string()))?;

        let pipeline = artifacts
            .read(&version.artifact_location)
            .map_err(TrainingError::from)?;
        let dataset = provider.load(dataset_name)?;
        let target = dataset.categorical(&metadata.target_column)?.to_vec();
        let features = dataset.without_column(&metadata.target_column)?;

        let metrics = trainer.score(&pipeline, &features, &target, metric_names)?;
        let result = EvaluationResult {
            dataset: dataset_name.to_string(),
            metrics,
            evaluated_at: Utc::now(),
        };

        info!(version_id, dataset = dataset_name, "version evaluated");
        // Re-borrow mutably to record the result
        if let Some(version) = self.versions.get_mut(version_id) {
            version.evaluation = Some(result.clone());
        }
        Ok(result)
    }

    /// Look up a version by id.
    pub fn get_version(&self, version_id: &str) -> Result<&ModelVersion> {
        self.versions
            .get(version_id)
            .ok_or_else(|| PromotionError::VersionNotFound(version_id.to_string()))
    }

    /// All versions ever promoted into a slot, oldest first.
    pub fn list_versions(&self, slot_name: &str) -> Result<Vec<&ModelVersion>> {
        let slot_id = &self.slot(slot_name)?.slot_id;
        let mut versions: Vec<&ModelVersion> = self
            .versions
            .values()
            .filter(|v| &v.slot_id == slot_id)
            .collect();
        versions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.version_id.cmp(&b.version_id))
        });
        Ok(versions)
    }

    /// The active version of a slot, if one is set.
    pub fn active_version(&self, slot_name: &str) -> Result<Option<&ModelVersion>> {
        let slot = self.slot(slot_name)?;
        Ok(match &slot.active_version {
            Some(id) => self.versions.get(id),
            None => None,
        })
    }

    /// Export the persisted layout of a version, with the active flag
    /// derived from its slot.
    pub fn export_version(&self, version_id: &str) -> Result<VersionRecord> {
        let version = self.get_version(version_id)?;
        let is_active = self.slots.values().any(|s| {
            s.slot_id == version.slot_id && s.active_version.as_deref() == Some(version_id)
        });
        Ok(VersionRecord {
            version_id: version.version_id.clone(),
            slot_id: version.slot_id.clone(),
            source_run_id: version.source_run_id.clone(),
            artifact_location: version.artifact_location.clone(),
            core_metadata: version.core_metadata.clone(),
            is_active,
        })
    }
}
