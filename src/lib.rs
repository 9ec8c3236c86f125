//! Experiment-run lifecycle and model promotion pipeline
//!
//! `promover` records each training trial ("run") of a tabular binary
//! classifier together with its configuration and cross-validated metrics,
//! keeps runs in append-only experiments, selects the best run by a chosen
//! metric, and promotes the winning run's fitted artifact into a versioned,
//! servable model slot.
//!
//! # Architecture
//!
//! - [`config::RunConfig`]: immutable configuration for one run
//! - [`executor::RunExecutor`]: fits, cross-validates, and persists a run
//! - [`store::ExperimentStore`]: append-only run history per experiment
//! - [`select::best`]: deterministic best-run selection
//! - [`promote::PromotionManager`]: model versions, slots, evaluation
//!
//! Training itself is behind the [`trainer::Trainer`] trait and artifact
//! persistence behind [`artifact::ArtifactStore`], so algorithm and storage
//! backends are swappable without touching the run/version logic.
//!
//! # Example
//!
//! ```
//! use promover::artifact::InMemoryArtifactStore;
//! use promover::config::{Algorithm, ModelSpec, RunConfig};
//! use promover::data::Dataset;
//! use promover::executor::RunExecutor;
//! use promover::select::{best, SelectionPolicy};
//! use promover::store::{ExperimentStore, InMemoryBackend};
//! use promover::trainer::StubTrainer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = Dataset::new()
//!     .with_categorical("job", vec!["admin", "tech", "admin", "tech"])?
//!     .with_numeric("age", vec![34.0, 41.0, 29.0, 52.0])?
//!     .with_categorical("subscribed", vec!["no", "yes", "no", "yes"])?;
//!
//! let config = RunConfig::new(ModelSpec::new(Algorithm::RandomForest))
//!     .with_categorical_column("job")
//!     .with_cv_folds(2)
//!     .with_metric("f1_macro");
//!
//! let trainer = StubTrainer::new().with_fold_scores("test_f1_macro", vec![0.8, 0.9]);
//! let mut artifacts = InMemoryArtifactStore::new();
//! let mut executor = RunExecutor::new(&trainer, &mut artifacts);
//!
//! let mut store = ExperimentStore::new(InMemoryBackend::new());
//! let exp = store.get_or_create("baseline")?;
//!
//! let run = executor.execute(&exp.experiment_id, &config, &data, "subscribed")?;
//! store.append(&exp.experiment_id, run)?;
//!
//! let runs = store.list_runs(&exp.experiment_id)?;
//! let winner = best(&runs, "mean_test_f1_macro", SelectionPolicy::MaximizeMetric)?;
//! assert_eq!(winner.experiment_id, exp.experiment_id);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod data;
pub mod encode;
pub mod executor;
pub mod metrics;
pub mod promote;
pub mod select;
pub mod store;
pub mod trainer;
