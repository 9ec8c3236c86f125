//! End-to-end pipeline test: configure, execute, store, select, promote,
//! activate, evaluate.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use promover::artifact::{ArtifactStore, InMemoryArtifactStore};
use promover::config::{Algorithm, ModelSpec, RunConfig};
use promover::data::{Dataset, InMemoryProvider};
use promover::executor::{ExecuteError, RunExecutor};
use promover::promote::{CoreMetadata, PredictionType, PromotionManager};
use promover::select::{best, SelectionPolicy};
use promover::store::{ExperimentStore, InMemoryBackend, JsonFileBackend};
use promover::trainer::StubTrainer;

/// Bank-marketing style table: nine categorical feature columns, one
/// numeric column, binary target in {"no", "yes"}.
fn bank_dataset() -> Dataset {
    fn cat(a: &str, b: &str) -> Vec<String> {
        [a, b].iter().cycle().take(12).map(|s| s.to_string()).collect()
    }
    Dataset::new()
        .with_categorical("job", cat("admin", "technician"))
        .unwrap()
        .with_categorical("marital", cat("married", "single"))
        .unwrap()
        .with_categorical("education", cat("primary", "tertiary"))
        .unwrap()
        .with_categorical("default", cat("no", "yes"))
        .unwrap()
        .with_categorical("housing", cat("yes", "no"))
        .unwrap()
        .with_categorical("loan", cat("no", "yes"))
        .unwrap()
        .with_categorical("contact", cat("cellular", "telephone"))
        .unwrap()
        .with_categorical("month", cat("may", "jul"))
        .unwrap()
        .with_categorical("poutcome", cat("failure", "success"))
        .unwrap()
        .with_numeric(
            "age",
            vec![34.0, 41.0, 29.0, 52.0, 47.0, 38.0, 58.0, 25.0, 33.0, 44.0, 36.0, 50.0],
        )
        .unwrap()
        .with_categorical("y", cat("no", "yes"))
        .unwrap()
}

fn bank_config(algorithm: Algorithm) -> RunConfig {
    RunConfig::new(ModelSpec::new(algorithm).with_hyperparameter("n_estimators", 100i64))
        .with_categorical_columns([
            "job",
            "marital",
            "education",
            "default",
            "housing",
            "loan",
            "contact",
            "month",
            "poutcome",
        ])
        .with_cv_folds(3)
        .with_metric("f1_macro")
        .with_metric("roc_auc")
}

#[test]
fn full_pipeline_from_config_to_evaluated_active_version() {
    let data = bank_dataset();

    // Two trials with different scores
    let weak_trainer = StubTrainer::new()
        .with_fold_scores("test_f1_macro", vec![0.70, 0.72, 0.68])
        .with_fold_scores("test_roc_auc", vec![0.80, 0.79, 0.81]);
    let strong_trainer = StubTrainer::new()
        .with_fold_scores("test_f1_macro", vec![0.84, 0.86, 0.85])
        .with_fold_scores("test_roc_auc", vec![0.90, 0.91, 0.89])
        .with_holdout_score("accuracy", 0.88)
        .with_holdout_score("f1_macro", 0.83);

    let mut artifacts = InMemoryArtifactStore::new();
    let mut store = ExperimentStore::new(InMemoryBackend::new());
    let exp = store.get_or_create("bank-subscription").unwrap();

    let weak_run = {
        let mut executor = RunExecutor::new(&weak_trainer, &mut artifacts);
        executor
            .execute(&exp.experiment_id, &bank_config(Algorithm::RandomForest), &data, "y")
            .unwrap()
    };
    let strong_run = {
        let mut executor = RunExecutor::new(&strong_trainer, &mut artifacts);
        executor
            .execute(
                &exp.experiment_id,
                &bank_config(Algorithm::GradientBoosting),
                &data,
                "y",
            )
            .unwrap()
    };

    // Run records carry the full metric set and the fitted label order
    assert_eq!(strong_run.metrics.len(), 4);
    assert!(strong_run.metrics.contains_key("mean_test_f1_macro"));
    assert!(strong_run.metrics.contains_key("std_test_f1_macro"));
    assert!(strong_run.metrics.contains_key("mean_test_roc_auc"));
    assert!(strong_run.metrics.contains_key("std_test_roc_auc"));
    assert_eq!(strong_run.class_labels().unwrap(), &["no", "yes"]);

    store.append(&exp.experiment_id, weak_run.clone()).unwrap();
    store.append(&exp.experiment_id, strong_run.clone()).unwrap();

    // Selection picks the stronger trial
    let runs = store.list_runs(&exp.experiment_id).unwrap();
    let winner = best(&runs, "mean_test_f1_macro", SelectionPolicy::MaximizeMetric).unwrap();
    assert_eq!(winner.run_id, strong_run.run_id);

    // Promote, activate, attach metadata, evaluate
    let mut manager = PromotionManager::new();
    manager.get_or_create_slot("subscription", PredictionType::BinaryClassification);
    let version = manager.promote("subscription", winner, &artifacts).unwrap();
    manager.set_active("subscription", &version.version_id).unwrap();

    let active = manager.active_version("subscription").unwrap().unwrap();
    assert_eq!(active.source_run_id, strong_run.run_id);

    manager
        .set_metadata(
            &version.version_id,
            CoreMetadata {
                target_column: "y".to_string(),
                class_labels: winner.class_labels().unwrap().to_vec(),
            },
        )
        .unwrap();

    let mut provider = InMemoryProvider::new();
    provider.insert("bank-holdout", bank_dataset());

    let evaluation = manager
        .evaluate(
            &version.version_id,
            "bank-holdout",
            &["accuracy".to_string(), "f1_macro".to_string()],
            &artifacts,
            &strong_trainer,
            &provider,
        )
        .unwrap();
    assert_eq!(evaluation.metrics.get("accuracy"), Some(&0.88));
    assert_eq!(evaluation.metrics.get("f1_macro"), Some(&0.83));

    // Promoting the weaker run afterwards keeps the first version intact
    let second = manager.promote("subscription", &weak_run, &artifacts).unwrap();
    assert!(manager.get_version(&version.version_id).is_ok());
    assert_ne!(second.version_id, version.version_id);
    // Active pointer unchanged until set_active
    assert_eq!(
        manager
            .active_version("subscription")
            .unwrap()
            .unwrap()
            .version_id,
        version.version_id
    );
}

/// Shared buffer the subscriber writes formatted events into.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn lifecycle_events_are_logged() {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let data = bank_dataset();
        let trainer = StubTrainer::new()
            .with_fold_scores("test_f1_macro", vec![0.8, 0.8, 0.8])
            .with_fold_scores("test_roc_auc", vec![0.9, 0.9, 0.9]);
        let mut artifacts = InMemoryArtifactStore::new();
        let mut executor = RunExecutor::new(&trainer, &mut artifacts);
        let run = executor
            .execute("exp-1", &bank_config(Algorithm::RandomForest), &data, "y")
            .unwrap();

        let mut manager = PromotionManager::new();
        manager.get_or_create_slot("subscription", PredictionType::BinaryClassification);
        let version = manager.promote("subscription", &run, &artifacts).unwrap();
        manager.set_active("subscription", &version.version_id).unwrap();
    });

    let logs = capture.contents();
    assert!(logs.contains("run completed"), "missing run event: {logs}");
    assert!(logs.contains("run promoted"), "missing promotion event: {logs}");
    assert!(logs.contains("active version set"), "missing activation event: {logs}");
}

#[test]
fn fold_count_beyond_minority_class_fails_whole_run() {
    // 12 rows, 6 per class: 7 folds cannot be stratified
    let data = bank_dataset();
    let trainer = StubTrainer::new();
    let mut artifacts = InMemoryArtifactStore::new();
    let mut executor = RunExecutor::new(&trainer, &mut artifacts);

    let config = bank_config(Algorithm::RandomForest).with_cv_folds(7);
    let err = executor.execute("exp-1", &config, &data, "y").unwrap_err();
    assert!(matches!(err, ExecuteError::Training(_)));
    // No partial run artifact was persisted
    assert!(artifacts.is_empty());
}

#[test]
fn history_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let data = bank_dataset();
    let trainer = StubTrainer::new()
        .with_fold_scores("test_f1_macro", vec![0.8, 0.8, 0.8])
        .with_fold_scores("test_roc_auc", vec![0.9, 0.9, 0.9]);

    let (experiment_id, run_id) = {
        let mut artifacts = InMemoryArtifactStore::new();
        let mut store = ExperimentStore::new(JsonFileBackend::new(dir.path()));
        let exp = store.get_or_create("bank-subscription").unwrap();
        let mut executor = RunExecutor::new(&trainer, &mut artifacts);
        let run = executor
            .execute(&exp.experiment_id, &bank_config(Algorithm::RandomForest), &data, "y")
            .unwrap();
        let run_id = run.run_id.clone();
        store.append(&exp.experiment_id, run).unwrap();
        (exp.experiment_id, run_id)
    };

    // New store over the same directory: same experiment, same history
    let mut store = ExperimentStore::new(JsonFileBackend::new(dir.path()));
    let exp = store.get_or_create("bank-subscription").unwrap();
    assert_eq!(exp.experiment_id, experiment_id);

    let runs = store.list_runs(&experiment_id).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, run_id);
    assert_eq!(runs[0].class_labels().unwrap(), &["no", "yes"]);
}
