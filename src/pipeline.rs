//! End-to-end run: ingest, resolve, aggregate, report.
//!
//! Stages run strictly in sequence. Nothing is written to the report sink
//! until ingestion, partitioning, and aggregation have all succeeded.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::aggregate::{Memberships, aggregate};
use crate::config::PipelineConfig;
use crate::engine::{ResolutionEngine, SimilarityEngine, SimilarityModel, TrainingPairs};
use crate::errors::DedupeError;
use crate::identity::IdentityMapper;
use crate::ingestion::{RecordStore, ingest_file};
use crate::report::write_report;
use crate::types::Confidence;

/// Records and their cluster memberships, ready to be reported.
#[derive(Debug)]
pub struct Resolution {
    /// Ingested records in input order.
    pub records: RecordStore,
    /// Cluster membership of every record.
    pub memberships: Memberships,
    /// Number of clusters returned by the engine.
    pub clusters: usize,
}

impl Resolution {
    /// Write the report for this resolution to `sink`.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<usize, DedupeError> {
        write_report(&self.records, &self.memberships, sink)
    }
}

/// Partition `records` with `engine` and aggregate the result.
pub fn resolve<E>(
    records: RecordStore,
    engine: &E,
    threshold: Confidence,
) -> Result<Resolution, DedupeError>
where
    E: ResolutionEngine + ?Sized,
{
    info!("[dedupe:pipeline] clustering...");
    let partition = engine.partition(&records, threshold)?;
    let memberships = aggregate(&partition, &records, |members| {
        engine.canonicalize(members)
    })?;
    Ok(Resolution {
        records,
        memberships,
        clusters: partition.len(),
    })
}

/// Load the persisted model when available, otherwise train one.
///
/// Training uses the persisted labeled pairs when present. With
/// `persist_artifacts` set, the labeled pairs and the trained settings are
/// written back to their configured paths.
pub fn load_or_train_engine(config: &PipelineConfig) -> Result<SimilarityEngine, DedupeError> {
    if let Some(settings) = config.settings_path.as_deref()
        && settings.exists()
    {
        info!("[dedupe:pipeline] reading from {}", settings.display());
        return Ok(SimilarityEngine::new(SimilarityModel::read_settings(
            settings,
        )?));
    }

    let pairs = match config.training_path.as_deref() {
        Some(training) if training.exists() => {
            info!(
                "[dedupe:pipeline] reading labeled examples from {}",
                training.display()
            );
            TrainingPairs::read(training)?
        }
        _ => TrainingPairs::default(),
    };
    let engine = SimilarityEngine::train(&pairs);

    if config.persist_artifacts {
        if let Some(training) = config.training_path.as_deref() {
            pairs.write(training)?;
        }
        if let Some(settings) = config.settings_path.as_deref() {
            engine.model().write_settings(settings)?;
        }
    }
    Ok(engine)
}

/// Ingest `input` and resolve it with the configured engine.
pub fn prepare(input: &Path, config: &PipelineConfig) -> Result<Resolution, DedupeError> {
    validate(config)?;
    let records = ingest_file(input, IdentityMapper::new(config.id_origin))?;
    let engine = load_or_train_engine(config)?;
    resolve(records, &engine, config.threshold)
}

/// Run the whole pipeline and write the report to `sink`.
pub fn run<W: Write>(
    input: &Path,
    config: &PipelineConfig,
    sink: &mut W,
) -> Result<Resolution, DedupeError> {
    let resolution = prepare(input, config)?;
    let lines = resolution.write_to(sink)?;
    info!(
        "[dedupe:pipeline] wrote {} lines for {} clusters",
        lines, resolution.clusters
    );
    Ok(resolution)
}

fn validate(config: &PipelineConfig) -> Result<(), DedupeError> {
    if !(0.0..=1.0).contains(&config.threshold) {
        return Err(DedupeError::Configuration(format!(
            "threshold must be within [0, 1], got {}",
            config.threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClusterGroup, Record};
    use crate::identity::IdentityMapper;
    use crate::ingestion::ingest;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    struct EverythingTogether;

    impl ResolutionEngine for EverythingTogether {
        fn partition(
            &self,
            records: &RecordStore,
            _threshold: Confidence,
        ) -> Result<Vec<ClusterGroup>, DedupeError> {
            let keys: Vec<_> = records.keys().collect();
            let scores = vec![0.5; keys.len()];
            Ok(vec![ClusterGroup::new(keys, scores)])
        }

        fn canonicalize(&self, records: &[&Record]) -> Record {
            records[records.len() - 1].clone()
        }
    }

    struct DropsLastRecord;

    impl ResolutionEngine for DropsLastRecord {
        fn partition(
            &self,
            records: &RecordStore,
            _threshold: Confidence,
        ) -> Result<Vec<ClusterGroup>, DedupeError> {
            let keys: Vec<_> = records.keys().collect();
            Ok(keys[..keys.len() - 1]
                .iter()
                .map(|&key| ClusterGroup::singleton(key))
                .collect())
        }

        fn canonicalize(&self, records: &[&Record]) -> Record {
            records[0].clone()
        }
    }

    fn records() -> RecordStore {
        ingest(
            Cursor::new("g1\tholin\ng2\tportal\ng3\tendolysin\n"),
            IdentityMapper::default(),
        )
        .unwrap()
    }

    #[test]
    fn resolve_uses_engine_canonicalization() {
        let resolution = resolve(records(), &EverythingTogether, 0.5).unwrap();
        let mut out = Vec::new();
        resolution.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "g1\tendolysin\ng2\tendolysin\ng3\tendolysin\n"
        );
        assert_eq!(resolution.clusters, 1);
    }

    #[test]
    fn resolve_rejects_partial_partition() {
        let err = resolve(records(), &DropsLastRecord, 0.5).unwrap_err();
        assert!(matches!(err, DedupeError::EngineConsistency(_)));
    }

    #[test]
    fn training_persists_artifacts_then_settings_are_reused() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("genes.tsv");
        fs::write(&input, "g1\tholin\n").unwrap();
        let config = PipelineConfig::for_input(&input);

        load_or_train_engine(&config).unwrap();
        let settings = config.settings_path.clone().unwrap();
        let training = config.training_path.clone().unwrap();
        assert!(settings.exists());
        assert!(training.exists());

        let custom = SimilarityModel {
            weight: 3.0,
            bias: 0.25,
            ..SimilarityModel::default()
        };
        custom.write_settings(&settings).unwrap();
        let engine = load_or_train_engine(&config).unwrap();
        assert_eq!(engine.model(), &custom);
    }

    #[test]
    fn no_persist_leaves_directory_untouched() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("genes.tsv");
        fs::write(&input, "g1\tholin\n").unwrap();
        let config = PipelineConfig::for_input(&input).with_persist_artifacts(false);

        load_or_train_engine(&config).unwrap();
        assert!(!config.settings_path.unwrap().exists());
        assert!(!config.training_path.unwrap().exists());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("genes.tsv");
        fs::write(&input, "g1\tholin\n").unwrap();
        let config = PipelineConfig::for_input(&input).with_threshold(1.5);
        let err = prepare(&input, &config).unwrap_err();
        assert!(matches!(err, DedupeError::Configuration(_)));
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("genes.tsv");
        fs::write(&input, "g1\tholin\nREC001\n").unwrap();
        let config = PipelineConfig::for_input(&input).with_persist_artifacts(false);
        let mut out = Vec::new();
        let err = run(&input, &config, &mut out).unwrap_err();
        assert!(matches!(err, DedupeError::MalformedInput { line: 2, .. }));
        assert!(out.is_empty());
    }
}
