//! Resolution engine interface and the bundled reference engine.
//!
//! Ownership model:
//! - `ResolutionEngine` is the collaborator boundary. The pipeline hands it the
//!   full `RecordStore` and gets back a partition plus a canonicalization rule.
//! - The engine owns its model and artifacts; nothing derived from a partition
//!   is persisted by the pipeline.

use crate::data::{ClusterGroup, Record};
use crate::errors::DedupeError;
use crate::ingestion::RecordStore;
use crate::types::Confidence;

/// Reference engine backed by normalized string similarity.
pub mod similarity;

pub use similarity::{SimilarityEngine, SimilarityModel, TrainingPairs};

/// Entity-resolution engine consumed by the pipeline.
///
/// Implementations must return clusters that cover every key in the store
/// exactly once; the aggregator verifies this and fails the run otherwise.
pub trait ResolutionEngine {
    /// Group `records` into clusters believed to denote the same entity.
    ///
    /// Record pairs scoring below `threshold` must not be linked. The order of
    /// the returned clusters defines their cluster ids.
    fn partition(
        &self,
        records: &RecordStore,
        threshold: Confidence,
    ) -> Result<Vec<ClusterGroup>, DedupeError>;

    /// Reduce the records of one non-empty cluster to a representative.
    fn canonicalize(&self, records: &[&Record]) -> Record;
}
