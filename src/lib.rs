#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Cluster membership aggregation over engine partitions.
pub mod aggregate;
/// Command-line entry point and logging bootstrap.
pub mod cli;
/// Pipeline configuration types.
pub mod config;
/// Centralized constants used by normalization, the engine, and the pipeline.
pub mod constants;
/// Record and cluster types.
pub mod data;
/// Resolution engine interface and reference engine.
pub mod engine;
/// External identifier to internal key mapping.
pub mod identity;
/// Tab-separated input ingestion into the record store.
pub mod ingestion;
/// Function-text normalization.
pub mod normalize;
/// Linear orchestration of one deduplication run.
pub mod pipeline;
/// Report writer.
pub mod report;
/// Shared type aliases.
pub mod types;

mod errors;

pub use aggregate::{Memberships, aggregate};
pub use config::PipelineConfig;
pub use data::{ClusterGroup, ClusterMembership, Record};
pub use engine::{ResolutionEngine, SimilarityEngine, SimilarityModel, TrainingPairs};
pub use errors::{ConsistencyViolation, DedupeError};
pub use identity::IdentityMapper;
pub use ingestion::{RecordStore, ingest, ingest_file};
pub use normalize::normalize_function;
pub use pipeline::{Resolution, prepare, resolve, run};
pub use report::write_report;
pub use types::{ClusterId, Confidence, ExternalId, FunctionText, InternalKey};
