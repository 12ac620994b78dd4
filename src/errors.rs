use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ClusterId, InternalKey};

/// Error type for ingestion, engine-consistency, artifact, and IO failures.
#[derive(Debug, Error)]
pub enum DedupeError {
    #[error(
        "malformed input at line {line}: expected at least 2 tab-separated fields, found {fields}: {content:?}"
    )]
    MalformedInput {
        line: usize,
        fields: usize,
        content: String,
    },
    #[error("input file '{}' does not exist", path.display())]
    MissingInputFile { path: PathBuf },
    #[error("engine partition is inconsistent: {0}")]
    EngineConsistency(#[from] ConsistencyViolation),
    #[error("engine artifact '{}' could not be used: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },
    #[error("no internal keys left after {assigned} identifiers starting at origin {origin}")]
    KeySpaceExhausted {
        origin: InternalKey,
        assigned: usize,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Ways an engine partition can break the exactly-once coverage contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyViolation {
    #[error("record key {key} is not covered by any cluster")]
    UncoveredKey { key: InternalKey },
    #[error("record key {key} appears in clusters {first_cluster} and {second_cluster}")]
    DuplicateMembership {
        key: InternalKey,
        first_cluster: ClusterId,
        second_cluster: ClusterId,
    },
    #[error("cluster {cluster} references unknown record key {key}")]
    UnknownKey { key: InternalKey, cluster: ClusterId },
    #[error("cluster {cluster} has {keys} member keys but {scores} confidence scores")]
    ScoreCountMismatch {
        cluster: ClusterId,
        keys: usize,
        scores: usize,
    },
}
