pub use crate::types::{ClusterId, Confidence, ExternalId, FunctionText, InternalKey};

/// One ingested input line after normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    /// Identifier exactly as it appeared in column 0.
    pub external_id: ExternalId,
    /// Normalized function text; `None` when nothing informative remained.
    pub function: Option<FunctionText>,
}

impl Record {
    /// Build a record from an identifier and its normalized function.
    pub fn new(external_id: impl Into<ExternalId>, function: Option<FunctionText>) -> Self {
        Self {
            external_id: external_id.into(),
            function,
        }
    }
}

/// One cluster of a partition as returned by a resolution engine.
///
/// `keys[i]` is scored by `scores[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterGroup {
    /// Member keys.
    pub keys: Vec<InternalKey>,
    /// Per-member confidence.
    pub scores: Vec<Confidence>,
}

impl ClusterGroup {
    /// Build a cluster from parallel key and score lists.
    pub fn new(keys: Vec<InternalKey>, scores: Vec<Confidence>) -> Self {
        Self { keys, scores }
    }

    /// Build a single-member cluster with full confidence.
    pub fn singleton(key: InternalKey) -> Self {
        Self {
            keys: vec![key],
            scores: vec![1.0],
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Per-record view of the cluster it was assigned to.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterMembership {
    /// Enumeration index of the cluster in the partition.
    pub cluster_id: ClusterId,
    /// Record chosen by the engine to stand for the whole cluster.
    pub canonical: Record,
    /// Engine confidence for this record's membership.
    pub confidence: Confidence,
}
