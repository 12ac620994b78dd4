use std::collections::HashMap;

use tracing::debug;

use crate::data::{ClusterGroup, ClusterMembership, Record};
use crate::errors::{ConsistencyViolation, DedupeError};
use crate::ingestion::RecordStore;
use crate::types::{ClusterId, InternalKey};

/// Cluster membership for every ingested record, keyed by internal key.
pub type Memberships = HashMap<InternalKey, ClusterMembership>;

/// Turn an engine partition into per-record cluster memberships.
///
/// Cluster ids are enumeration indices into `partition`. `canonicalize` is
/// called once per non-empty cluster with its member records in partition
/// order. Fails unless every key in `records` is covered exactly once and
/// every cluster key exists in `records`.
pub fn aggregate<F>(
    partition: &[ClusterGroup],
    records: &RecordStore,
    mut canonicalize: F,
) -> Result<Memberships, DedupeError>
where
    F: FnMut(&[&Record]) -> Record,
{
    let mut memberships: Memberships = HashMap::with_capacity(records.len());

    for (cluster_id, cluster) in partition.iter().enumerate() {
        if cluster.keys.len() != cluster.scores.len() {
            return Err(ConsistencyViolation::ScoreCountMismatch {
                cluster: cluster_id,
                keys: cluster.keys.len(),
                scores: cluster.scores.len(),
            }
            .into());
        }
        if cluster.is_empty() {
            debug!("[dedupe:aggregate] skipping empty cluster {}", cluster_id);
            continue;
        }

        let members = resolve_members(cluster_id, cluster, records)?;
        let canonical = canonicalize(members.as_slice());

        for (&key, &confidence) in cluster.keys.iter().zip(&cluster.scores) {
            if let Some(existing) = memberships.get(&key) {
                return Err(ConsistencyViolation::DuplicateMembership {
                    key,
                    first_cluster: existing.cluster_id,
                    second_cluster: cluster_id,
                }
                .into());
            }
            memberships.insert(
                key,
                ClusterMembership {
                    cluster_id,
                    canonical: canonical.clone(),
                    confidence,
                },
            );
        }
    }

    verify_coverage(records, &memberships)?;
    debug!(
        "[dedupe:aggregate] {} memberships across {} clusters",
        memberships.len(),
        partition.len()
    );
    Ok(memberships)
}

fn resolve_members<'a>(
    cluster_id: ClusterId,
    cluster: &ClusterGroup,
    records: &'a RecordStore,
) -> Result<Vec<&'a Record>, DedupeError> {
    cluster
        .keys
        .iter()
        .map(|&key| {
            records.get(key).ok_or_else(|| {
                DedupeError::from(ConsistencyViolation::UnknownKey {
                    key,
                    cluster: cluster_id,
                })
            })
        })
        .collect()
}

/// Check that every key in `records` has a membership.
pub fn verify_coverage(
    records: &RecordStore,
    memberships: &Memberships,
) -> Result<(), ConsistencyViolation> {
    match records.keys().find(|key| !memberships.contains_key(key)) {
        Some(key) => Err(ConsistencyViolation::UncoveredKey { key }),
        None => Ok(()),
    }
}
