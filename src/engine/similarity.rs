use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::engine::{
    DEFAULT_BIAS, DEFAULT_WEIGHT, SETTINGS_VERSION, TRAINING_ITERATIONS, TRAINING_LEARNING_RATE,
};
use crate::data::{ClusterGroup, Record};
use crate::engine::ResolutionEngine;
use crate::errors::DedupeError;
use crate::ingestion::RecordStore;
use crate::types::{Confidence, FunctionText, InternalKey};

/// Normalized Levenshtein similarity between two function values.
///
/// An absent value never matches anything, including another absent value.
pub fn similarity(left: Option<&str>, right: Option<&str>) -> f64 {
    match (left, right) {
        (Some(left), Some(right)) => strsim::normalized_levenshtein(left, right),
        _ => 0.0,
    }
}

/// Logistic mapping from string similarity to match probability.
///
/// `p = 1 / (1 + exp(-weight * (similarity - bias)))`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityModel {
    /// Artifact format version.
    pub version: u8,
    /// Slope of the logistic curve.
    pub weight: f64,
    /// Similarity at which a pair is an even-odds match.
    pub bias: f64,
}

impl Default for SimilarityModel {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            weight: DEFAULT_WEIGHT,
            bias: DEFAULT_BIAS,
        }
    }
}

impl SimilarityModel {
    /// Probability that two values with the given similarity denote one entity.
    pub fn match_probability(&self, similarity: f64) -> Confidence {
        let z = self.weight * (similarity - self.bias);
        (1.0 / (1.0 + (-z).exp())).clamp(0.0, 1.0)
    }

    /// Match probability for a pair of function values.
    pub fn score(&self, left: Option<&str>, right: Option<&str>) -> Confidence {
        if left.is_none() || right.is_none() {
            return 0.0;
        }
        self.match_probability(similarity(left, right))
    }

    /// Fit the model to labeled pairs with deterministic gradient descent.
    ///
    /// Starts from the default model; without labeled pairs, or when the fit
    /// ends with a non-increasing curve, the default model is returned.
    pub fn train(pairs: &TrainingPairs) -> Self {
        let samples: Vec<(f64, f64)> = pairs
            .matches
            .iter()
            .map(|(left, right)| (similarity(left.as_deref(), right.as_deref()), 1.0))
            .chain(
                pairs
                    .distinct
                    .iter()
                    .map(|(left, right)| (similarity(left.as_deref(), right.as_deref()), 0.0)),
            )
            .collect();
        let defaults = Self::default();
        if samples.is_empty() {
            debug!("[dedupe:engine] no labeled pairs; using default model");
            return defaults;
        }

        // z = slope * x + intercept, with intercept = -weight * bias.
        let mut slope = defaults.weight;
        let mut intercept = -defaults.weight * defaults.bias;
        let n = samples.len() as f64;
        for _ in 0..TRAINING_ITERATIONS {
            let mut grad_slope = 0.0;
            let mut grad_intercept = 0.0;
            for &(x, y) in &samples {
                let p = 1.0 / (1.0 + (-(slope * x + intercept)).exp());
                grad_slope += (p - y) * x;
                grad_intercept += p - y;
            }
            slope -= TRAINING_LEARNING_RATE * grad_slope / n;
            intercept -= TRAINING_LEARNING_RATE * grad_intercept / n;
        }

        if !slope.is_finite() || !intercept.is_finite() || slope <= f64::EPSILON {
            warn!(
                "[dedupe:engine] labeled pairs produced an unusable fit (slope={}); using default model",
                slope
            );
            return defaults;
        }
        let model = Self {
            version: SETTINGS_VERSION,
            weight: slope,
            bias: -intercept / slope,
        };
        info!(
            "[dedupe:engine] trained on {} labeled pairs (weight={:.3}, bias={:.3})",
            samples.len(),
            model.weight,
            model.bias
        );
        model
    }

    /// Load a model previously written by [`SimilarityModel::write_settings`].
    pub fn read_settings(path: &Path) -> Result<Self, DedupeError> {
        let file = File::open(path)?;
        let model: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| artifact(path, err))?;
        if model.version != SETTINGS_VERSION {
            return Err(DedupeError::Artifact {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported settings version {} (expected {})",
                    model.version, SETTINGS_VERSION
                ),
            });
        }
        Ok(model)
    }

    /// Persist the model as JSON.
    pub fn write_settings(&self, path: &Path) -> Result<(), DedupeError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|err| artifact(path, err))?;
        writer.flush()?;
        Ok(())
    }
}

/// Labeled example pairs of normalized function values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingPairs {
    /// Pairs known to denote the same function.
    #[serde(rename = "match", default)]
    pub matches: Vec<(Option<FunctionText>, Option<FunctionText>)>,
    /// Pairs known to denote different functions.
    #[serde(default)]
    pub distinct: Vec<(Option<FunctionText>, Option<FunctionText>)>,
}

impl TrainingPairs {
    /// Total number of labeled pairs.
    pub fn len(&self) -> usize {
        self.matches.len() + self.distinct.len()
    }

    /// True when no pairs are labeled.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.distinct.is_empty()
    }

    /// Load labeled pairs from a JSON artifact.
    pub fn read(path: &Path) -> Result<Self, DedupeError> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|err| artifact(path, err))
    }

    /// Persist labeled pairs as JSON.
    pub fn write(&self, path: &Path) -> Result<(), DedupeError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|err| artifact(path, err))?;
        writer.flush()?;
        Ok(())
    }
}

fn artifact(path: &Path, err: serde_json::Error) -> DedupeError {
    DedupeError::Artifact {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Reference resolution engine.
///
/// Identical values always share a cluster. Distinct values are linked when
/// their match probability reaches the partition threshold, and clusters are
/// the connected components of those links. A member's confidence is its mean
/// match probability against the other members (1.0 for singletons).
///
/// Canonicalization picks the present value with the highest summed
/// similarity to every member's value. Ties go to the earliest member, and a
/// cluster without any present value is represented by its first member.
#[derive(Clone, Debug, Default)]
pub struct SimilarityEngine {
    model: SimilarityModel,
}

impl SimilarityEngine {
    /// Engine scoring with `model`.
    pub fn new(model: SimilarityModel) -> Self {
        Self { model }
    }

    /// Build an engine from a model fitted to `pairs`.
    pub fn train(pairs: &TrainingPairs) -> Self {
        Self::new(SimilarityModel::train(pairs))
    }

    /// Model in use.
    pub fn model(&self) -> &SimilarityModel {
        &self.model
    }

    fn member_confidence(&self, values: &[Option<&str>], member: usize) -> Confidence {
        if values.len() < 2 {
            return 1.0;
        }
        let total: f64 = values
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != member)
            .map(|(_, other)| self.model.score(values[member], *other))
            .sum();
        (total / (values.len() - 1) as f64).clamp(0.0, 1.0)
    }
}

impl ResolutionEngine for SimilarityEngine {
    fn partition(
        &self,
        records: &RecordStore,
        threshold: Confidence,
    ) -> Result<Vec<ClusterGroup>, DedupeError> {
        let mut by_value: IndexMap<&str, Vec<InternalKey>> = IndexMap::new();
        let mut absent: Vec<InternalKey> = Vec::new();
        for (key, record) in records.iter() {
            match record.function.as_deref() {
                Some(value) => by_value.entry(value).or_default().push(key),
                None => absent.push(key),
            }
        }

        info!(
            "[dedupe:engine] clustering {} records (distinct values={}, absent={}, threshold={})",
            records.len(),
            by_value.len(),
            absent.len(),
            threshold
        );

        let values: Vec<&str> = by_value.keys().copied().collect();
        let mut links = UnionFind::new(values.len());
        for left in 0..values.len() {
            for right in (left + 1)..values.len() {
                let p = self.model.score(Some(values[left]), Some(values[right]));
                if p >= threshold {
                    links.union(left, right);
                }
            }
        }

        let mut components: HashMap<usize, Vec<InternalKey>> = HashMap::new();
        for (idx, keys) in by_value.values().enumerate() {
            components
                .entry(links.find(idx))
                .or_default()
                .extend(keys.iter().copied());
        }
        let mut member_sets: Vec<Vec<InternalKey>> = components.into_values().collect();
        member_sets.extend(absent.into_iter().map(|key| vec![key]));
        for members in &mut member_sets {
            members.sort_unstable();
        }
        member_sets.sort_by_key(|members| members.first().copied());

        let mut clusters = Vec::with_capacity(member_sets.len());
        for keys in member_sets {
            let member_values: Vec<Option<&str>> = keys
                .iter()
                .map(|key| records.get(*key).and_then(|r| r.function.as_deref()))
                .collect();
            let scores = (0..keys.len())
                .map(|idx| self.member_confidence(&member_values, idx))
                .collect();
            clusters.push(ClusterGroup::new(keys, scores));
        }
        debug!("[dedupe:engine] produced {} clusters", clusters.len());
        Ok(clusters)
    }

    fn canonicalize(&self, records: &[&Record]) -> Record {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in records.iter().enumerate() {
            let Some(value) = candidate.function.as_deref() else {
                continue;
            };
            let centrality: f64 = records
                .iter()
                .map(|other| similarity(Some(value), other.function.as_deref()))
                .sum();
            if best.is_none_or(|(_, top)| centrality > top) {
                best = Some((idx, centrality));
            }
        }
        let chosen = best.map(|(idx, _)| idx).unwrap_or(0);
        records
            .get(chosen)
            .map(|record| (*record).clone())
            .unwrap_or_default()
    }
}

/// Disjoint-set forest over value indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, idx: usize) -> usize {
        let mut root = idx;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = idx;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) {
        let left = self.find(left);
        let right = self.find(right);
        if left != right {
            // Keep the lower index as root so roots follow first appearance.
            let (root, child) = if left < right { (left, right) } else { (right, left) };
            self.parent[child] = root;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityMapper;
    use crate::ingestion::ingest;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn store(input: &str) -> RecordStore {
        ingest(Cursor::new(input), IdentityMapper::default()).unwrap()
    }

    fn keys(clusters: &[ClusterGroup]) -> Vec<Vec<InternalKey>> {
        clusters.iter().map(|c| c.keys.clone()).collect()
    }

    #[test]
    fn default_model_is_even_odds_at_bias() {
        let model = SimilarityModel::default();
        assert!((model.match_probability(DEFAULT_BIAS) - 0.5).abs() < 1e-12);
        assert!(model.match_probability(1.0) > 0.9);
        assert!(model.match_probability(0.0) < 0.001);
        assert_eq!(model.score(None, Some("holin")), 0.0);
        assert_eq!(model.score(None, None), 0.0);
    }

    #[test]
    fn identical_and_close_values_cluster_together() {
        let records = store(
            "a\tTail fiber protein\n\
             b\tmajor capsid protein\n\
             c\tphage tail fiber\n\
             d\ttail fibers\n\
             e\tputative protein\n",
        );
        let engine = SimilarityEngine::default();
        let clusters = engine.partition(&records, 0.5).unwrap();
        assert_eq!(keys(&clusters), vec![vec![0, 2, 3], vec![1], vec![4]]);

        let tail = &clusters[0];
        assert_eq!(tail.scores.len(), 3);
        assert!(tail.scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(clusters[1].scores, vec![1.0]);
        assert_eq!(clusters[2].scores, vec![1.0]);
    }

    #[test]
    fn partition_covers_every_key_once() {
        let records = store(
            "a\tholin\nb\tholin\nc\tendolysin\nd\t\ne\t\nf\tportal\ng\tportal protein\n",
        );
        let clusters = SimilarityEngine::default()
            .partition(&records, 0.5)
            .unwrap();
        let mut covered: Vec<InternalKey> =
            clusters.iter().flat_map(|c| c.keys.iter().copied()).collect();
        covered.sort_unstable();
        assert_eq!(covered, records.keys().collect::<Vec<_>>());
        // Absent values stay apart from each other.
        assert!(clusters.iter().any(|c| c.keys == vec![3]));
        assert!(clusters.iter().any(|c| c.keys == vec![4]));
    }

    #[test]
    fn threshold_above_every_probability_keeps_only_identical_values_together() {
        let records = store("a\ttail fiber\nb\ttail fibre\nc\ttail fiber\n");
        let clusters = SimilarityEngine::default()
            .partition(&records, 1.0)
            .unwrap();
        assert_eq!(keys(&clusters), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn canonicalize_prefers_central_value_then_earliest() {
        let engine = SimilarityEngine::default();
        let a = Record::new("a", Some("tail fibre".to_string()));
        let b = Record::new("b", Some("tail fiber".to_string()));
        let c = Record::new("c", Some("tail fiber".to_string()));
        let d = Record::new("d", None);
        assert_eq!(engine.canonicalize(&[&a, &b, &c, &d]), b);
        assert_eq!(engine.canonicalize(&[&a, &b]), a);
        assert_eq!(engine.canonicalize(&[&d, &b]), b);
        assert_eq!(engine.canonicalize(&[&d]), d);
    }

    #[test]
    fn training_separates_labeled_pairs() {
        let pairs = TrainingPairs {
            matches: vec![
                (Some("tail fiber".into()), Some("tail fibre".into())),
                (Some("holin".into()), Some("holin".into())),
                (Some("terminase".into()), Some("terminase small".into())),
            ],
            distinct: vec![
                (Some("holin".into()), Some("portal".into())),
                (Some("major capsid".into()), Some("portal".into())),
                (Some("endolysin".into()), None),
            ],
        };
        let model = SimilarityModel::train(&pairs);
        assert!(model.weight > 0.0);
        for (left, right) in &pairs.matches {
            assert!(model.score(left.as_deref(), right.as_deref()) > 0.5);
        }
        for (left, right) in &pairs.distinct {
            assert!(model.score(left.as_deref(), right.as_deref()) < 0.5);
        }
    }

    #[test]
    fn training_without_pairs_keeps_defaults() {
        assert_eq!(
            SimilarityModel::train(&TrainingPairs::default()),
            SimilarityModel::default()
        );
    }

    #[test]
    fn artifacts_persist_as_json() {
        let temp = tempdir().unwrap();
        let settings = temp.path().join("genes.tsv.learn");
        let training = temp.path().join("genes.tsv.train");

        let model = SimilarityModel {
            version: SETTINGS_VERSION,
            weight: 7.5,
            bias: 0.65,
        };
        model.write_settings(&settings).unwrap();
        assert_eq!(SimilarityModel::read_settings(&settings).unwrap(), model);

        let pairs = TrainingPairs {
            matches: vec![(Some("holin".into()), Some("holin".into()))],
            distinct: vec![(Some("holin".into()), None)],
        };
        pairs.write(&training).unwrap();
        let raw = std::fs::read_to_string(&training).unwrap();
        assert!(raw.contains("\"match\""));
        assert!(raw.contains("null"));
        assert_eq!(TrainingPairs::read(&training).unwrap(), pairs);
    }

    #[test]
    fn corrupt_settings_are_artifact_errors() {
        let temp = tempdir().unwrap();
        let settings = temp.path().join("bad.learn");
        std::fs::write(&settings, "not json").unwrap();
        let err = SimilarityModel::read_settings(&settings).unwrap_err();
        assert!(matches!(err, DedupeError::Artifact { .. }));

        std::fs::write(&settings, r#"{"version":9,"weight":1.0,"bias":0.5}"#).unwrap();
        let err = SimilarityModel::read_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("unsupported settings version 9"));
    }
}
