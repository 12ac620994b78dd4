/// Caller-supplied record identifier, taken verbatim from column 0 of the input.
/// Example: `NC_001416.1_gene_12`
pub type ExternalId = String;
/// Dense integer handle assigned to an external identifier in first-seen order.
/// Example: `0`, `1`, `2`
pub type InternalKey = usize;
/// Enumeration index of a cluster within one partition call.
/// Not stable across runs.
pub type ClusterId = usize;
/// Engine certainty that a record belongs to its cluster, in `[0.0, 1.0]`.
pub type Confidence = f64;
/// Normalized function annotation text.
/// Examples: `baseplate`, `tail fiber`, `hypothetical`
pub type FunctionText = String;
