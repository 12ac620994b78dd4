/// Constants used by function-text normalization.
pub mod normalize {
    /// Literal that replaces any annotation mentioning an unknown/hypothetical function.
    pub const HYPOTHETICAL: &str = "hypothetical";
    /// Markers that collapse the whole annotation into [`HYPOTHETICAL`].
    pub const HYPOTHETICAL_MARKERS: [&str; 2] = ["hypothetical", "unknown"];
    /// Filler phrases removed by plain substring deletion, in application order.
    ///
    /// Longer phrases precede the shorter phrases they contain.
    pub const NOISE_PHRASES: &[&str] = &[
        "similar to ",
        "bacteriophage-",
        "bacteriophage",
        "phage-",
        "phage",
        "associated",
        "acquired",
        "aquired",
        "domain containing",
        "domain-containing",
        "domain",
        "conserved",
        "predicted",
        "putative",
        "protein",
        "homolog",
        "analog",
        "-like",
        " like",
    ];
    /// Spelling variants rewritten after noise stripping, as `(from, to)`.
    pub const REWRITES: &[(&str, &str)] = &[("base plate", "baseplate")];
    /// Accession fragments (`gp12`, `orf7`, `orf 7`) replaced by a single space.
    pub const ACCESSION_PATTERNS: [&str; 3] = [r"\bgp\d+", r"\borf\d+", r"\borf \d+"];
}

/// Constants used by the reference similarity engine.
pub mod engine {
    /// Version tag for persisted settings artifacts.
    pub const SETTINGS_VERSION: u8 = 1;
    /// Default logistic slope applied to string similarity.
    pub const DEFAULT_WEIGHT: f64 = 12.0;
    /// Default similarity at which a pair is an even-odds match.
    pub const DEFAULT_BIAS: f64 = 0.8;
    /// Gradient-descent iterations used when fitting labeled pairs.
    pub const TRAINING_ITERATIONS: usize = 500;
    /// Gradient-descent step size used when fitting labeled pairs.
    pub const TRAINING_LEARNING_RATE: f64 = 0.5;
}

/// Constants used by pipeline configuration and artifact layout.
pub mod pipeline {
    use crate::types::{Confidence, InternalKey};

    /// Default partition threshold handed to the engine.
    pub const DEFAULT_THRESHOLD: Confidence = 0.5;
    /// Default IdentityMapper counter origin.
    pub const DEFAULT_ID_ORIGIN: InternalKey = 0;
    /// Suffix appended to the input path for the persisted model settings.
    pub const SETTINGS_SUFFIX: &str = ".learn";
    /// Suffix appended to the input path for persisted labeled pairs.
    pub const TRAINING_SUFFIX: &str = ".train";
    /// Field separator used by both input and report lines.
    pub const FIELD_DELIMITER: char = '\t';
}
