//! Relevance configuration.
//!
//! A [`RelevanceConfig`] is resolved once per container by applying the default scope and then
//! the container scope over the built-in defaults. It is never mutated after load.

use serde::{Deserialize, Serialize};

/// Upper bound for the configurable fuzzy/phonetic recursion depth.
pub const MAX_DEPTH_LIMIT: usize = 4;

/// Default recursion depth for fuzzy and phonetic branches.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Default decay applied to branch boosts per recursion level (halving).
pub const DEFAULT_FUZZY_BOOST_DECAY: f64 = 0.5;

/// Relevance tuning for one search container.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Boost of the phrase clause; `None` disables the phrase clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase_match_boost: Option<u32>,
    /// Frequency above which terms are treated as common; `None` disables common terms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff_frequency: Option<f64>,
    /// Number or percentage of terms that must match in the exact branch.
    pub minimum_should_match: String,
    /// Tie breaker between fields of the multi-field query.
    pub tie_breaker: f32,
    /// Fuzzy matching settings.
    pub fuzziness: FuzzinessConfig,
    /// Phonetic matching settings.
    pub phonetic: PhoneticConfig,
    /// Multiplier applied to fuzzy and phonetic branch boosts per recursion level.
    pub fuzzy_boost_decay: f64,
    /// Maximum recursion depth for fuzzy and phonetic branches.
    pub max_depth: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            phrase_match_boost: None,
            cutoff_frequency: None,
            minimum_should_match: String::from("1"),
            tie_breaker: 1.0,
            fuzziness: FuzzinessConfig::default(),
            phonetic: PhoneticConfig::default(),
            fuzzy_boost_decay: DEFAULT_FUZZY_BOOST_DECAY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RelevanceConfig {
    /// Returns true if fuzzy branches may be generated.
    pub fn is_fuzziness_enabled(&self) -> bool {
        self.fuzziness.enabled
    }

    /// Returns true if phonetic branches may be generated.
    pub fn is_phonetic_enabled(&self) -> bool {
        self.phonetic.enabled
    }
}

/// Fuzzy matching settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FuzzinessConfig {
    /// Whether fuzzy branches are generated for misspelled queries.
    pub enabled: bool,
    /// Edit distance (`AUTO`, `0`, `1` or `2`).
    pub value: String,
    /// Number of leading characters that must match exactly.
    pub prefix_length: u32,
    /// Maximum number of variants a fuzzy term expands to.
    pub max_expansions: u32,
    /// Number or percentage of terms that must match in fuzzy branches.
    pub minimum_should_match: String,
}

impl Default for FuzzinessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            value: String::from("AUTO"),
            prefix_length: 1,
            max_expansions: 10,
            minimum_should_match: String::from("100%"),
        }
    }
}

/// Phonetic matching settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhoneticConfig {
    /// Whether phonetic branches are generated for misspelled queries.
    pub enabled: bool,
}
