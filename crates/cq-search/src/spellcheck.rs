//! Spelling classification of query text.
//!
//! The fulltext builder only needs to know how much of the query the index recognizes. That
//! judgement sits behind the [`Spellchecker`] trait; [`VocabularySpellchecker`] is a local
//! implementation backed by a known vocabulary and the English stopword list.

use std::{
    collections::{BTreeSet, HashSet},
    fmt,
    str::FromStr,
};

use cq_config::ContainerConfig;
use stop_words::LANGUAGE;
use tracing::debug;

use crate::ParseError;

/// Maximum edit distance for a vocabulary correction.
const MAX_CORRECTION_DISTANCE: usize = 2;

/// How well the terms of a query are recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SpellingType {
    /// Every term is known.
    #[default]
    Exact,
    /// Most terms are known.
    MostExact,
    /// No term is known.
    Fuzzy,
    /// Some terms are known.
    MostFuzzy,
    /// The query is made of stopwords only.
    PureStopwords,
}

impl SpellingType {
    /// Returns true for the types that call for fuzzy and phonetic branches.
    pub fn is_fuzzy(self) -> bool {
        matches!(self, Self::Fuzzy | Self::MostFuzzy)
    }

    /// Returns the canonical name of the spelling type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::MostExact => "most_exact",
            Self::Fuzzy => "fuzzy",
            Self::MostFuzzy => "most_fuzzy",
            Self::PureStopwords => "pure_stopwords",
        }
    }
}

impl fmt::Display for SpellingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpellingType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "exact" => Ok(Self::Exact),
            "most_exact" => Ok(Self::MostExact),
            "fuzzy" => Ok(Self::Fuzzy),
            "most_fuzzy" => Ok(Self::MostFuzzy),
            "pure_stopwords" => Ok(Self::PureStopwords),
            other => Err(ParseError::UnknownSpellingType {
                name: other.to_string(),
            }),
        }
    }
}

/// Result of spellchecking a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spelling {
    /// Spelling classification.
    pub kind: SpellingType,
    /// Corrected query text, when a correction was found.
    pub corrected: Option<String>,
}

impl Spelling {
    /// Creates a spelling result without correction.
    pub fn new(kind: SpellingType) -> Self {
        Self {
            kind,
            corrected: None,
        }
    }
}

/// Classifies query text for a container.
pub trait Spellchecker: Send + Sync {
    /// Returns the spelling classification of `text`.
    fn spelling(&self, container: &ContainerConfig, text: &str) -> Spelling;
}

/// Spellchecker that always answers with the same classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSpellchecker(pub SpellingType);

impl Spellchecker for FixedSpellchecker {
    fn spelling(&self, _container: &ContainerConfig, _text: &str) -> Spelling {
        Spelling::new(self.0)
    }
}

/// Spellchecker backed by a known vocabulary and English stopwords.
#[derive(Debug, Clone)]
pub struct VocabularySpellchecker {
    /// Known terms, lowercase.
    vocabulary: BTreeSet<String>,
    /// Stopwords, lowercase.
    stopwords: HashSet<String>,
}

impl VocabularySpellchecker {
    /// Creates a spellchecker that knows the given terms.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stopwords = stop_words::get(LANGUAGE::English)
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            vocabulary: vocabulary
                .into_iter()
                .flat_map(|text| tokenize(text.as_ref()))
                .collect(),
            stopwords,
        }
    }

    /// Returns the number of known terms.
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Returns true if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Returns the closest known term within the correction distance.
    fn correct(&self, token: &str) -> Option<&str> {
        let mut best: Option<(usize, &str)> = None;
        for term in &self.vocabulary {
            let distance = strsim::levenshtein(token, term);
            if distance <= MAX_CORRECTION_DISTANCE && best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, term));
            }
        }
        best.map(|(_, term)| term)
    }
}

impl Spellchecker for VocabularySpellchecker {
    fn spelling(&self, container: &ContainerConfig, text: &str) -> Spelling {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Spelling::new(SpellingType::Exact);
        }

        let content: Vec<&String> = tokens
            .iter()
            .filter(|t| !self.stopwords.contains(*t))
            .collect();
        if content.is_empty() {
            return Spelling::new(SpellingType::PureStopwords);
        }

        let known = content
            .iter()
            .filter(|t| self.vocabulary.contains(t.as_str()))
            .count();
        let kind = if known == content.len() {
            SpellingType::Exact
        } else if known * 2 > content.len() {
            SpellingType::MostExact
        } else if known > 0 {
            SpellingType::MostFuzzy
        } else {
            SpellingType::Fuzzy
        };

        let mut changed = false;
        let corrected: Vec<&str> = tokens
            .iter()
            .map(|token| {
                if self.stopwords.contains(token) || self.vocabulary.contains(token) {
                    return token.as_str();
                }
                match self.correct(token) {
                    Some(term) => {
                        changed = true;
                        term
                    }
                    None => token.as_str(),
                }
            })
            .collect();

        debug!(
            container = %container.name,
            %kind,
            known,
            terms = content.len(),
            "classified query spelling"
        );
        Spelling {
            kind,
            corrected: changed.then(|| corrected.join(" ")),
        }
    }
}

/// Splits text into lowercase alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::container;

    fn checker() -> VocabularySpellchecker {
        VocabularySpellchecker::new(["red shoes", "blue", "leather"])
    }

    #[test]
    fn spelling_type_parses_names() {
        assert_eq!("most-fuzzy".parse(), Ok(SpellingType::MostFuzzy));
        assert_eq!("EXACT".parse(), Ok(SpellingType::Exact));
        assert_eq!(
            "sloppy".parse::<SpellingType>(),
            Err(ParseError::UnknownSpellingType {
                name: "sloppy".into()
            })
        );
    }

    #[test]
    fn known_terms_are_exact() {
        let spelling = checker().spelling(&container(), "Red shoes");
        assert_eq!(spelling, Spelling::new(SpellingType::Exact));
    }

    #[test]
    fn stopwords_only_query() {
        let spelling = checker().spelling(&container(), "the and of");
        assert_eq!(spelling.kind, SpellingType::PureStopwords);
    }

    #[test]
    fn stopwords_do_not_count_as_unknown() {
        let spelling = checker().spelling(&container(), "the red shoes");
        assert_eq!(spelling.kind, SpellingType::Exact);
    }

    #[test]
    fn majority_known_is_most_exact() {
        let spelling = checker().spelling(&container(), "red leather boots");
        assert_eq!(spelling.kind, SpellingType::MostExact);
    }

    #[test]
    fn minority_known_is_most_fuzzy() {
        let spelling = checker().spelling(&container(), "red boots sandals");
        assert_eq!(spelling.kind, SpellingType::MostFuzzy);
    }

    #[test]
    fn unknown_terms_are_corrected() {
        let spelling = checker().spelling(&container(), "shoez");
        assert_eq!(spelling.kind, SpellingType::Fuzzy);
        assert_eq!(spelling.corrected.as_deref(), Some("shoes"));
    }

    #[test]
    fn fixed_spellchecker_ignores_text() {
        let fixed = FixedSpellchecker(SpellingType::MostFuzzy);
        assert!(fixed.spelling(&container(), "anything").kind.is_fuzzy());
    }
}
