//! Matching and normalization knobs loaded from an optional YAML file.
//!
//! Every field is optional in the file; omitted values fall back to the
//! built-in defaults. Service synonyms from the file are merged over the
//! built-in table rather than replacing it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::records::ServiceTag;
use crate::ConfigError;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.3;
pub const DEFAULT_BRAND_BONUS: f64 = 0.15;

const BUILTIN_SYNONYMS: &[(&str, ServiceTag)] = &[
    ("delivery", ServiceTag::Delivery),
    ("home delivery", ServiceTag::Delivery),
    ("same day delivery", ServiceTag::Delivery),
    ("grocery delivery", ServiceTag::Delivery),
    ("pickup", ServiceTag::Pickup),
    ("pick up", ServiceTag::Pickup),
    ("store pickup", ServiceTag::Pickup),
    ("order pickup", ServiceTag::Pickup),
    ("in store pickup", ServiceTag::Pickup),
    ("click and collect", ServiceTag::Pickup),
    ("curbside", ServiceTag::Curbside),
    ("curb side", ServiceTag::Curbside),
    ("curbside pickup", ServiceTag::Curbside),
    ("curb side pickup", ServiceTag::Curbside),
    ("drive up", ServiceTag::Curbside),
    ("in store", ServiceTag::InStore),
    ("instore", ServiceTag::InStore),
    ("in store shopping", ServiceTag::InStore),
    ("shop in store", ServiceTag::InStore),
    ("walk in", ServiceTag::InStore),
];

/// Raw shape of the tuning YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TuningFile {
    pub match_threshold: Option<f64>,
    pub brand_bonus: Option<f64>,
    pub service_synonyms: BTreeMap<String, ServiceTag>,
}

/// Maps free-text service phrases to canonical [`ServiceTag`]s.
#[derive(Debug, Clone)]
pub struct ServiceSynonyms {
    table: HashMap<String, ServiceTag>,
}

impl Default for ServiceSynonyms {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServiceSynonyms {
    /// The built-in synonym table.
    #[must_use]
    pub fn builtin() -> Self {
        let table = BUILTIN_SYNONYMS
            .iter()
            .map(|(phrase, tag)| (normalize_phrase(phrase), *tag))
            .collect();
        Self { table }
    }

    /// Returns a copy of `self` with `extra` entries added; extra entries
    /// win over existing ones with the same phrase.
    #[must_use]
    pub fn with_overrides<'a, I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a ServiceTag)>,
    {
        for (phrase, tag) in extra {
            let key = normalize_phrase(phrase);
            if !key.is_empty() {
                self.table.insert(key, *tag);
            }
        }
        self
    }

    /// Resolves a phrase to a service tag.
    ///
    /// Exact phrase matches win. Otherwise the longest known phrase that
    /// appears in `phrase` as whole words is used, so `"free curbside pickup"`
    /// resolves through `"curbside pickup"` rather than `"pickup"`.
    #[must_use]
    pub fn lookup(&self, phrase: &str) -> Option<ServiceTag> {
        let normalized = normalize_phrase(phrase);
        if normalized.is_empty() {
            return None;
        }
        if let Some(tag) = self.table.get(&normalized) {
            return Some(*tag);
        }

        let padded = format!(" {normalized} ");
        self.table
            .iter()
            .filter(|(key, _)| padded.contains(&format!(" {key} ")))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, tag)| *tag)
    }

    /// Finds every known phrase in `text`, left to right.
    ///
    /// At each word the longest matching phrase is taken and scanning
    /// resumes after it, so `"delivery, pickup and curbside"` yields all
    /// three tags while `"click and collect"` stays one pickup phrase.
    /// Tags are returned in order of first appearance, without duplicates.
    #[must_use]
    pub fn find_all(&self, text: &str) -> Vec<ServiceTag> {
        let normalized = normalize_phrase(text);
        let words: Vec<&str> = normalized
            .split(' ')
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();
        let longest_key = self
            .table
            .keys()
            .map(|k| k.split(' ').count())
            .max()
            .unwrap_or(0);

        let mut tags = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let last = words.len().min(start + longest_key);
            let hit = (start + 1..=last)
                .rev()
                .find_map(|end| self.table.get(&words[start..end].join(" ")).map(|t| (end, *t)));
            match hit {
                Some((end, tag)) => {
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                    start = end;
                }
                None => start += 1,
            }
        }
        tags
    }
}

/// Lowercases, turns hyphens and underscores into spaces, and collapses
/// whitespace.
fn normalize_phrase(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolved tuning values.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Minimum score for a listing to be accepted as a match.
    pub match_threshold: f64,
    /// Added to the overlap score when every brand token appears in the title.
    pub brand_bonus: f64,
    pub service_synonyms: ServiceSynonyms,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            brand_bonus: DEFAULT_BRAND_BONUS,
            service_synonyms: ServiceSynonyms::builtin(),
        }
    }
}

impl Tuning {
    /// Resolves a parsed [`TuningFile`] against the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTuning`] if the threshold or bonus is
    /// outside `0.0..=1.0`.
    pub fn from_file(file: &TuningFile) -> Result<Self, ConfigError> {
        let match_threshold = file.match_threshold.unwrap_or(DEFAULT_MATCH_THRESHOLD);
        let brand_bonus = file.brand_bonus.unwrap_or(DEFAULT_BRAND_BONUS);

        if !(0.0..=1.0).contains(&match_threshold) {
            return Err(ConfigError::InvalidTuning(format!(
                "match_threshold {match_threshold} must be between 0 and 1"
            )));
        }
        if !(0.0..=1.0).contains(&brand_bonus) {
            return Err(ConfigError::InvalidTuning(format!(
                "brand_bonus {brand_bonus} must be between 0 and 1"
            )));
        }

        Ok(Self {
            match_threshold,
            brand_bonus,
            service_synonyms: ServiceSynonyms::builtin().with_overrides(&file.service_synonyms),
        })
    }
}

/// Load and validate tuning values from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tuning(path: &Path) -> Result<Tuning, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TuningFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    // An empty document deserializes to `()`, not to a struct with defaults.
    if content.trim().is_empty() {
        return Ok(Tuning::default());
    }

    let file: TuningFile = serde_yaml::from_str(&content).map_err(ConfigError::TuningFileParse)?;
    Tuning::from_file(&file)
}

#[cfg(test)]
#[path = "tuning_test.rs"]
mod tests;
