//! Extraction of one store's contact details, opening hours, and amenities
//! from answer-engine prose.
//!
//! Labeled lines (`PHONE: ...`, `HOURS: ...`) are read first for each field.
//! Unlabeled lines are scanned for day and time ranges, phone numbers,
//! links, street addresses, services, and known departments. For every
//! scalar field and every weekday the first value found wins.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use grocer_core::{ServiceSynonyms, ServiceTag, Weekday};
use regex::Regex;

use crate::normalize::{
    clean_text, detect_services, is_placeholder, normalize_phone, normalize_services,
    normalize_website,
};
use crate::parse_helpers::{split_labeled, strip_list_marker};

const DAY: &str = r"mon(?:day)?|tue(?:s|sday)?|wed(?:nesday)?|thu(?:r|rs|rsday)?|fri(?:day)?|sat(?:urday)?|sun(?:day)?";

static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b(?:{DAY})\b")).expect("valid regex"));
static DAY_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({DAY})\.?\s*(?:-|\u{{2013}}|\u{{2014}}|to|through|thru)\s*({DAY})\b"
    ))
    .expect("valid regex")
});
static EVERY_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:daily|every\s*day|7\s+days|seven\s+days|all\s+week)\b")
        .expect("valid regex")
});
static WEEKDAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bweekdays\b").expect("valid regex"));
static WEEKENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bweekends?\b").expect("valid regex"));
static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}(?::\d{2})?\s*(?:[ap]\.?m\.?)?|noon)\s*(?:-|\u{2013}|\u{2014}|to)\s*(?:\d{1,2}(?::\d{2})?\s*[ap]\.?m\b\.?|midnight|noon)",
    )
    .expect("valid regex")
});
static ALL_HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b24\s*(?:hours|hrs|/\s*7)\b").expect("valid regex"));
static CLOSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bclosed\b").expect("valid regex"));
static STREET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,6}\s+(?:[\w.'-]+\s+){0,5}?(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|court|ct|place|pl|parkway|pkwy|highway|hwy)\b.*",
    )
    .expect("valid regex")
});
static FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = FEATURES
        .iter()
        .map(|(word, _)| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("valid regex")
});

/// Department and amenity words mapped to the name reported for them.
const FEATURES: &[(&str, &str)] = &[
    ("pharmacy", "pharmacy"),
    ("bakery", "bakery"),
    ("deli", "deli"),
    ("floral", "floral"),
    ("flowers", "floral"),
    ("fuel", "fuel"),
    ("gas station", "fuel"),
    ("starbucks", "cafe"),
    ("coffee shop", "cafe"),
    ("cafe", "cafe"),
    ("café", "cafe"),
    ("optical", "optical"),
    ("bank", "bank"),
    ("liquor", "beer & wine"),
    ("wine", "beer & wine"),
    ("beer", "beer & wine"),
    ("hot bar", "prepared foods"),
    ("salad bar", "prepared foods"),
    ("seafood", "seafood"),
    ("butcher", "butcher"),
    ("meat counter", "butcher"),
    ("sushi", "sushi"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailField {
    Name,
    Address,
    Phone,
    Website,
    Services,
    Features,
    Hours,
    Ignored,
}

const DETAIL_LABELS: &[(&str, DetailField)] = &[
    ("STORE", DetailField::Name),
    ("STORE_NAME", DetailField::Name),
    ("NAME", DetailField::Name),
    ("ADDRESS", DetailField::Address),
    ("LOCATION", DetailField::Address),
    ("PHONE", DetailField::Phone),
    ("PHONE_NUMBER", DetailField::Phone),
    ("TELEPHONE", DetailField::Phone),
    ("WEBSITE", DetailField::Website),
    ("URL", DetailField::Website),
    ("SERVICES", DetailField::Services),
    ("SERVICES_OFFERED", DetailField::Services),
    ("FEATURES", DetailField::Features),
    ("AMENITIES", DetailField::Features),
    ("DEPARTMENTS", DetailField::Features),
    ("HOURS", DetailField::Hours),
    ("STORE_HOURS", DetailField::Hours),
    ("OPENING_HOURS", DetailField::Hours),
    ("STATUS", DetailField::Ignored),
    ("NOTES", DetailField::Ignored),
];

/// Fields recovered from a store details reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStoreDetails {
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: BTreeMap<Weekday, String>,
    pub services: Vec<ServiceTag>,
    pub features: Vec<String>,
}

impl ParsedStoreDetails {
    /// `true` when nothing at all was recovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.hours.is_empty()
            && self.services.is_empty()
            && self.features.is_empty()
    }

    fn absorb_labeled(&mut self, field: DetailField, value: &str, synonyms: &ServiceSynonyms) {
        match field {
            DetailField::Address => {
                if self.address.is_none() {
                    self.address = Some(value.to_string());
                }
            }
            DetailField::Phone => {
                if self.phone.is_none() {
                    self.phone = normalize_phone(value);
                }
            }
            DetailField::Website => {
                if self.website.is_none() {
                    self.website = normalize_website(value);
                }
            }
            DetailField::Services => self.add_services(normalize_services(value, synonyms)),
            DetailField::Features => {
                for item in value.split([',', ';', '|']) {
                    let known = known_features(item);
                    if known.is_empty() {
                        if let Some(other) = clean_text(item)
                            .filter(|f| f.split_whitespace().count() <= 4)
                        {
                            self.add_feature(other.to_lowercase());
                        }
                    } else {
                        known.into_iter().for_each(|f| self.add_feature(f.to_string()));
                    }
                }
            }
            DetailField::Hours => self.add_hours(hours_entries(value, true)),
            DetailField::Name | DetailField::Ignored => {}
        }
    }

    fn absorb_unlabeled(&mut self, line: &str, synonyms: &ServiceSynonyms) {
        let hours = hours_entries(line, false);
        if !hours.is_empty() {
            self.add_hours(hours);
            return;
        }

        if self.phone.is_none() {
            self.phone = normalize_phone(line);
        }
        if self.website.is_none() && (line.contains("http") || line.contains("www.")) {
            self.website = normalize_website(line);
        }
        if self.address.is_none() {
            self.address = STREET_RE.find(line).and_then(|m| clean_text(m.as_str()));
        }
        self.add_services(detect_services(line, synonyms));
        for feature in known_features(line) {
            self.add_feature(feature.to_string());
        }
    }

    fn add_hours(&mut self, entries: Vec<(Weekday, String)>) {
        for (day, value) in entries {
            self.hours.entry(day).or_insert(value);
        }
    }

    fn add_services(&mut self, tags: Vec<ServiceTag>) {
        for tag in tags {
            if !self.services.contains(&tag) {
                self.services.push(tag);
            }
        }
    }

    fn add_feature(&mut self, feature: String) {
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
    }
}

/// Parses an answer-engine reply about a single store.
#[must_use]
pub fn parse_store_details(text: &str, synonyms: &ServiceSynonyms) -> ParsedStoreDetails {
    let mut details = ParsedStoreDetails::default();

    for raw_line in text.lines() {
        let (_, line) = strip_list_marker(raw_line);
        if is_placeholder(line) {
            continue;
        }

        let labeled = split_labeled(line, DETAIL_LABELS);
        if labeled.segments.is_empty() {
            details.absorb_unlabeled(line, synonyms);
            continue;
        }
        for (field, raw_value) in labeled.segments {
            if let Some(value) = clean_text(raw_value) {
                details.absorb_labeled(field, &value, synonyms);
            }
        }
    }

    details
}

// ---------------------------------------------------------------------------
// Hours
// ---------------------------------------------------------------------------

/// Splits `text` into `(day, hours)` pairs.
///
/// Pieces without a time are carried into the next piece, so
/// `"Monday, Wednesday: 9 AM - 5 PM"` covers both days. When a piece with a
/// time names no day, every day is assumed only if `days_default_to_all`.
fn hours_entries(text: &str, days_default_to_all: bool) -> Vec<(Weekday, String)> {
    let mut entries = Vec::new();
    let mut pending = String::new();

    for piece in text.split([';', '|', ',']) {
        pending.push_str(piece);
        pending.push(' ');
        if let Some(value) = hours_value(piece) {
            for day in days_in(&pending, days_default_to_all) {
                entries.push((day, value.clone()));
            }
            pending.clear();
        }
    }

    entries
}

fn hours_value(text: &str) -> Option<String> {
    if let Some(m) = TIME_RANGE_RE.find(text) {
        return Some(m.as_str().split_whitespace().collect::<Vec<_>>().join(" "));
    }
    if ALL_HOURS_RE.is_match(text) {
        return Some("Open 24 hours".to_string());
    }
    CLOSED_RE.is_match(text).then(|| "Closed".to_string())
}

fn days_in(text: &str, default_to_all: bool) -> Vec<Weekday> {
    let mut days = Vec::new();

    for caps in DAY_RANGE_RE.captures_iter(text) {
        let from = caps.get(1).and_then(|m| weekday(m.as_str()));
        let to = caps.get(2).and_then(|m| weekday(m.as_str()));
        if let (Some(from), Some(to)) = (from, to) {
            days.extend(day_range(from, to));
        }
    }
    let singles = DAY_RANGE_RE.replace_all(text, " ");
    days.extend(DAY_RE.find_iter(&singles).filter_map(|m| weekday(m.as_str())));

    if WEEKDAYS_RE.is_match(text) {
        days.extend(&Weekday::ALL[..5]);
    }
    if WEEKENDS_RE.is_match(text) {
        days.extend(&Weekday::ALL[5..]);
    }
    if days.is_empty() && (default_to_all || EVERY_DAY_RE.is_match(text)) {
        days.extend(Weekday::ALL);
    }

    let mut seen = Vec::with_capacity(days.len());
    days.retain(|d| {
        if seen.contains(d) {
            false
        } else {
            seen.push(*d);
            true
        }
    });
    days
}

fn weekday(token: &str) -> Option<Weekday> {
    let lower = token.to_lowercase();
    match lower.get(..3)? {
        "mon" => Some(Weekday::Monday),
        "tue" => Some(Weekday::Tuesday),
        "wed" => Some(Weekday::Wednesday),
        "thu" => Some(Weekday::Thursday),
        "fri" => Some(Weekday::Friday),
        "sat" => Some(Weekday::Saturday),
        "sun" => Some(Weekday::Sunday),
        _ => None,
    }
}

/// Inclusive range that wraps past Sunday, so `Sat-Mon` is three days.
fn day_range(from: Weekday, to: Weekday) -> Vec<Weekday> {
    let start = Weekday::ALL.iter().position(|d| *d == from).unwrap_or(0);
    let mut days = Vec::new();
    for offset in 0..Weekday::ALL.len() {
        let day = Weekday::ALL[(start + offset) % Weekday::ALL.len()];
        days.push(day);
        if day == to {
            break;
        }
    }
    days
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

fn known_features(text: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    for m in FEATURE_RE.find_iter(text) {
        let matched = m.as_str().to_lowercase();
        let Some(&(_, feature)) = FEATURES.iter().find(|(word, _)| *word == matched) else {
            continue;
        };
        if !found.contains(&feature) {
            found.push(feature);
        }
    }
    found
}

#[cfg(test)]
#[path = "details_test.rs"]
mod tests;
