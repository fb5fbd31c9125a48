//! Conversion of raw text fragments into typed field values.
//!
//! Every function here is total: malformed input yields `None` (or an empty
//! collection) rather than an error, and the caller decides whether the
//! field is simply absent.

use std::str::FromStr;
use std::sync::LazyLock;

use grocer_core::{Availability, ServiceSynonyms, ServiceTag, StoreLocation, StoreStatus};
use regex::Regex;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

const AMOUNT: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|\.\d+";

static CURRENCY_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\$\s*({AMOUNT})")).expect("valid regex")
});
static BARE_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({AMOUNT})")).expect("valid regex"));
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s*(?:fl\.?\s*oz|oz|lbs?|gallons?|gal|ml|l|count|ct|pack|pk)\b",
    )
    .expect("valid regex")
});
static CITY_STATE_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z .'-]*?),\s*([A-Z]{2})\s+(\d{5})(?:-\d{4})?\b")
        .expect("valid regex")
});
static CITY_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z .'-]*?),\s*([A-Z]{2})\b").expect("valid regex")
});
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[\s.-]?)?\(?\b(\d{3})\)?[\s.-]?(\d{3})[\s.-]?(\d{4})\b")
        .expect("valid regex")
});
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhttps?://[^\s)\]>"'<]+"#).expect("valid regex"));
static WWW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bwww\.[^\s)\]>"'<]+"#).expect("valid regex"));
static BARE_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}(?:/\S*)?$").expect("valid regex")
});

const TRAILING_SEPARATORS: [char; 7] = [',', ';', '|', ':', '-', '\u{2013}', '\u{2014}'];

const PLACEHOLDERS: &[&str] = &[
    "n/a", "na", "none", "null", "unknown", "tbd", "-", "--", "not listed", "not provided",
];

/// Returns `true` for values that stand in for missing data, such as
/// `"N/A"`, `"unknown"`, or template tokens like `"[Store Name]"`.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let wrapped = (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('<') && trimmed.ends_with('>'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'));
    if wrapped {
        return true;
    }
    let lower = trimmed.to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str())
}

/// Trims whitespace, markdown emphasis, surrounding quotes and trailing
/// separators. Returns `None` for empty or placeholder values.
#[must_use]
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_end_matches(TRAILING_SEPARATORS)
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '`')
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim_end_matches(TRAILING_SEPARATORS)
        .trim();
    if is_placeholder(cleaned) {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Extracts a non-negative decimal price from free text.
///
/// A `$`-marked amount wins over a bare number appearing earlier, so
/// `"2 for $5"` yields `5`. Thousands separators are dropped.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let captured = CURRENCY_AMOUNT_RE
        .captures(raw)
        .or_else(|| BARE_AMOUNT_RE.captures(raw))?;
    let digits = captured.get(1)?.as_str().replace(',', "");
    Decimal::from_str(&digits).ok()
}

/// Finds a quantity with a known unit and returns it exactly as written,
/// e.g. `"64 oz"` from `"Oatly Oat Milk 64 oz carton"`.
#[must_use]
pub fn normalize_size(raw: &str) -> Option<String> {
    SIZE_RE.find(raw).map(|m| m.as_str().to_string())
}

/// Maps a delimited service list to canonical tags.
///
/// Each delimited item may name several services (`"Pickup and Curbside"`).
/// Unknown phrases are dropped. Output order follows first appearance and
/// contains no duplicates.
#[must_use]
pub fn normalize_services(raw: &str, synonyms: &ServiceSynonyms) -> Vec<ServiceTag> {
    collect_services(raw.split([',', ';', '/', '|', '&']), synonyms)
}

/// Scans prose for service keywords.
#[must_use]
pub fn detect_services(text: &str, synonyms: &ServiceSynonyms) -> Vec<ServiceTag> {
    collect_services(text.split([',', ';', '.', '/', '|', '&', '(', ')']), synonyms)
}

fn collect_services<'a>(
    pieces: impl Iterator<Item = &'a str>,
    synonyms: &ServiceSynonyms,
) -> Vec<ServiceTag> {
    let mut tags = Vec::new();
    for tag in pieces.flat_map(|piece| synonyms.find_all(piece)) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Derives a stable identifier from a display name.
///
/// `"Trader Joe's"` becomes `"trader_joes"` and `"Stop & Shop"` becomes
/// `"stop_and_shop"`. Letters outside ASCII are kept, so `"H Mart 한아름"`
/// and `"H Mart 갤러리아"` stay distinct. A name with no alphanumeric
/// characters falls back to `store_` plus a short hash of the name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name
        .to_lowercase()
        .replace('&', " and ")
        .replace(['\'', '\u{2019}'], "");

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_sep = false;
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        let digest = format!("{:x}", Sha256::digest(name.as_bytes()));
        format!("store_{}", &digest[..8])
    } else {
        slug
    }
}

/// Maps operating-status text to a [`StoreStatus`].
#[must_use]
pub fn normalize_status(raw: &str) -> StoreStatus {
    let lower = raw.to_lowercase();
    if ["closed", "inactive", "permanently", "not operating"]
        .iter()
        .any(|k| lower.contains(k))
    {
        StoreStatus::Inactive
    } else if ["open", "active", "operating", "operational"]
        .iter()
        .any(|k| lower.contains(k))
    {
        StoreStatus::Active
    } else {
        StoreStatus::Unknown
    }
}

/// Maps stock text to [`Availability`]. Negative phrasing is checked first
/// because `"not available"` contains `"available"`.
#[must_use]
pub fn normalize_availability(raw: &str) -> Availability {
    let lower = raw.to_lowercase();
    if [
        "out of stock",
        "out-of-stock",
        "sold out",
        "unavailable",
        "not available",
        "not in stock",
    ]
    .iter()
    .any(|k| lower.contains(k))
    {
        Availability::OutOfStock
    } else if ["in stock", "in-stock", "available"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Availability::InStock
    } else {
        Availability::Unknown
    }
}

/// Extracts a ten-digit US phone number and formats it as `XXX-XXX-XXXX`.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let caps = PHONE_RE.captures(raw)?;
    let (area, exchange, line) = (caps.get(1)?, caps.get(2)?, caps.get(3)?);
    Some(format!(
        "{}-{}-{}",
        area.as_str(),
        exchange.as_str(),
        line.as_str()
    ))
}

/// Extracts an `http(s)` URL. `www.` hosts and bare domains get an
/// `https://` prefix; anything else is rejected.
#[must_use]
pub fn normalize_website(raw: &str) -> Option<String> {
    if let Some(m) = URL_RE.find(raw) {
        return Some(trim_url(m.as_str()));
    }
    if let Some(m) = WWW_RE.find(raw) {
        return Some(format!("https://{}", trim_url(m.as_str())));
    }
    let candidate = clean_text(raw)?;
    if BARE_DOMAIN_RE.is_match(&candidate) {
        return Some(format!("https://{}", trim_url(&candidate)));
    }
    None
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches(['.', ',', ';', ':', '*']).to_string()
}

/// Splits a US-style address into city, state, and ZIP.
///
/// The last `City, ST 12345` occurrence wins. When the address carries no
/// ZIP and `location_hint` is itself a five-digit ZIP, the hint is used.
#[must_use]
pub fn parse_location(address: Option<&str>, location_hint: &str) -> StoreLocation {
    let mut location = StoreLocation::default();

    if let Some(address) = address {
        if let Some(caps) = CITY_STATE_ZIP_RE.captures_iter(address).last() {
            location.city = caps.get(1).map(|m| m.as_str().trim().to_string());
            location.state = caps.get(2).map(|m| m.as_str().to_string());
            location.zipcode = caps.get(3).map(|m| m.as_str().to_string());
        } else if let Some(caps) = CITY_STATE_RE.captures_iter(address).last() {
            location.city = caps.get(1).map(|m| m.as_str().trim().to_string());
            location.state = caps.get(2).map(|m| m.as_str().to_string());
        }

        if location.zipcode.is_none() {
            location.zipcode = ZIP_RE
                .captures_iter(address)
                .last()
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
        }
    }

    if location.zipcode.is_none() {
        let hint = location_hint.trim();
        if hint.len() == 5 && hint.chars().all(|c| c.is_ascii_digit()) {
            location.zipcode = Some(hint.to_string());
        }
    }

    location
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
