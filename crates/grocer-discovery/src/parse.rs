//! Extraction of store and product records from answer-engine prose.
//!
//! Two strategies run in order:
//!
//! 1. **Structured**: `LABEL: value` blocks in the format the prompts ask
//!    for, tolerating list markers, markdown bold, and several labels on one
//!    line.
//! 2. **Fallback**: pattern matching over lines when the structured pass
//!    yields nothing valid. Product lines need a `$` amount; store lines
//!    come from list items or known chain names in prose.
//!
//! Records from the two strategies are never mixed. Every candidate is
//! validated (non-empty, non-placeholder name) and de-duplicated by slug with
//! the first occurrence kept. Output follows text order.

use std::collections::HashSet;

use grocer_core::{ProductRecord, ServiceSynonyms, StoreRecord, StoreStatus};

use crate::normalize::{
    clean_text, detect_services, normalize_availability, normalize_phone, normalize_price,
    normalize_services, normalize_size, normalize_status, normalize_website, parse_location, slugify,
};
use crate::parse_helpers::{
    find_known_chains, is_bold_heading, leading_phrase, phrases, remainder, split_labeled,
    strip_list_marker,
};

/// Result of parsing one answer-engine response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Records came from labeled blocks.
    Structured(Vec<T>),
    /// Labeled blocks yielded nothing; records came from line patterns.
    Fallback(Vec<T>),
    /// Neither strategy produced a valid record.
    Empty,
}

impl<T> ParseOutcome<T> {
    fn from_strategies(structured: Vec<T>, fallback: impl FnOnce() -> Vec<T>) -> Self {
        if !structured.is_empty() {
            return ParseOutcome::Structured(structured);
        }
        let fallback = fallback();
        if fallback.is_empty() {
            ParseOutcome::Empty
        } else {
            ParseOutcome::Fallback(fallback)
        }
    }

    /// Name of the strategy that produced the records, for logging.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            ParseOutcome::Structured(_) => "structured",
            ParseOutcome::Fallback(_) => "fallback",
            ParseOutcome::Empty => "empty",
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ParseOutcome::Structured(records) | ParseOutcome::Fallback(records) => records.len(),
            ParseOutcome::Empty => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn into_records(self) -> Vec<T> {
        match self {
            ParseOutcome::Structured(records) | ParseOutcome::Fallback(records) => records,
            ParseOutcome::Empty => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Label tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreField {
    Name,
    Address,
    Services,
    Website,
    Status,
    Phone,
    Hours,
    Ignored,
}

const STORE_LABELS: &[(&str, StoreField)] = &[
    ("STORE", StoreField::Name),
    ("STORE_NAME", StoreField::Name),
    ("NAME", StoreField::Name),
    ("ADDRESS", StoreField::Address),
    ("LOCATION", StoreField::Address),
    ("SERVICES", StoreField::Services),
    ("SERVICE", StoreField::Services),
    ("SERVICES_OFFERED", StoreField::Services),
    ("WEBSITE", StoreField::Website),
    ("URL", StoreField::Website),
    ("STATUS", StoreField::Status),
    ("HOURS", StoreField::Hours),
    ("STORE_HOURS", StoreField::Hours),
    ("PHONE", StoreField::Phone),
    ("TELEPHONE", StoreField::Phone),
    ("DISTANCE", StoreField::Ignored),
    ("NOTES", StoreField::Ignored),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductField {
    Name,
    Brand,
    Price,
    Size,
    Category,
    Availability,
    Description,
    Deals,
    Ignored,
}

/// Image and product URLs claimed by the answer engine are not trusted;
/// they are recognized only so they don't bleed into neighbouring values.
const PRODUCT_LABELS: &[(&str, ProductField)] = &[
    ("PRODUCT", ProductField::Name),
    ("PRODUCT_NAME", ProductField::Name),
    ("NAME", ProductField::Name),
    ("ITEM", ProductField::Name),
    ("BRAND", ProductField::Brand),
    ("PRICE", ProductField::Price),
    ("SIZE", ProductField::Size),
    ("CATEGORY", ProductField::Category),
    ("AVAILABILITY", ProductField::Availability),
    ("STOCK", ProductField::Availability),
    ("DESCRIPTION", ProductField::Description),
    ("DEALS", ProductField::Deals),
    ("DEAL", ProductField::Deals),
    ("PROMOTIONS", ProductField::Deals),
    ("IMAGE_URL", ProductField::Ignored),
    ("IMAGE", ProductField::Ignored),
    ("PRODUCT_URL", ProductField::Ignored),
    ("URL", ProductField::Ignored),
    ("LINK", ProductField::Ignored),
];

// ---------------------------------------------------------------------------
// Structured blocks
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Block<F> {
    fields: Vec<(F, String)>,
    /// Name came from an unlabeled heading line and may be replaced by an
    /// explicit name label.
    name_from_heading: bool,
    /// At least one value came from a recognized label.
    labeled: bool,
}

impl<F: Copy + Eq> Block<F> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            name_from_heading: false,
            labeled: false,
        }
    }

    fn get(&self, field: F) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    fn has(&self, field: F) -> bool {
        self.get(field).is_some()
    }

    /// First value wins.
    fn set(&mut self, field: F, value: String) {
        if !self.has(field) {
            self.fields.push((field, value));
        }
    }

    fn replace(&mut self, field: F, value: String) {
        self.fields.retain(|(f, _)| *f != field);
        self.fields.push((field, value));
    }
}

fn flush<F>(current: &mut Option<Block<F>>, blocks: &mut Vec<Block<F>>) {
    if let Some(block) = current.take() {
        // A bare heading with nothing labeled under it is prose, not a record.
        if block.labeled {
            blocks.push(block);
        }
    }
}

/// Applies a record name to the block under construction, starting a new
/// block when the current one already has a firm name.
fn apply_name<F: Copy + Eq>(
    name_field: F,
    name: String,
    current: &mut Option<Block<F>>,
    blocks: &mut Vec<Block<F>>,
) {
    let firm_name = current
        .as_ref()
        .is_some_and(|b| b.has(name_field) && !b.name_from_heading);
    if firm_name {
        flush(current, blocks);
    }
    let block = current.get_or_insert_with(Block::new);
    block.replace(name_field, name);
    block.name_from_heading = false;
    block.labeled = true;
}

/// Groups labeled lines into blocks.
///
/// A block ends at a blank line, a numbered item or heading, or when a
/// second record name arrives. Unlabeled numbered or bold lines open a
/// block named by their leading phrase.
fn collect_blocks<F: Copy + Eq>(text: &str, labels: &[(&str, F)], name_field: F) -> Vec<Block<F>> {
    let mut blocks = Vec::new();
    let mut current: Option<Block<F>> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            flush(&mut current, &mut blocks);
            continue;
        }

        let (marker, rest) = strip_list_marker(line);
        if marker.is_boundary() {
            flush(&mut current, &mut blocks);
        }

        let labeled = split_labeled(rest, labels);
        if labeled.segments.is_empty() {
            if marker.is_boundary() || is_bold_heading(rest) {
                flush(&mut current, &mut blocks);
                if let Some(name) = leading_phrase(rest) {
                    let mut block = Block::new();
                    block.set(name_field, name);
                    block.name_from_heading = true;
                    current = Some(block);
                }
            }
            continue;
        }

        let line_has_name = labeled.segments.iter().any(|(f, _)| *f == name_field);
        if !line_has_name {
            // Text ahead of the labels names the record and supersedes a
            // heading name.
            if let Some(name) = labeled.leading.and_then(clean_text) {
                apply_name(name_field, name, &mut current, &mut blocks);
            }
        }

        for (field, raw_value) in labeled.segments {
            let Some(value) = clean_text(raw_value) else {
                continue;
            };
            if field == name_field {
                apply_name(name_field, value, &mut current, &mut blocks);
            } else {
                let block = current.get_or_insert_with(Block::new);
                block.set(field, value);
                block.labeled = true;
            }
        }
    }

    flush(&mut current, &mut blocks);
    blocks
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Drops records with empty or placeholder names and records whose slug was
/// already seen. Order is preserved.
fn dedup_by_slug<T>(records: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let Some(cleaned) = clean_text(name(record)) else {
                return false;
            };
            seen.insert(slugify(&cleaned))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Parses an answer-engine store listing.
///
/// `location_hint` is the searched location; a five-digit hint fills in
/// the ZIP when a store's address has none.
#[must_use]
pub fn parse_stores(
    text: &str,
    location_hint: &str,
    synonyms: &ServiceSynonyms,
) -> ParseOutcome<StoreRecord> {
    let structured: Vec<StoreRecord> = collect_blocks(text, STORE_LABELS, StoreField::Name)
        .iter()
        .filter_map(|block| store_from_block(block, location_hint, synonyms))
        .collect();
    let structured = dedup_by_slug(structured, |s| s.name.as_str());

    ParseOutcome::from_strategies(structured, || {
        dedup_by_slug(fallback_stores(text, location_hint, synonyms), |s| {
            s.name.as_str()
        })
    })
}

fn store_from_block(
    block: &Block<StoreField>,
    location_hint: &str,
    synonyms: &ServiceSynonyms,
) -> Option<StoreRecord> {
    let name = block.get(StoreField::Name).and_then(clean_text)?;
    let address = block.get(StoreField::Address).and_then(clean_text);
    let services = block
        .get(StoreField::Services)
        .map(|s| normalize_services(s, synonyms))
        .unwrap_or_default();
    let website = block.get(StoreField::Website).and_then(normalize_website);
    let phone = block.get(StoreField::Phone).and_then(normalize_phone);
    let hours = block.get(StoreField::Hours).and_then(clean_text);
    let status = block
        .get(StoreField::Status)
        .map_or(StoreStatus::Unknown, normalize_status);
    let location = parse_location(address.as_deref(), location_hint);

    Some(StoreRecord {
        store_id: slugify(&name),
        name,
        address,
        services,
        status,
        website,
        phone,
        hours,
        location,
    })
}

fn fallback_stores(
    text: &str,
    location_hint: &str,
    synonyms: &ServiceSynonyms,
) -> Vec<StoreRecord> {
    let mut stores = Vec::new();

    for raw_line in text.lines() {
        let (marker, rest) = strip_list_marker(raw_line);
        if rest.is_empty() {
            continue;
        }

        if marker.is_list_item() {
            let Some(name) = leading_phrase(rest) else {
                continue;
            };
            // List items that are themselves service names ("- Delivery")
            // describe a store, they aren't one.
            if name.split_whitespace().count() > 8 || synonyms.lookup(&name).is_some() {
                continue;
            }
            let address = phrases(remainder(rest))
                .find(|p| p.chars().any(|c| c.is_ascii_digit()) && p.contains(','))
                .and_then(clean_text);
            let website = if rest.contains("http") || rest.contains("www.") {
                normalize_website(rest)
            } else {
                None
            };
            let location = parse_location(address.as_deref(), location_hint);
            stores.push(StoreRecord {
                store_id: slugify(&name),
                name,
                address,
                services: detect_services(remainder(rest), synonyms),
                status: StoreStatus::Unknown,
                website,
                phone: None,
                hours: None,
                location,
            });
        } else {
            for chain in find_known_chains(rest) {
                stores.push(StoreRecord {
                    store_id: slugify(chain),
                    name: chain.to_string(),
                    address: None,
                    services: Vec::new(),
                    status: StoreStatus::Unknown,
                    website: None,
                    phone: None,
                    hours: None,
                    location: parse_location(None, location_hint),
                });
            }
        }
    }

    stores
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Parses an answer-engine product listing.
#[must_use]
pub fn parse_products(text: &str) -> ParseOutcome<ProductRecord> {
    let structured: Vec<ProductRecord> =
        collect_blocks(text, PRODUCT_LABELS, ProductField::Name)
            .iter()
            .filter_map(product_from_block)
            .collect();
    let structured = dedup_by_slug(structured, |p| p.name.as_str());

    ParseOutcome::from_strategies(structured, || {
        dedup_by_slug(fallback_products(text), |p| p.name.as_str())
    })
}

fn product_from_block(block: &Block<ProductField>) -> Option<ProductRecord> {
    let name = block.get(ProductField::Name).and_then(clean_text)?;
    let size = block
        .get(ProductField::Size)
        .and_then(normalize_size)
        .or_else(|| normalize_size(&name));

    Some(ProductRecord {
        brand: block.get(ProductField::Brand).and_then(clean_text),
        price: block.get(ProductField::Price).and_then(normalize_price),
        size,
        category: block.get(ProductField::Category).and_then(clean_text),
        availability: block
            .get(ProductField::Availability)
            .map(normalize_availability)
            .unwrap_or_default(),
        description: block.get(ProductField::Description).and_then(clean_text),
        deals: block.get(ProductField::Deals).and_then(clean_text),
        name,
        ..ProductRecord::default()
    })
}

/// Words that, right before a price, mark a line as prose rather than a
/// product entry ("prices range from $3").
const PROSE_PRICE_LEADS: &[&str] = &[
    "from", "for", "at", "is", "are", "costs", "cost", "about", "around", "of", "to", "under",
    "over", "between", "and",
];

fn fallback_products(text: &str) -> Vec<ProductRecord> {
    let mut products = Vec::new();

    for raw_line in text.lines() {
        let (_, rest) = strip_list_marker(raw_line);
        if !rest.contains('$') {
            continue;
        }
        let Some(price) = normalize_price(rest) else {
            continue;
        };
        let Some(name) = leading_phrase(rest) else {
            continue;
        };

        let last_word = name
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_lowercase();
        if name.split_whitespace().count() > 12
            || PROSE_PRICE_LEADS.contains(&last_word.as_str())
            || !name.chars().any(char::is_alphabetic)
        {
            continue;
        }

        products.push(ProductRecord {
            size: normalize_size(rest),
            availability: normalize_availability(rest),
            price: Some(price),
            name,
            ..ProductRecord::default()
        });
    }

    products
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
