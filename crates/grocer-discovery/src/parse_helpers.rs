//! Line-level primitives shared by the structured and fallback parsers.
//!
//! Nothing here knows about stores or products; callers supply the label
//! table and decide what a segment means.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::clean_text;

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[.)]\s+").expect("valid regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+\u{2022}]\s+").expect("valid regex"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+").expect("valid regex"));
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z_ ]*[A-Za-z]|[A-Za-z])\s*\**\s*:").expect("valid regex")
});
static PHRASE_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s[-\u{2013}\u{2014}|]\s|:\s|\(|\)").expect("valid regex")
});
static KNOWN_CHAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut names: Vec<&str> = KNOWN_CHAINS.to_vec();
    // Longest first so "Giant Eagle" is preferred over "Giant".
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let alternation = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("valid regex")
});

/// Grocery chains recognized in free prose when no list structure exists.
pub(crate) const KNOWN_CHAINS: &[&str] = &[
    "Giant Eagle",
    "Wegmans",
    "ALDI",
    "Albertsons",
    "ShopRite",
    "Walmart",
    "Target",
    "Kroger",
    "Safeway",
    "Publix",
    "Whole Foods Market",
    "Whole Foods",
    "Trader Joe's",
    "Sprouts Farmers Market",
    "Sprouts",
    "Food Lion",
    "Meijer",
    "Hy-Vee",
    "Stop & Shop",
    "Giant",
    "Shoppers",
    "Harris Teeter",
    "Jewel-Osco",
    "Mariano's",
    "H-E-B",
    "Costco",
];

/// How a line is introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListMarker {
    Plain,
    Bullet,
    Numbered,
    Heading,
}

impl ListMarker {
    /// Numbered items and headings always start a new record.
    pub(crate) fn is_boundary(self) -> bool {
        matches!(self, ListMarker::Numbered | ListMarker::Heading)
    }

    pub(crate) fn is_list_item(self) -> bool {
        !matches!(self, ListMarker::Plain)
    }
}

/// Strips one leading list marker or markdown heading, plus a number that
/// follows a heading (`"### 1. Target"`).
pub(crate) fn strip_list_marker(line: &str) -> (ListMarker, &str) {
    let line = line.trim();
    if let Some(m) = HEADING_RE.find(line) {
        let rest = &line[m.end()..];
        let rest = NUMBERED_RE
            .find(rest)
            .map_or(rest, |n| &rest[n.end()..]);
        return (ListMarker::Heading, rest.trim());
    }
    if let Some(m) = NUMBERED_RE.find(line) {
        return (ListMarker::Numbered, line[m.end()..].trim());
    }
    if let Some(m) = BULLET_RE.find(line) {
        return (ListMarker::Bullet, line[m.end()..].trim());
    }
    (ListMarker::Plain, line)
}

/// A line split into `LABEL: value` segments.
#[derive(Debug)]
pub(crate) struct LabeledLine<'a, F> {
    /// Text before the first recognized label, if any.
    pub(crate) leading: Option<&'a str>,
    pub(crate) segments: Vec<(F, &'a str)>,
}

/// Uppercases and joins words with `_` so `"Image URL"` and `"IMAGE_URL"`
/// compare equal.
fn canonical_label(raw: &str) -> String {
    raw.split(|c: char| c == ' ' || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

fn lookup_label<F: Copy>(labels: &[(&str, F)], key: &str) -> Option<F> {
    labels
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, field)| *field)
}

/// Characters that end one inline segment before the next label.
const SEGMENT_SEPARATORS: [char; 6] = [',', ';', '|', '-', '\u{2013}', '\u{2014}'];

/// A label is accepted at the start of a line, after a segment separator,
/// or anywhere when written in capitals (`"1 gallon PRICE: $3"`). Mixed-case
/// label words inside a value, as in `"Sale price: $2"`, stay part of the
/// value.
fn label_allowed(line: &str, label_start: usize, label: &str) -> bool {
    let before = line[..label_start].trim_end_matches(|c: char| c.is_whitespace() || c == '*');
    match before.chars().last() {
        None => true,
        Some(c) if SEGMENT_SEPARATORS.contains(&c) => true,
        Some(_) => !label.chars().any(char::is_lowercase),
    }
}

/// Finds every recognized label on `line` and slices the values between
/// them.
///
/// A candidate like `"1 gallon PRICE:"` is tried from its longest word
/// suffix down, so the label is found even without a separator before it.
pub(crate) fn split_labeled<'a, F: Copy>(line: &'a str, labels: &[(&str, F)]) -> LabeledLine<'a, F> {
    // (field, label_start, value_start)
    let mut hits: Vec<(F, usize, usize)> = Vec::new();

    for caps in LABEL_RE.captures_iter(line) {
        let (Some(whole), Some(group)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let candidate = group.as_str();
        let word_starts = candidate
            .char_indices()
            .filter(|&(i, c)| {
                c.is_ascii_alphabetic() && (i == 0 || candidate[..i].ends_with([' ', '_']))
            })
            .map(|(i, _)| i);

        for offset in word_starts {
            let label = &candidate[offset..];
            let label_start = group.start() + offset;
            if let Some(field) = lookup_label(labels, &canonical_label(label)) {
                if label_allowed(line, label_start, label) {
                    hits.push((field, label_start, whole.end()));
                    break;
                }
            }
        }
    }

    let leading = hits
        .first()
        .map(|&(_, label_start, _)| &line[..label_start])
        .filter(|s| !s.trim().is_empty());

    let segments = hits
        .iter()
        .enumerate()
        .map(|(i, &(field, _, value_start))| {
            let value_end = hits.get(i + 1).map_or(line.len(), |&(_, next, _)| next);
            (field, &line[value_start..value_end])
        })
        .collect();

    LabeledLine { leading, segments }
}

/// Returns `true` for lines that are entirely bold, like `"**Target**"`.
pub(crate) fn is_bold_heading(text: &str) -> bool {
    let text = text.trim().trim_end_matches(':');
    text.len() > 4 && text.starts_with("**") && text.ends_with("**")
}

/// Byte offset where the leading phrase of `text` ends: the first separator,
/// comma, or `$`.
fn leading_end(text: &str) -> usize {
    let separator = PHRASE_SEPARATOR_RE.find(text).map_or(text.len(), |m| m.start());
    let dollar = text.find('$').unwrap_or(text.len());
    let comma = text.find(',').unwrap_or(text.len());
    separator.min(dollar).min(comma)
}

/// The name-like phrase at the start of a list item, e.g. `"Target"` from
/// `"**Target** - 1154 S Clark St"`.
pub(crate) fn leading_phrase(text: &str) -> Option<String> {
    clean_text(&text[..leading_end(text)])
}

/// Text following the leading phrase, with its separator removed.
pub(crate) fn remainder(text: &str) -> &str {
    let rest = &text[leading_end(text)..];
    rest.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '\u{2013}' | '\u{2014}' | '|' | ':' | '(' | ',')
    })
}

/// Splits text on phrase separators, keeping commas inside pieces so
/// addresses stay whole.
pub(crate) fn phrases(text: &str) -> impl Iterator<Item = &str> {
    PHRASE_SEPARATOR_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Canonical names of known chains mentioned in `text`, in order of
/// appearance.
pub(crate) fn find_known_chains(text: &str) -> Vec<&'static str> {
    let text = text.replace('\u{2019}', "'");
    KNOWN_CHAIN_RE
        .find_iter(&text)
        .filter_map(|m| {
            KNOWN_CHAINS
                .iter()
                .find(|name| name.eq_ignore_ascii_case(m.as_str()))
                .copied()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        Name,
        Price,
        Image,
    }

    const LABELS: &[(&str, Field)] = &[
        ("PRODUCT", Field::Name),
        ("PRICE", Field::Price),
        ("IMAGE_URL", Field::Image),
    ];

    #[test]
    fn strip_list_marker_variants() {
        assert_eq!(strip_list_marker("1. Target"), (ListMarker::Numbered, "Target"));
        assert_eq!(strip_list_marker("12) Target"), (ListMarker::Numbered, "Target"));
        assert_eq!(strip_list_marker("- Target"), (ListMarker::Bullet, "Target"));
        assert_eq!(strip_list_marker("\u{2022} Target"), (ListMarker::Bullet, "Target"));
        assert_eq!(strip_list_marker("### 2. Target"), (ListMarker::Heading, "Target"));
        assert_eq!(
            strip_list_marker("**PRICE:** $3"),
            (ListMarker::Plain, "**PRICE:** $3")
        );
    }

    #[test]
    fn split_labeled_inline_segments() {
        let line = split_labeled("PRODUCT: Whole Milk, PRICE: $3.49 | IMAGE URL: x", LABELS);
        assert!(line.leading.is_none());
        assert_eq!(line.segments.len(), 3);
        assert_eq!(line.segments[0], (Field::Name, " Whole Milk, "));
        assert_eq!(line.segments[1], (Field::Price, " $3.49 | "));
        assert_eq!(line.segments[2].0, Field::Image);
    }

    #[test]
    fn split_labeled_finds_label_without_separator() {
        let line = split_labeled("Whole Milk 1 gallon PRICE: $3.49", LABELS);
        assert_eq!(line.leading, Some("Whole Milk 1 gallon "));
        assert_eq!(line.segments, vec![(Field::Price, " $3.49")]);
    }

    #[test]
    fn split_labeled_handles_bold_labels() {
        let line = split_labeled("**Price:** $3.49", LABELS);
        assert_eq!(line.segments.len(), 1);
        assert_eq!(line.segments[0].0, Field::Price);
        assert_eq!(clean_text(line.segments[0].1).as_deref(), Some("$3.49"));
    }

    #[test]
    fn split_labeled_keeps_mixed_case_label_words_inside_values() {
        let line = split_labeled("PRODUCT: Great value. Sale price: $2.99 this week", LABELS);
        assert_eq!(
            line.segments,
            vec![(Field::Name, " Great value. Sale price: $2.99 this week")]
        );

        let line = split_labeled("PRODUCT: Whole Milk; Price: $3.49", LABELS);
        assert_eq!(line.segments.len(), 2);
        assert_eq!(line.segments[1], (Field::Price, " $3.49"));
    }

    #[test]
    fn split_labeled_ignores_url_schemes() {
        let line = split_labeled("see https://example.com", LABELS);
        assert!(line.segments.is_empty());
    }

    #[test]
    fn leading_phrase_cuts_at_separators() {
        assert_eq!(
            leading_phrase("**Target** - 1154 S Clark St").as_deref(),
            Some("Target")
        );
        assert_eq!(leading_phrase("Organic Milk $4.99").as_deref(), Some("Organic Milk"));
        assert_eq!(leading_phrase("Jewel-Osco (open 24h)").as_deref(), Some("Jewel-Osco"));
    }

    #[test]
    fn remainder_skips_separator() {
        assert_eq!(
            remainder("Target - 1154 S Clark St, Chicago, IL 60605"),
            "1154 S Clark St, Chicago, IL 60605"
        );
    }

    #[test]
    fn known_chains_prefer_longest_name() {
        assert_eq!(
            find_known_chains("Try Giant Eagle or Trader Joe\u{2019}s, and also aldi."),
            vec!["Giant Eagle", "Trader Joe's", "ALDI"]
        );
    }
}
