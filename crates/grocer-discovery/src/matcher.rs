//! Pairs answer-engine products with shopping-search listings.
//!
//! Scores are token-set overlap (Jaccard) between the product name and the
//! listing title, plus a bonus when the product's brand appears in the
//! title. Assignment is greedy and one-to-one across the whole response.

use std::collections::HashSet;

use grocer_core::tuning::{DEFAULT_BRAND_BONUS, DEFAULT_MATCH_THRESHOLD};
use grocer_core::{ProductRecord, ShoppingListing, Tuning};

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "the", "of", "with", "for", "in", "by", "at", "to", "from",
];

/// An accepted product/listing pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub product_index: usize,
    pub listing_index: usize,
    /// In `0.0..=1.0`.
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: f64,
    brand_bonus: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            brand_bonus: DEFAULT_BRAND_BONUS,
        }
    }
}

impl Matcher {
    #[must_use]
    pub fn new(threshold: f64, brand_bonus: f64) -> Self {
        Self {
            threshold,
            brand_bonus,
        }
    }

    #[must_use]
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.match_threshold, tuning.brand_bonus)
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Lowercased word tokens with punctuation and stop words removed.
    #[must_use]
    pub fn tokenize(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .replace(['\'', '\u{2019}'], "")
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
            .map(str::to_owned)
            .collect()
    }

    /// Similarity of `product` to `listing`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn score(&self, product: &ProductRecord, listing: &ShoppingListing) -> f64 {
        let name_tokens = Self::tokenize(&product.name);
        let title_tokens = Self::tokenize(&listing.title);

        let union = name_tokens.union(&title_tokens).count();
        #[allow(clippy::cast_precision_loss)]
        let mut score = if union == 0 {
            0.0
        } else {
            name_tokens.intersection(&title_tokens).count() as f64 / union as f64
        };

        if let Some(brand) = &product.brand {
            let brand_tokens = Self::tokenize(brand);
            if !brand_tokens.is_empty() && brand_tokens.is_subset(&title_tokens) {
                score += self.brand_bonus;
            }
        }

        score.clamp(0.0, 1.0)
    }

    /// Chooses at most one listing per product and one product per listing.
    ///
    /// Every pair at or above the threshold is ranked by score, then product
    /// order, then listing URL; a pair is accepted when neither side has
    /// been taken yet. The result is sorted by product index.
    #[must_use]
    pub fn assign(
        &self,
        products: &[ProductRecord],
        listings: &[ShoppingListing],
    ) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = products
            .iter()
            .enumerate()
            .flat_map(|(product_index, product)| {
                listings
                    .iter()
                    .enumerate()
                    .map(move |(listing_index, listing)| MatchCandidate {
                        product_index,
                        listing_index,
                        score: self.score(product, listing),
                    })
            })
            .filter(|c| c.score >= self.threshold)
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.product_index.cmp(&b.product_index))
                .then_with(|| listings[a.listing_index].url.cmp(&listings[b.listing_index].url))
                .then_with(|| a.listing_index.cmp(&b.listing_index))
        });

        let mut products_taken = vec![false; products.len()];
        let mut listings_taken = vec![false; listings.len()];
        let mut accepted = Vec::new();
        for candidate in candidates {
            if products_taken[candidate.product_index] || listings_taken[candidate.listing_index] {
                continue;
            }
            products_taken[candidate.product_index] = true;
            listings_taken[candidate.listing_index] = true;
            accepted.push(candidate);
        }

        accepted.sort_by_key(|c| c.product_index);
        accepted
    }

    /// Copies listing details onto matched products and returns how many
    /// products were enriched. Unmatched products are left untouched.
    pub fn enrich(&self, products: &mut [ProductRecord], listings: &[ShoppingListing]) -> usize {
        let matches = self.assign(products, listings);
        for m in &matches {
            tracing::debug!(
                product = %products[m.product_index].name,
                listing = %listings[m.listing_index].title,
                score = m.score,
                "matched listing"
            );
            apply_listing(&mut products[m.product_index], &listings[m.listing_index]);
        }
        matches.len()
    }
}

fn apply_listing(product: &mut ProductRecord, listing: &ShoppingListing) {
    product.product_url = Some(listing.url.clone());
    product.image_url.clone_from(&listing.image_url);
    product.rating = listing
        .rating
        .filter(|r| r.is_finite() && (0.0..=5.0).contains(r));
    product.reviews_count = listing.reviews_count;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(name: &str, brand: Option<&str>) -> ProductRecord {
        ProductRecord {
            name: name.to_owned(),
            brand: brand.map(str::to_owned),
            ..ProductRecord::default()
        }
    }

    fn listing(title: &str, url: &str) -> ShoppingListing {
        ShoppingListing {
            title: title.to_owned(),
            url: url.to_owned(),
            ..ShoppingListing::default()
        }
    }

    #[test]
    fn tokenize_drops_punctuation_and_stop_words() {
        let tokens = Matcher::tokenize("The Trader Joe's Milk, with Vitamin D");
        let expected: HashSet<String> = ["trader", "joes", "milk", "vitamin", "d"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn partial_overlap_meets_threshold() {
        let matcher = Matcher::default();
        let oatly = product("Oatly Original Oatmilk", None);
        let score = matcher.score(&oatly, &listing("Oatly Oat Milk Original 64oz", "u"));
        assert!((score - 2.0 / 6.0).abs() < 1e-9, "score was {score}");
        assert!(score >= matcher.threshold());
    }

    #[test]
    fn unrelated_listing_is_rejected() {
        let matcher = Matcher::default();
        let oatly = product("Oatly Original Oatmilk", None);
        let listings = vec![listing("Silk Almond Milk", "silk")];
        assert_eq!(matcher.score(&oatly, &listings[0]), 0.0);
        assert!(matcher.assign(&[oatly], &listings).is_empty());
    }

    #[test]
    fn brand_bonus_applies_when_brand_in_title() {
        let matcher = Matcher::default();
        let milk = product("Organic 2% Reduced Fat Milk - 1 gallon", Some("Good & Gather"));
        let title = "Good & Gather Organic 2% Reduced Fat Milk - 1 gal";
        let score = matcher.score(&milk, &listing(title, "u"));
        assert!((score - 0.75).abs() < 1e-9, "score was {score}");

        let no_brand = product("Organic 2% Reduced Fat Milk - 1 gallon", Some("Horizon"));
        let score = matcher.score(&no_brand, &listing(title, "u"));
        assert!((score - 0.6).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn score_is_clamped() {
        let matcher = Matcher::new(0.3, 1.0);
        let eggs = product("Large Eggs", Some("Vital Farms"));
        let score = matcher.score(&eggs, &listing("Vital Farms Large Eggs", "u"));
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn assignment_is_one_to_one() {
        let matcher = Matcher::default();
        let products = vec![
            product("Whole Milk", None),
            product("Whole Milk Gallon", None),
        ];
        let listings = vec![listing("Whole Milk Gallon", "gallon")];
        let matches = matcher.assign(&products, &listings);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].product_index, 1, "exact title wins the listing");
        assert_eq!(matches[0].listing_index, 0);
    }

    #[test]
    fn ties_resolve_to_earlier_product() {
        let matcher = Matcher::default();
        let products = vec![product("Whole Milk", None), product("whole milk", None)];
        let listings = vec![listing("Whole Milk", "a"), listing("Whole Milk", "b")];
        let matches = matcher.assign(&products, &listings);
        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].product_index, matches[0].listing_index), (0, 0));
        assert_eq!((matches[1].product_index, matches[1].listing_index), (1, 1));
    }

    #[test]
    fn equal_scores_prefer_smallest_listing_url() {
        let matcher = Matcher::default();
        let products = vec![product("Whole Milk", None)];
        let listings = vec![
            listing("Whole Milk", "https://shop.example/z"),
            listing("Whole Milk", "https://shop.example/a"),
        ];
        let matches = matcher.assign(&products, &listings);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].listing_index, 1);
    }

    #[test]
    fn enrich_copies_listing_fields_and_rejects_bad_rating() {
        let matcher = Matcher::default();
        let mut products = vec![
            ProductRecord {
                price: Some(Decimal::new(919, 2)),
                ..product("Organic Reduced Fat Milk", Some("Good & Gather"))
            },
            product("Sourdough Bread", None),
        ];
        let listings = vec![ShoppingListing {
            title: "Good & Gather Organic Reduced Fat Milk".to_owned(),
            url: "https://www.target.com/p/milk".to_owned(),
            image_url: Some("https://img.example/milk.jpg".to_owned()),
            rating: Some(7.5),
            reviews_count: Some(120),
            ..ShoppingListing::default()
        }];

        let enriched = matcher.enrich(&mut products, &listings);

        assert_eq!(enriched, 1);
        let milk = &products[0];
        assert_eq!(milk.product_url.as_deref(), Some("https://www.target.com/p/milk"));
        assert_eq!(milk.image_url.as_deref(), Some("https://img.example/milk.jpg"));
        assert_eq!(milk.rating, None, "out-of-range rating is dropped");
        assert_eq!(milk.reviews_count, Some(120));
        assert_eq!(milk.price, Some(Decimal::new(919, 2)), "AI fields are kept");
        assert!(!products[1].is_enriched());
    }
}
