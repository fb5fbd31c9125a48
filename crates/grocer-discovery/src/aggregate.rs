//! Grouping of per-store product searches into cross-store offers.
//!
//! Two listings are the same product when brand, name, and size agree after
//! normalization. Brand and filler words are dropped from the name, size
//! spellings are unified (`"64 fl. oz"` and `"64 fluid ounces"` both become
//! `"64 fl oz"`), and a size written inside the name is moved out of it.

use grocer_core::{CanonicalProduct, ProductGroup, ProductOffer, ProductRecord, ProductSearch};

use crate::normalize::{normalize_size, slugify};

const FILLER_WORDS: &[&str] = &["the", "original", "brand"];

/// Groups the products of several searches by product identity.
///
/// Groups appear in the order their first listing was seen; offers inside a
/// group follow the order of `searches`. The canonical name, brand, and size
/// come from the first listing.
#[must_use]
pub fn group_offers(searches: &[ProductSearch]) -> Vec<ProductGroup> {
    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<ProductGroup> = Vec::new();

    for search in searches {
        for product in &search.products {
            let key = group_key(product);
            let index = if let Some(i) = keys.iter().position(|k| *k == key) {
                i
            } else {
                keys.push(key);
                groups.push(ProductGroup {
                    product: CanonicalProduct {
                        name: product.name.clone(),
                        brand: product.brand.clone(),
                        size: product_size(product),
                        images: Vec::new(),
                    },
                    offers: Vec::new(),
                });
                groups.len() - 1
            };

            let group = &mut groups[index];
            if let Some(image) = &product.image_url {
                if !group.product.images.contains(image) {
                    group.product.images.push(image.clone());
                }
            }
            group.offers.push(ProductOffer {
                store_id: slugify(&search.store_name),
                store_name: search.store_name.clone(),
                price: product.price,
                availability: product.availability,
                product_url: product.product_url.clone(),
                rating: product.rating,
                source: search.source,
            });
        }
    }

    groups
}

/// `brand|name|size` identity of a listing.
#[must_use]
pub fn group_key(product: &ProductRecord) -> String {
    let brand = product
        .brand
        .as_deref()
        .map(words)
        .unwrap_or_default();
    let size = product_size(product);

    let mut name = product.name.to_lowercase();
    if let Some(size) = &size {
        name = name.replace(&size.to_lowercase(), " ");
    }
    let mut name_words = words(&name);
    if !brand.is_empty() && name_words.starts_with(&brand) {
        name_words.drain(..brand.len());
    }
    name_words.retain(|w| !FILLER_WORDS.contains(&w.as_str()));

    format!(
        "{}|{}|{}",
        brand.join(" "),
        name_words.join(" "),
        size.as_deref().map(canonical_size).unwrap_or_default()
    )
}

/// Unifies unit spellings and spacing, e.g. `"12 Fl. Oz"` -> `"12 fl oz"`.
#[must_use]
pub fn canonical_size(size: &str) -> String {
    let lower = size
        .to_lowercase()
        .replace("fluid ounces", "fl oz")
        .replace("fluid ounce", "fl oz")
        .replace("fl.", "fl ")
        .replace("fl-oz", "fl oz");

    // "64oz" -> "64 oz"
    let mut spaced = String::with_capacity(lower.len() + 2);
    let mut previous: Option<char> = None;
    for c in lower.chars() {
        if previous.is_some_and(|p| p.is_ascii_digit()) && c.is_alphabetic() {
            spaced.push(' ');
        }
        spaced.push(c);
        previous = Some(c);
    }

    spaced
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .map(|t| match t.trim_end_matches('.') {
            "ounce" | "ounces" | "oz" => "oz",
            "floz" => "fl oz",
            "gallons" | "gal" => "gallon",
            "lbs" | "pounds" | "pound" => "lb",
            "ct" | "counts" => "count",
            "packs" | "pk" => "pack",
            "liters" | "liter" | "litre" | "litres" => "l",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn product_size(product: &ProductRecord) -> Option<String> {
    product
        .size
        .clone()
        .or_else(|| normalize_size(&product.name))
}

/// Lowercase words with surrounding punctuation removed; hyphens split
/// words.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',' || c == '/')
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '%' && c != '&'))
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
