use chrono::{TimeZone, Utc};
use grocer_core::{Availability, Source};
use rust_decimal::Decimal;

use super::*;

fn product(name: &str, brand: Option<&str>, size: Option<&str>, cents: i64) -> ProductRecord {
    ProductRecord {
        name: name.to_owned(),
        brand: brand.map(str::to_owned),
        size: size.map(str::to_owned),
        price: Some(Decimal::new(cents, 2)),
        ..ProductRecord::default()
    }
}

fn search(store_name: &str, source: Source, products: Vec<ProductRecord>) -> ProductSearch {
    ProductSearch {
        query: "oat milk".to_owned(),
        store_name: store_name.to_owned(),
        location: "60605".to_owned(),
        products_found: products.len(),
        products,
        search_timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        source,
        cached: false,
    }
}

// -----------------------------------------------------------------------
// canonical_size
// -----------------------------------------------------------------------

#[test]
fn size_spellings_are_unified() {
    assert_eq!(canonical_size("64 fl. oz"), "64 fl oz");
    assert_eq!(canonical_size("64 Fluid Ounces"), "64 fl oz");
    assert_eq!(canonical_size("64 fl-oz"), "64 fl oz");
    assert_eq!(canonical_size("64oz"), "64 oz");
    assert_eq!(canonical_size("16 ounces"), "16 oz");
    assert_eq!(canonical_size("12ct"), "12 count");
    assert_eq!(canonical_size("6 packs"), "6 pack");
    assert_eq!(canonical_size("1 Gal"), "1 gallon");
    assert_eq!(canonical_size("2 lbs"), "2 lb");
    assert_eq!(canonical_size("12.5 fl oz"), "12.5 fl oz");
}

// -----------------------------------------------------------------------
// group_key
// -----------------------------------------------------------------------

#[test]
fn key_ignores_brand_prefix_filler_words_and_size_in_name() {
    let target = product("Oatly Original Oat Milk 64 oz", Some("Oatly"), None, 599);
    let jewel = product("The Oat Milk", Some("OATLY"), Some("64 fl. oz"), 649);
    assert_eq!(group_key(&target), "oatly|oat milk|64 oz");
    assert_eq!(group_key(&jewel), "oatly|oat milk|64 fl oz");

    let jewel_oz = product("Oat-Milk", Some("Oatly"), Some("64oz"), 649);
    assert_eq!(group_key(&target), group_key(&jewel_oz));
}

#[test]
fn key_separates_brands_and_sizes() {
    let oatly = product("Oat Milk", Some("Oatly"), Some("64 oz"), 599);
    let planet = product("Oat Milk", Some("Planet Oat"), Some("64 oz"), 499);
    let small = product("Oat Milk", Some("Oatly"), Some("32 oz"), 349);
    let unbranded = product("Oat Milk", None, Some("64 oz"), 299);
    assert_ne!(group_key(&oatly), group_key(&planet));
    assert_ne!(group_key(&oatly), group_key(&small));
    assert_ne!(group_key(&oatly), group_key(&unbranded));
    assert_eq!(group_key(&unbranded), "|oat milk|64 oz");
}

// -----------------------------------------------------------------------
// group_offers
// -----------------------------------------------------------------------

#[test]
fn offers_from_several_stores_share_one_group() {
    let mut enriched = product("Oat Milk", Some("Oatly"), Some("64oz"), 649);
    enriched.image_url = Some("https://img.example/oatly.jpg".to_owned());
    enriched.product_url = Some("https://jewel.example/oatly".to_owned());
    enriched.availability = Availability::InStock;

    let searches = vec![
        search(
            "Target",
            Source::AnswerEngine,
            vec![
                product("Oatly Oat Milk 64 oz", Some("Oatly"), None, 599),
                product("Planet Oat Original Oatmilk", Some("Planet Oat"), Some("52 oz"), 399),
            ],
        ),
        search("Jewel-Osco", Source::AnswerEngineWithEnrichment, vec![enriched]),
    ];

    let groups = group_offers(&searches);
    assert_eq!(groups.len(), 2);

    let oatly = &groups[0];
    assert_eq!(oatly.product.name, "Oatly Oat Milk 64 oz", "first listing names the group");
    assert_eq!(oatly.product.size.as_deref(), Some("64 oz"));
    assert_eq!(oatly.product.images, vec!["https://img.example/oatly.jpg"]);
    assert_eq!(oatly.offers.len(), 2);

    assert_eq!(oatly.offers[0].store_id, "target");
    assert_eq!(oatly.offers[0].price, Some(Decimal::new(599, 2)));
    assert_eq!(oatly.offers[0].source, Source::AnswerEngine);
    assert_eq!(oatly.offers[0].product_url, None);

    assert_eq!(oatly.offers[1].store_id, "jewel_osco");
    assert_eq!(oatly.offers[1].store_name, "Jewel-Osco");
    assert_eq!(oatly.offers[1].availability, Availability::InStock);
    assert_eq!(oatly.offers[1].source, Source::AnswerEngineWithEnrichment);
    assert_eq!(
        oatly.offers[1].product_url.as_deref(),
        Some("https://jewel.example/oatly")
    );

    assert_eq!(groups[1].product.brand.as_deref(), Some("Planet Oat"));
    assert_eq!(groups[1].offers.len(), 1);
}

#[test]
fn no_searches_means_no_groups() {
    assert!(group_offers(&[]).is_empty());
    assert!(group_offers(&[search("ALDI", Source::AnswerEngine, Vec::new())]).is_empty());
}
