use super::*;

fn synonyms() -> ServiceSynonyms {
    ServiceSynonyms::builtin()
}

const LABELED_REPLY: &str = "\
STORE: Jewel-Osco
ADDRESS: 1224 S Wabash Ave, Chicago, IL 60605
PHONE: (312) 555-0100
WEBSITE: https://local.jewelosco.com/il/chicago/1224-s-wabash-ave.html
SERVICES: Delivery, Pickup and Curbside
FEATURES: Pharmacy, Bakery, Starbucks, Redbox kiosk
HOURS:
- Monday-Friday: 6:00 AM - 11:00 PM
- Saturday: 7:00 AM - 10:00 PM
- Sunday: Closed
";

#[test]
fn labeled_reply_fills_every_field() {
    let details = parse_store_details(LABELED_REPLY, &synonyms());

    assert_eq!(
        details.address.as_deref(),
        Some("1224 S Wabash Ave, Chicago, IL 60605")
    );
    assert_eq!(details.phone.as_deref(), Some("312-555-0100"));
    assert_eq!(
        details.website.as_deref(),
        Some("https://local.jewelosco.com/il/chicago/1224-s-wabash-ave.html")
    );
    assert_eq!(
        details.services,
        vec![ServiceTag::Delivery, ServiceTag::Pickup, ServiceTag::Curbside]
    );
    assert_eq!(
        details.features,
        vec!["pharmacy", "bakery", "cafe", "redbox kiosk"]
    );

    assert_eq!(details.hours.len(), 7);
    assert_eq!(details.hours[&Weekday::Monday], "6:00 AM - 11:00 PM");
    assert_eq!(details.hours[&Weekday::Friday], "6:00 AM - 11:00 PM");
    assert_eq!(details.hours[&Weekday::Saturday], "7:00 AM - 10:00 PM");
    assert_eq!(details.hours[&Weekday::Sunday], "Closed");
}

#[test]
fn inline_hours_cover_ranges_lists_and_weekends() {
    let details = parse_store_details(
        "HOURS: Mon, Wed: 9am-5pm; Tue-Thu 10am-6pm; weekends 8 a.m. to 8 p.m.",
        &synonyms(),
    );
    assert_eq!(details.hours[&Weekday::Monday], "9am-5pm");
    assert_eq!(details.hours[&Weekday::Wednesday], "9am-5pm", "first value wins");
    assert_eq!(details.hours[&Weekday::Tuesday], "10am-6pm");
    assert_eq!(details.hours[&Weekday::Thursday], "10am-6pm");
    assert_eq!(details.hours[&Weekday::Saturday], "8 a.m. to 8 p.m.");
    assert_eq!(details.hours[&Weekday::Sunday], "8 a.m. to 8 p.m.");
    assert!(!details.hours.contains_key(&Weekday::Friday));
}

#[test]
fn labeled_hours_without_days_apply_to_the_whole_week() {
    let details = parse_store_details("Hours: 7 AM - 10 PM", &synonyms());
    assert_eq!(details.hours.len(), 7);
    assert!(details.hours.values().all(|h| h == "7 AM - 10 PM"));

    let always = parse_store_details("STORE HOURS: Open 24 hours", &synonyms());
    assert_eq!(always.hours[&Weekday::Wednesday], "Open 24 hours");
}

#[test]
fn day_ranges_wrap_past_sunday() {
    let details = parse_store_details("Sat-Mon: 9 AM - 6 PM", &synonyms());
    let days: Vec<Weekday> = details.hours.keys().copied().collect();
    assert_eq!(
        days,
        vec![Weekday::Monday, Weekday::Saturday, Weekday::Sunday]
    );
}

#[test]
fn prose_reply_is_scanned_line_by_line() {
    let text = "\
The Whole Foods Market at 1101 S Canal St, Chicago, IL 60607 is open daily from 8 AM to 10 PM.
You can reach the store at 312.555.0199 or visit www.wholefoodsmarket.com.
It offers curbside pickup and delivery, and has a bakery, a hot bar, and a full deli.
";
    let details = parse_store_details(text, &synonyms());

    assert_eq!(details.hours.len(), 7);
    assert_eq!(details.hours[&Weekday::Tuesday], "8 AM to 10 PM");
    assert_eq!(details.phone.as_deref(), Some("312-555-0199"));
    assert_eq!(
        details.website.as_deref(),
        Some("https://www.wholefoodsmarket.com")
    );
    assert_eq!(
        details.services,
        vec![ServiceTag::Curbside, ServiceTag::Delivery]
    );
    assert_eq!(details.features, vec!["bakery", "prepared foods", "deli"]);
}

#[test]
fn street_address_found_in_an_unlabeled_line() {
    let details = parse_store_details(
        "Located at 333 E Benton Pl, Chicago, IL 60601 near the river",
        &synonyms(),
    );
    assert_eq!(
        details.address.as_deref(),
        Some("333 E Benton Pl, Chicago, IL 60601 near the river")
    );
}

#[test]
fn placeholders_and_unhelpful_replies_are_empty() {
    let details = parse_store_details(
        "STORE: [Store Name]\nPHONE: N/A\nHOURS: varies\nI could not find details for that store.",
        &synonyms(),
    );
    assert!(details.is_empty(), "{details:?}");
}
