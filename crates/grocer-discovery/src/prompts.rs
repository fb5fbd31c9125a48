//! Prompt text sent to the answer engine.
//!
//! Listing prompts ask for one `LABEL: value` block per record, separated by
//! blank lines, which is the layout the structured parser reads first. The
//! store details prompt asks for a single block about one store.

pub const SYSTEM_PROMPT: &str = "You are a grocery research assistant. \
Answer with current, factual information about US grocery stores and the \
products they carry. Follow the requested output format exactly and write \
N/A for any field you cannot confirm.";

/// Prompt asking for grocery stores near `location`.
#[must_use]
pub fn store_prompt(location: &str) -> String {
    format!(
        "List the grocery stores currently operating in or near {location}.\n\
         For each store, write one block in exactly this format, with a blank \
         line between blocks:\n\
         \n\
         STORE: <store name>\n\
         ADDRESS: <street address, city, state ZIP>\n\
         SERVICES: <comma-separated list from: delivery, pickup, curbside, in-store>\n\
         WEBSITE: <store website>\n\
         PHONE: <main phone number>\n\
         HOURS: <opening hours>\n\
         STATUS: <active or inactive>\n\
         \n\
         Do not add commentary before or after the blocks."
    )
}

/// Prompt asking for products matching `query` at `store_name`.
#[must_use]
pub fn product_prompt(query: &str, store_name: &str, location: &str) -> String {
    format!(
        "Find products matching \"{query}\" sold at {store_name} in {location}.\n\
         For each product, write one block in exactly this format, with a blank \
         line between blocks:\n\
         \n\
         PRODUCT: <full product name including size>\n\
         BRAND: <brand>\n\
         PRICE: <current price in USD, e.g. $4.99>\n\
         SIZE: <package size, e.g. 64 oz>\n\
         CATEGORY: <store category>\n\
         AVAILABILITY: <in stock, out of stock, or unknown>\n\
         DESCRIPTION: <one sentence>\n\
         DEALS: <current promotion, or N/A>\n\
         \n\
         Do not include image or product links. Do not add commentary before \
         or after the blocks."
    )
}

/// Prompt asking for contact details, opening hours, and amenities of one
/// store.
#[must_use]
pub fn store_details_prompt(store_name: &str, location: &str) -> String {
    format!(
        "Give the current details of the {store_name} grocery store in {location}.\n\
         Write one block in exactly this format:\n\
         \n\
         STORE: <store name>\n\
         ADDRESS: <street address, city, state ZIP>\n\
         PHONE: <main phone number>\n\
         WEBSITE: <store website>\n\
         SERVICES: <comma-separated list from: delivery, pickup, curbside, in-store>\n\
         FEATURES: <comma-separated departments and amenities>\n\
         HOURS:\n\
         <one line per weekday with its opening and closing time>\n\
         \n\
         Do not add commentary before or after the block."
    )
}
