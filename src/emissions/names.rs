//! Recognized-name mapping
//!
//! Vision models return free-form labels ("Grilled Steak", "Blueberries").
//! The controller maps them onto table keys before calling the calculator;
//! the table lookup itself stays exact.

use super::factors;

/// Label aliases, checked after trimming and lower-casing
const ALIASES: &[(&str, &str)] = &[
    ("red apple", "apple"),
    ("green apple", "apple"),
    ("yellow banana", "banana"),
    ("ripe banana", "banana"),
    ("orange fruit", "orange"),
    ("fresh orange", "orange"),
    ("beef steak", "beef"),
    ("steak", "beef"),
    ("ground beef", "beef"),
    ("chicken breast", "chicken"),
    ("poultry", "chicken"),
    ("fresh salmon", "salmon"),
    ("salmon fillet", "salmon"),
    ("blueberries", "blueberry"),
    ("fresh blueberry", "blueberry"),
    ("strawberries", "strawberry"),
    ("cherries", "cherry"),
    ("prawn", "shrimp"),
    ("prawns", "shrimp"),
    ("white rice", "rice"),
    ("brown rice", "rice"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("spaghetti", "pasta"),
    ("yoghurt", "yogurt"),
];

/// Map a recognizer label onto a table key where possible
///
/// Returns the cleaned (trimmed, lower-cased) label unchanged when neither an
/// alias nor a plural strip produces a known key.
pub fn map_food_name(raw: &str) -> String {
    let clean = raw.trim().to_lowercase();
    if clean.is_empty() {
        return "unknown".to_string();
    }

    if let Some((_, mapped)) = ALIASES.iter().find(|(alias, _)| *alias == clean) {
        return (*mapped).to_string();
    }

    if factors::lookup(&clean).is_some() {
        return clean;
    }

    // "apples" -> "apple", "peaches" -> "peach"
    for suffix in ["es", "s"] {
        if let Some(stem) = clean.strip_suffix(suffix) {
            if factors::lookup(stem).is_some() {
                return stem.to_string();
            }
        }
    }

    clean
}
