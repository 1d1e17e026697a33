//! Vision model response parsing
//!
//! Models wrap their JSON in prose or code fences and are loose about types,
//! so parsing is lenient and always produces a [`Recognition`].

use serde::Deserialize;
use serde_json::Value;

use super::Recognition;

const DEFAULT_CONFIDENCE: f64 = 0.5;
const UNKNOWN_FOOD: &str = "Unknown Food";
const UNKNOWN_CATEGORY: &str = "Unknown";

/// Loosely typed model output
#[derive(Debug, Default, Deserialize)]
struct WireRecognition {
    food_name: Option<String>,
    category: Option<String>,
    confidence: Option<Value>,
    description: Option<String>,
    estimated_weight: Option<Value>,
    ingredients: Option<Value>,
}

/// Pull the JSON object out of a model reply
///
/// Prefers a ```json fenced block, then the first balanced `{...}`, and
/// otherwise returns the input unchanged.
pub fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            if let Some(obj) = first_object(&body[..end]) {
                return obj;
            }
        }
    }

    first_object(text).unwrap_or(text)
}

/// First balanced brace-delimited object, skipping braces inside strings
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First number appearing in a value ("about 150g" -> 150.0)
fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let digits: String = s[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.trim_end_matches('.').parse().ok()
        }
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_CONFIDENCE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Parse a model reply into a [`Recognition`]
pub fn parse_response(text: &str, processing_ms: u64) -> Recognition {
    let json = extract_json(text);

    match serde_json::from_str::<WireRecognition>(json) {
        Ok(wire) => Recognition {
            food_name: wire
                .food_name
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_FOOD.to_string()),
            category: wire.category.unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            confidence: clamp_confidence(
                wire.confidence.as_ref().and_then(number_from).unwrap_or(DEFAULT_CONFIDENCE),
            ),
            description: wire.description.unwrap_or_default(),
            estimated_weight_grams: wire.estimated_weight.as_ref().and_then(number_from),
            ingredients: wire.ingredients.as_ref().map(string_list).unwrap_or_default(),
            processing_ms,
            raw_response: text.to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Response was not valid JSON, falling back to text parsing");
            tracing::debug!(raw = text, "Unparsed vision response");
            parse_text(text, processing_ms)
        }
    }
}

/// Line-based fallback: looks for `name:` and `category:` lines
fn parse_text(text: &str, processing_ms: u64) -> Recognition {
    let mut food_name = UNKNOWN_FOOD.to_string();
    let mut category = UNKNOWN_CATEGORY.to_string();

    for line in text.lines().map(str::trim) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.to_lowercase();
        let value = value.trim().trim_matches(|c| c == '"' || c == ',').trim();
        if value.is_empty() {
            continue;
        }
        if key.contains("name") {
            food_name = value.to_string();
        } else if key.contains("category") {
            category = value.to_string();
        }
    }

    Recognition {
        food_name,
        category,
        confidence: DEFAULT_CONFIDENCE,
        description: text.chars().take(200).collect(),
        estimated_weight_grams: None,
        ingredients: Vec::new(),
        processing_ms,
        raw_response: text.to_string(),
    }
}

/// Reconcile a recognition with a measured weight
///
/// A model weight estimate far from the scale reading lowers confidence
/// (over 50% off: x0.7, over 30% off: x0.9); the estimate is then replaced by
/// the measured weight.
pub fn adjust_for_known_weight(
    mut recognition: Recognition,
    known_weight_grams: Option<f64>,
    confidence_threshold: f64,
) -> Recognition {
    if let (Some(known), Some(estimated)) = (known_weight_grams, recognition.estimated_weight_grams) {
        let ratio = (estimated - known).abs() / known.max(1.0);
        if ratio > 0.5 {
            recognition.confidence *= 0.7;
        } else if ratio > 0.3 {
            recognition.confidence *= 0.9;
        }
        recognition.estimated_weight_grams = Some(known);
    }

    if recognition.confidence < confidence_threshold {
        tracing::warn!(
            food = %recognition.food_name,
            confidence = recognition.confidence,
            "Low recognition confidence"
        );
    }

    recognition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_json() {
        let text = "Here you go:\n```json\n{\"food_name\": \"apple\"}\n```\nDone.";
        assert_eq!(extract_json(text), "{\"food_name\": \"apple\"}");
    }

    #[test]
    fn test_extract_bare_object_with_nesting() {
        let text = r#"Result: {"food_name": "rice", "extra": {"a": "}"}} trailing"#;
        assert_eq!(
            extract_json(text),
            r#"{"food_name": "rice", "extra": {"a": "}"}}"#
        );
    }

    #[test]
    fn test_extract_without_json_returns_input() {
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn test_parse_full_response() {
        let text = r#"```json
{"food_name": "Beef", "category": "meat", "confidence": 0.92,
 "description": "steak", "estimated_weight": "about 200g",
 "ingredients": "beef, salt"}
```"#;
        let r = parse_response(text, 12);
        assert_eq!(r.food_name, "Beef");
        assert_eq!(r.category, "meat");
        assert_eq!(r.confidence, 0.92);
        assert_eq!(r.estimated_weight_grams, Some(200.0));
        assert_eq!(r.ingredients, vec!["beef", "salt"]);
        assert_eq!(r.processing_ms, 12);
    }

    #[test]
    fn test_confidence_clamped() {
        let r = parse_response(r#"{"food_name": "apple", "confidence": 1.7}"#, 0);
        assert_eq!(r.confidence, 1.0);
        let r = parse_response(r#"{"food_name": "apple", "confidence": -0.2}"#, 0);
        assert_eq!(r.confidence, 0.0);
        let r = parse_response(r#"{"food_name": "apple"}"#, 0);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn test_text_fallback() {
        let text = "Food name: Banana\nCategory: fruit\nLooks ripe";
        let r = parse_response(text, 3);
        assert_eq!(r.food_name, "Banana");
        assert_eq!(r.category, "fruit");
        assert_eq!(r.confidence, 0.5);
        assert!(r.estimated_weight_grams.is_none());
    }

    #[test]
    fn test_weight_disagreement_lowers_confidence() {
        let base = parse_response(r#"{"food_name": "apple", "confidence": 1.0, "estimated_weight": 100}"#, 0);

        let far = adjust_for_known_weight(base.clone(), Some(250.0), 0.7);
        assert!((far.confidence - 0.7).abs() < 1e-9);
        assert_eq!(far.estimated_weight_grams, Some(250.0));

        let near = adjust_for_known_weight(base.clone(), Some(150.0), 0.7);
        assert!((near.confidence - 0.9).abs() < 1e-9);

        let close = adjust_for_known_weight(base.clone(), Some(110.0), 0.7);
        assert_eq!(close.confidence, 1.0);

        let unknown = adjust_for_known_weight(base, None, 0.7);
        assert_eq!(unknown.estimated_weight_grams, Some(100.0));
    }
}
