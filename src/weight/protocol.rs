//! Scale/display line protocol
//!
//! Colon-separated text, one message per line.
//!
//! Inbound from the scale:
//! - `WEIGHT:<grams>:<STABLE|CHANGING>`
//! - `STATUS:...`, `MSG:...`, `ERROR:...` (informational)
//!
//! Outbound to the display:
//! - `AI_RESULT:<food>:<confidence %>:<weight g>:<co2 g>:<impact>`

use super::WeightReading;
use crate::emissions::EmissionResult;

/// A classified inbound line
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    Weight(WeightReading),
    Status(String),
    Log(String),
    Error(String),
    /// Malformed or unrecognized line
    Unknown(String),
}

/// Classify one inbound line
pub fn parse_line(line: &str) -> DeviceMessage {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("WEIGHT:") {
        let mut parts = rest.split(':');
        let grams = parts.next().and_then(|g| g.trim().parse::<f64>().ok());
        let stability = parts.next().map(|s| s.trim().to_uppercase());

        return match (grams, stability) {
            (Some(grams), Some(stability)) if grams.is_finite() => {
                DeviceMessage::Weight(WeightReading::new(grams, stability == "STABLE"))
            }
            _ => DeviceMessage::Unknown(line.to_string()),
        };
    }

    if let Some(rest) = line.strip_prefix("STATUS:") {
        return DeviceMessage::Status(rest.to_string());
    }
    if let Some(rest) = line.strip_prefix("MSG:") {
        return DeviceMessage::Log(rest.to_string());
    }
    if let Some(rest) = line.strip_prefix("ERROR:") {
        return DeviceMessage::Error(rest.to_string());
    }

    DeviceMessage::Unknown(line.to_string())
}

/// Format the result line sent to the display
///
/// Recognition confidence in 0..=1 is shown as a percentage; the field
/// separator is stripped from the food name.
pub fn format_result_message(
    food_name: &str,
    recognition_confidence: f64,
    weight_grams: f64,
    result: &EmissionResult,
) -> String {
    let confidence = if recognition_confidence <= 1.0 {
        recognition_confidence * 100.0
    } else {
        recognition_confidence
    };
    let food = food_name.replace(':', " ");

    format!(
        "AI_RESULT:{}:{:.1}:{:.1}:{:.1}:{}",
        food,
        confidence,
        weight_grams,
        result.total_co2_grams(),
        result.impact_level.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::calculate;

    #[test]
    fn test_parse_weight_lines() {
        match parse_line("WEIGHT:123.5:STABLE\r\n") {
            DeviceMessage::Weight(r) => {
                assert_eq!(r.grams, 123.5);
                assert!(r.stable);
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_line("WEIGHT:80.0:CHANGING") {
            DeviceMessage::Weight(r) => assert!(!r.stable),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_weight() {
        assert!(matches!(parse_line("WEIGHT:abc:STABLE"), DeviceMessage::Unknown(_)));
        assert!(matches!(parse_line("WEIGHT:12.0"), DeviceMessage::Unknown(_)));
        assert!(matches!(parse_line("WEIGHT:inf:STABLE"), DeviceMessage::Unknown(_)));
    }

    #[test]
    fn test_parse_other_lines() {
        assert_eq!(
            parse_line("STATUS:READY:MODE:AUTO:WEIGHT:0.0"),
            DeviceMessage::Status("READY:MODE:AUTO:WEIGHT:0.0".into())
        );
        assert_eq!(parse_line("MSG:LOOP:3:MONITORING"), DeviceMessage::Log("LOOP:3:MONITORING".into()));
        assert_eq!(parse_line("ERROR:SYSTEM:boom"), DeviceMessage::Error("SYSTEM:boom".into()));
        assert_eq!(parse_line("hello"), DeviceMessage::Unknown("hello".into()));
    }

    #[test]
    fn test_format_result_message() {
        let result = calculate("apple", 150.5).unwrap();
        let line = format_result_message("apple", 0.955, 150.5, &result);
        assert_eq!(line, "AI_RESULT:apple:95.5:150.5:90.3:LOW");
    }

    #[test]
    fn test_format_result_message_percent_and_separator() {
        let result = calculate("beef", 200.0).unwrap();
        let line = format_result_message("beef:steak", 92.7, 200.0, &result);
        assert_eq!(line, "AI_RESULT:beef steak:92.7:200.0:12000.0:VERY_HIGH");
    }
}
