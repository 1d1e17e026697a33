//! Offline demo recognizer
//!
//! Cycles through a fixed list of foods, ignoring the image. Used when no
//! API key is configured so the rest of the pipeline stays usable.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Recognition, RecognitionError, RecognitionRequest, Recognizer};

const DEMO_FOODS: &[(&str, &str, f64)] = &[
    ("apple", "fruit", 0.92),
    ("banana", "fruit", 0.88),
    ("orange", "fruit", 0.85),
    ("chicken", "meat", 0.91),
    ("beef", "meat", 0.87),
    ("salmon", "seafood", 0.89),
    ("broccoli", "vegetable", 0.83),
    ("carrot", "vegetable", 0.86),
    ("potato", "vegetable", 0.84),
    ("bread", "grain", 0.81),
    ("cheese", "dairy", 0.88),
    ("egg", "dairy", 0.85),
    ("blueberry", "fruit", 0.90),
    ("tomato", "vegetable", 0.87),
    ("rice", "grain", 0.85),
];

#[derive(Debug, Default)]
pub struct DemoRecognizer {
    next: AtomicUsize,
}

impl DemoRecognizer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Recognizer for DemoRecognizer {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition, RecognitionError> {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % DEMO_FOODS.len();
        let (food_name, category, confidence) = DEMO_FOODS[i];

        Ok(Recognition {
            food_name: food_name.to_string(),
            category: category.to_string(),
            confidence,
            description: "Demo recognition result".to_string(),
            estimated_weight_grams: request.known_weight_grams,
            ingredients: vec![food_name.to_string()],
            processing_ms: 0,
            raw_response: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cycles_and_wraps() {
        let r = DemoRecognizer::new();
        let req = RecognitionRequest::default();

        let first = r.recognize(&req).await.unwrap();
        assert_eq!(first.food_name, "apple");
        assert_eq!(r.recognize(&req).await.unwrap().food_name, "banana");

        for _ in 2..DEMO_FOODS.len() {
            r.recognize(&req).await.unwrap();
        }
        assert_eq!(r.recognize(&req).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_echoes_known_weight() {
        let r = DemoRecognizer::new();
        let req = RecognitionRequest { known_weight_grams: Some(123.0), ..Default::default() };
        assert_eq!(r.recognize(&req).await.unwrap().estimated_weight_grams, Some(123.0));
    }

    #[test]
    fn test_demo_foods_are_in_the_table() {
        for (food, _, _) in DEMO_FOODS {
            assert!(crate::emissions::lookup(food).is_some(), "{} missing", food);
        }
    }
}
