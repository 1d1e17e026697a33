//! Image Analysis Tool
//!
//! Recognize a food photo, resolve its weight, and compute the footprint.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::HardwareConfig;
use crate::db::Database;
use crate::emissions::{self, EmissionResult};
use crate::models::{Analysis, AnalysisCreate};
use crate::recognition::{Recognition, RecognitionRequest, Recognizer};
use crate::weight::{format_result_message, DisplaySink, ReceiverStats, WeightReading, WeightSource};

use super::emissions::default_factor_warning;

/// Where the weight used for a calculation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightOrigin {
    Argument,
    Scale,
    Estimate,
}

/// Response for analyze_food_image
#[derive(Debug, Serialize)]
pub struct AnalyzeFoodResponse {
    pub recognizer: &'static str,
    pub recognition: Recognition,
    /// Table key the recognized label was mapped to
    pub food_id: String,
    pub weight_grams: f64,
    pub weight_origin: WeightOrigin,
    pub result: EmissionResult,
    /// Line in the format the scale display expects
    pub display_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_analysis_id: Option<i64>,
    pub warnings: Vec<String>,
}

/// Scale state reported by the status tool
#[derive(Debug, Clone, Serialize)]
pub struct ScaleStatus {
    pub latest: Option<WeightReading>,
    /// Stable and above the auto-trigger weight
    pub ready_for_analysis: bool,
    pub display_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<ReceiverStats>,
}

/// Ties a recognizer, an optional scale and its display to the calculator
pub struct FoodAnalyzer {
    recognizer: Arc<dyn Recognizer>,
    weight_source: Option<Arc<dyn WeightSource>>,
    display: Option<Arc<dyn DisplaySink>>,
    hardware: HardwareConfig,
    confidence_threshold: f64,
}

impl FoodAnalyzer {
    pub fn new(recognizer: Arc<dyn Recognizer>, hardware: HardwareConfig, confidence_threshold: f64) -> Self {
        Self {
            recognizer,
            weight_source: None,
            display: None,
            hardware,
            confidence_threshold,
        }
    }

    pub fn with_weight_source(mut self, source: Arc<dyn WeightSource>) -> Self {
        self.weight_source = Some(source);
        self
    }

    pub fn with_display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// None when no scale is connected
    pub fn scale_status(&self) -> Option<ScaleStatus> {
        let source = self.weight_source.as_ref()?;
        let latest = source.latest();
        Some(ScaleStatus {
            ready_for_analysis: latest
                .as_ref()
                .map_or(false, |r| r.ready_for_analysis(self.hardware.auto_trigger_grams)),
            latest,
            display_connected: self.display.is_some(),
            link: source.stats(),
        })
    }

    /// Latest scale reading, if it is stable and inside the usable range
    pub fn scale_weight(&self) -> Option<f64> {
        let reading = self.weight_source.as_ref()?.latest()?;
        if !reading.stable {
            tracing::debug!(grams = reading.grams, "Ignoring unsettled reading");
            return None;
        }
        if reading.grams < self.hardware.min_weight_grams {
            tracing::debug!(grams = reading.grams, "Ignoring reading below minimum weight");
            return None;
        }
        if reading.grams > self.hardware.max_capacity_grams {
            tracing::warn!(grams = reading.grams, "Ignoring reading above scale capacity");
            return None;
        }
        Some(reading.grams)
    }

    /// Run the full pipeline on image bytes
    pub async fn analyze(
        &self,
        db: &Database,
        image: Vec<u8>,
        weight_grams: Option<f64>,
        context: Option<String>,
        save: bool,
    ) -> Result<AnalyzeFoodResponse, String> {
        let known = match weight_grams {
            Some(w) => Some((w, WeightOrigin::Argument)),
            None => self.scale_weight().map(|w| (w, WeightOrigin::Scale)),
        };

        let request = RecognitionRequest {
            image,
            known_weight_grams: known.map(|(w, _)| w),
            context,
        };
        let recognition = self
            .recognizer
            .recognize(&request)
            .await
            .map_err(|e| format!("Recognition failed: {}", e))?;

        let (weight_grams, weight_origin) = known
            .or_else(|| {
                recognition
                    .estimated_weight_grams
                    .map(|w| (w, WeightOrigin::Estimate))
            })
            .ok_or_else(|| {
                "No weight available: pass weight_grams or connect a scale".to_string()
            })?;

        let food_id = emissions::map_food_name(&recognition.food_name);
        let result = emissions::calculate(&food_id, weight_grams).map_err(|e| e.to_string())?;

        let mut warnings = Vec::new();
        if recognition.confidence < self.confidence_threshold {
            warnings.push(format!(
                "Low recognition confidence ({:.0}%); check the label '{}'",
                recognition.confidence * 100.0,
                recognition.food_name
            ));
        }
        if weight_origin == WeightOrigin::Estimate {
            warnings.push("Weight is the recognizer's visual estimate".to_string());
        }
        warnings.extend(default_factor_warning(&result));

        let saved_analysis_id = if save {
            let data = AnalysisCreate::from_result(result.clone(), weight_grams)
                .with_recognition(&recognition.food_name, recognition.confidence);
            let saved = db
                .with_conn(|conn| Analysis::create(conn, &data))
                .map_err(|e| format!("Failed to save analysis: {}", e))?;
            Some(saved.id)
        } else {
            None
        };

        tracing::info!(
            food = %food_id,
            grams = weight_grams,
            co2_kg = result.total_co2_kg,
            recognizer = self.recognizer.name(),
            "Analyzed food image"
        );

        let display_message =
            format_result_message(&food_id, recognition.confidence, weight_grams, &result);
        if let Some(display) = &self.display {
            if let Err(e) = display.send_line(&display_message) {
                tracing::warn!(error = %e, "Failed to send result to the scale display");
            }
        }

        Ok(AnalyzeFoodResponse {
            recognizer: self.recognizer.name(),
            display_message,
            recognition,
            food_id,
            weight_grams,
            weight_origin,
            result,
            saved_analysis_id,
            warnings,
        })
    }

    /// Read an image file and analyze it
    pub async fn analyze_file(
        &self,
        db: &Database,
        image_path: &Path,
        weight_grams: Option<f64>,
        context: Option<String>,
        save: bool,
    ) -> Result<AnalyzeFoodResponse, String> {
        let image = tokio::fs::read(image_path)
            .await
            .map_err(|e| format!("Failed to read image {}: {}", image_path.display(), e))?;
        self.analyze(db, image, weight_grams, context, save).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::recognition::{DemoRecognizer, RecognitionError};
    use crate::weight::{FixedWeight, LineDisplay};
    use std::io;
    use async_trait::async_trait;

    struct Fixed {
        label: &'static str,
        confidence: f64,
        estimate: Option<f64>,
    }

    #[async_trait]
    impl Recognizer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn recognize(&self, _request: &RecognitionRequest) -> Result<Recognition, RecognitionError> {
            Ok(Recognition {
                food_name: self.label.to_string(),
                category: "unknown".to_string(),
                confidence: self.confidence,
                description: String::new(),
                estimated_weight_grams: self.estimate,
                ingredients: Vec::new(),
                processing_ms: 0,
                raw_response: String::new(),
            })
        }
    }

    fn test_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    fn analyzer(recognizer: impl Recognizer + 'static) -> FoodAnalyzer {
        FoodAnalyzer::new(Arc::new(recognizer), HardwareConfig::default(), 0.7)
    }

    #[tokio::test]
    async fn test_explicit_weight_wins() {
        let db = test_db();
        let a = analyzer(DemoRecognizer::new()).with_weight_source(Arc::new(FixedWeight(300.0)));

        let resp = a.analyze(&db, vec![1, 2, 3], Some(150.0), None, true).await.unwrap();
        assert_eq!(resp.recognizer, "demo");
        assert_eq!(resp.food_id, "apple");
        assert_eq!(resp.weight_origin, WeightOrigin::Argument);
        assert!((resp.result.total_co2_kg - 0.09).abs() < 1e-9);
        assert_eq!(resp.display_message, "AI_RESULT:apple:92.0:150.0:90.0:LOW");
        assert!(resp.warnings.is_empty());

        let saved = db
            .with_conn(|conn| Analysis::get_by_id(conn, resp.saved_analysis_id.unwrap()))
            .unwrap()
            .unwrap();
        assert_eq!(saved.raw_label.as_deref(), Some("apple"));
        assert_eq!(saved.recognition_confidence, Some(0.92));
    }

    struct Unsettled;

    impl WeightSource for Unsettled {
        fn latest(&self) -> Option<WeightReading> {
            Some(WeightReading::new(300.0, false))
        }
    }

    struct BrokenDisplay;

    impl DisplaySink for BrokenDisplay {
        fn send_line(&self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[tokio::test]
    async fn test_result_line_sent_to_display() {
        let db = test_db();
        let display = Arc::new(LineDisplay::new(Vec::new()));
        let a = analyzer(DemoRecognizer::new()).with_display(display.clone());

        a.analyze(&db, Vec::new(), Some(150.0), None, false).await.unwrap();
        drop(a);

        let written = Arc::try_unwrap(display).ok().unwrap().into_inner();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "AI_RESULT:apple:92.0:150.0:90.0:LOW\n"
        );
    }

    #[tokio::test]
    async fn test_display_failure_does_not_fail_analysis() {
        let db = test_db();
        let a = analyzer(DemoRecognizer::new()).with_display(Arc::new(BrokenDisplay));
        let resp = a.analyze(&db, Vec::new(), Some(150.0), None, true).await.unwrap();
        assert!(resp.saved_analysis_id.is_some());
    }

    #[tokio::test]
    async fn test_unsettled_reading_is_not_used() {
        let db = test_db();
        let a = analyzer(Fixed {
            label: "rice",
            confidence: 0.9,
            estimate: Some(120.0),
        })
        .with_weight_source(Arc::new(Unsettled));

        let resp = a.analyze(&db, Vec::new(), None, None, false).await.unwrap();
        assert_eq!(resp.weight_origin, WeightOrigin::Estimate);
        assert_eq!(resp.weight_grams, 120.0);
    }

    #[test]
    fn test_scale_status() {
        let a = analyzer(DemoRecognizer::new());
        assert!(a.scale_status().is_none());

        let ready = a.with_weight_source(Arc::new(FixedWeight(120.0))).scale_status().unwrap();
        assert!(ready.ready_for_analysis);
        assert!(!ready.display_connected);
        assert!(ready.link.is_none());

        let light = analyzer(DemoRecognizer::new())
            .with_weight_source(Arc::new(FixedWeight(40.0)))
            .with_display(Arc::new(BrokenDisplay))
            .scale_status()
            .unwrap();
        assert!(!light.ready_for_analysis);
        assert!(light.display_connected);

        let unsettled = analyzer(DemoRecognizer::new())
            .with_weight_source(Arc::new(Unsettled))
            .scale_status()
            .unwrap();
        assert!(!unsettled.ready_for_analysis);
    }

    #[tokio::test]
    async fn test_scale_weight_and_name_mapping() {
        let db = test_db();
        let a = analyzer(Fixed {
            label: "Beef Steak",
            confidence: 0.9,
            estimate: Some(999.0),
        })
        .with_weight_source(Arc::new(FixedWeight(200.0)));

        let resp = a.analyze(&db, Vec::new(), None, None, false).await.unwrap();
        assert_eq!(resp.food_id, "beef");
        assert_eq!(resp.weight_origin, WeightOrigin::Scale);
        assert_eq!(resp.weight_grams, 200.0);
        assert!(resp.saved_analysis_id.is_none());
    }

    #[tokio::test]
    async fn test_light_reading_falls_back_to_estimate() {
        let db = test_db();
        let a = analyzer(Fixed {
            label: "mystery stew",
            confidence: 0.4,
            estimate: Some(250.0),
        })
        .with_weight_source(Arc::new(FixedWeight(2.0)));

        let resp = a.analyze(&db, Vec::new(), None, None, false).await.unwrap();
        assert_eq!(resp.weight_origin, WeightOrigin::Estimate);
        assert!(resp.result.used_default_factor);
        assert_eq!(resp.warnings.len(), 3);
    }

    #[tokio::test]
    async fn test_no_weight_is_an_error() {
        let db = test_db();
        let a = analyzer(DemoRecognizer::new());
        let err = a.analyze(&db, Vec::new(), None, None, true).await.unwrap_err();
        assert!(err.contains("No weight available"));
        assert_eq!(db.with_conn(Analysis::count).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let db = test_db();
        let a = analyzer(DemoRecognizer::new());
        let err = a
            .analyze_file(&db, Path::new("/nonexistent/plate.jpg"), Some(100.0), None, false)
            .await
            .unwrap_err();
        assert!(err.starts_with("Failed to read image"));
    }

    #[test]
    fn test_scale_weight_range() {
        let a = analyzer(DemoRecognizer::new());
        assert_eq!(a.scale_weight(), None);

        let a = a.with_weight_source(Arc::new(FixedWeight(6000.0)));
        assert_eq!(a.scale_weight(), None);
    }
}
