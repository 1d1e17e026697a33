//! Gemini vision recognizer
//!
//! Sends a downscaled JPEG plus the recognition prompt to the Gemini
//! `generateContent` REST endpoint.

use std::io::Cursor;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::imageops::FilterType;
use image::ImageFormat;
use serde::Deserialize;
use serde_json::json;

use super::{
    adjust_for_known_weight, build_prompt, parse_response, Recognition, RecognitionError,
    RecognitionRequest, Recognizer,
};
use crate::config::AiConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Decode, shrink to fit `max_width` x `max_height`, and re-encode as JPEG
pub fn prepare_image(bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>, RecognitionError> {
    let mut img = image::load_from_memory(bytes)?;

    if img.width() > max_width || img.height() > max_height {
        img = img.resize(max_width, max_height, FilterType::Lanczos3);
    }

    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}

/// Recognizer backed by the Gemini API
pub struct GeminiRecognizer {
    client: reqwest::Client,
    config: AiConfig,
}

impl GeminiRecognizer {
    pub fn new(config: AiConfig) -> Result<Self, RecognitionError> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(RecognitionError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let model = self.config.model_name.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", API_BASE, model)
    }

    async fn generate(&self, prompt: &str, jpeg_base64: &str) -> Result<String, RecognitionError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": "image/jpeg", "data": jpeg_base64 } }
                ]
            }],
            "generationConfig": { "temperature": 0.1 }
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Api { status: status.as_u16(), body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.text().ok_or(RecognitionError::EmptyResponse)
    }

    /// Call the API, backing off between retryable failures
    async fn generate_with_retry(&self, prompt: &str, jpeg_base64: &str) -> Result<String, RecognitionError> {
        retry_with_backoff(
            self.config.max_retries.max(1),
            Duration::from_millis(self.config.retry_delay_ms),
            || self.generate(prompt, jpeg_base64),
        )
        .await
    }
}

/// Run `op` up to `attempts` times, doubling the delay after each retryable
/// failure. Non-retryable errors are returned at once.
async fn retry_with_backoff<T, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, RecognitionError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RecognitionError>>,
{
    let mut delay = base_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && e.is_retryable() => {
                tracing::warn!(attempt, attempts, error = %e, "Gemini call failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[async_trait]
impl Recognizer for GeminiRecognizer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition, RecognitionError> {
        let start = Instant::now();

        let jpeg = prepare_image(
            &request.image,
            self.config.image_max_width,
            self.config.image_max_height,
        )?;
        let prompt = build_prompt(request.known_weight_grams, request.context.as_deref());

        let text = self.generate_with_retry(&prompt, &BASE64.encode(jpeg)).await?;
        let recognition = parse_response(&text, start.elapsed().as_millis() as u64);
        let recognition = adjust_for_known_weight(
            recognition,
            request.known_weight_grams,
            self.config.confidence_threshold,
        );

        tracing::info!(
            food = %recognition.food_name,
            confidence = recognition.confidence,
            ms = recognition.processing_ms,
            "Food recognized"
        );
        Ok(recognition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_prepare_image_downscales() {
        let jpeg = prepare_image(&png(1600, 1200), 800, 600).unwrap();
        let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[test]
    fn test_prepare_image_keeps_small_images() {
        let jpeg = prepare_image(&png(320, 240), 800, 600).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_prepare_image_rejects_garbage() {
        assert!(matches!(
            prepare_image(b"not an image", 800, 600),
            Err(RecognitionError::Image(_))
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = AiConfig { api_key: None, ..AiConfig::default() };
        assert!(matches!(GeminiRecognizer::new(config), Err(RecognitionError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_strips_models_prefix() {
        let config = AiConfig {
            api_key: Some("k".into()),
            model_name: "models/gemini-2.0-flash".into(),
            ..AiConfig::default()
        };
        let r = GeminiRecognizer::new(config).unwrap();
        assert!(r.endpoint().ends_with("/models/gemini-2.0-flash:generateContent"));
    }

    #[test]
    fn test_response_text() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"food_name\":"},{"text":"\"rice\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some(r#"{"food_name":"rice"}"#));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }

    fn counted(
        calls: &AtomicUsize,
        fail_with: impl Fn(usize) -> Option<u16>,
    ) -> impl std::future::Future<Output = Result<&'static str, RecognitionError>> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        let result = match fail_with(n) {
            Some(status) => Err(RecognitionError::Api { status, body: String::new() }),
            None => Ok("ok"),
        };
        async move { result }
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(3, Duration::ZERO, || counted(&calls, |_| Some(400))).await;
        assert!(matches!(result, Err(RecognitionError::Api { status: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(3, Duration::ZERO, || {
            counted(&calls, |n| (n == 1).then_some(503))
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_all_attempts() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(4, Duration::ZERO, || counted(&calls, |_| Some(503))).await;
        assert!(matches!(result, Err(RecognitionError::Api { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
