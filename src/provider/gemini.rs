use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ImageProvider, ProviderOutcome, ProviderRequest};

const GEMINI_API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
const QUOTA_EXHAUSTED_STATUS: &str = "RESOURCE_EXHAUSTED";
const ERROR_TEXT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ContentPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    status: Option<String>,
}

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    api_root: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            api_root: GEMINI_API_ROOT.to_string(),
        })
    }

    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_root.trim_end_matches('/'),
            self.model
        )
    }
}

fn build_payload(request: &ProviderRequest) -> Value {
    let mut parts = vec![json!({ "text": request.instructions })];
    for image in &request.images {
        parts.push(json!({ "text": format!("Image: {}", image.label) }));
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": general_purpose::STANDARD.encode(&image.data),
            }
        }));
    }
    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": { "aspectRatio": request.aspect_ratio },
        },
    })
}

fn truncate(text: &str) -> String {
    text.chars().take(ERROR_TEXT_LIMIT).collect()
}

/// Rate limits and exhausted quota are retryable; every other error status is fatal.
fn classify_error(status: StatusCode, body: &str) -> ProviderOutcome {
    let api_error = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);
    let quota_exhausted = api_error
        .as_ref()
        .and_then(|err| err.status.as_deref())
        .is_some_and(|value| value == QUOTA_EXHAUSTED_STATUS);
    let detail = api_error
        .and_then(|err| err.message)
        .unwrap_or_else(|| truncate(body));
    let reason = format!("Gemini request failed: {status} {detail}");
    if status == StatusCode::TOO_MANY_REQUESTS || quota_exhausted {
        ProviderOutcome::Retryable(reason)
    } else {
        ProviderOutcome::Fatal(reason)
    }
}

/// First inline image in the response, or a fatal outcome carrying any text
/// the model returned instead.
fn extract_image(response: GenerateContentResponse) -> ProviderOutcome {
    let mut texts = Vec::new();
    let parts = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts.unwrap_or_default());
    for part in parts {
        if let Some(inline) = part.inline_data {
            if !inline.mime_type.starts_with("image/") {
                continue;
            }
            return match general_purpose::STANDARD.decode(inline.data) {
                Ok(bytes) => ProviderOutcome::Success(bytes),
                Err(err) => ProviderOutcome::Fatal(format!("invalid image payload: {err}")),
            };
        }
        if let Some(text) = part.text {
            texts.push(text);
        }
    }
    ProviderOutcome::Fatal(format!(
        "No image returned. Text: {}",
        truncate(texts.join("\n").trim())
    ))
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &ProviderRequest) -> ProviderOutcome {
        let payload = build_payload(request);
        tracing::debug!(model = %self.model, images = request.images.len(), "calling Gemini");
        let response = match self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return ProviderOutcome::Retryable(format!("Gemini request timed out: {err}"));
            }
            Err(err) => return ProviderOutcome::Fatal(format!("Gemini request failed: {err}")),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return classify_error(status, &body);
        }
        match response.json::<GenerateContentResponse>().await {
            Ok(parsed) => extract_image(parsed),
            Err(err) if err.is_timeout() => {
                ProviderOutcome::Retryable(format!("Gemini response timed out: {err}"))
            }
            Err(err) => ProviderOutcome::Fatal(format!("invalid Gemini response: {err}")),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
