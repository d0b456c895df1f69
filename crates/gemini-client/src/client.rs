use crate::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("request to the Gemini API failed: {0}")]
    Transport(reqwest::Error),
    #[error("Gemini API returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("could not decode Gemini response: {0}")]
    Decode(String),
    #[error("Gemini response did not contain any candidate text")]
    MissingText,
}

// The request URL carries the API key, so it is stripped before the error
// can reach a log line or the transcript.
impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::Transport(err.without_url())
    }
}

impl GeminiError {
    /// True when the service answered but not with the shape we expect.
    pub fn is_malformed(&self) -> bool {
        matches!(self, GeminiError::Decode(_) | GeminiError::MissingText)
    }
}

/// A client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn with_endpoint(api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Sends a request and decodes the body of a 2xx answer.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        tracing::debug!("Sending generateContent request to model {}", self.model);
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| "no error details".to_string());
            return Err(GeminiError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| GeminiError::Decode(e.to_string()))
    }

    /// Sends a single-turn prompt and returns the first candidate's text.
    pub async fn generate_text(
        &self,
        prompt: &str,
        generation_config: GenerationConfig,
    ) -> Result<String, GeminiError> {
        let request = GenerateContentRequest::single_turn(prompt, generation_config);
        let response = self.generate_content(&request).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or(GeminiError::MissingText)
    }
}
