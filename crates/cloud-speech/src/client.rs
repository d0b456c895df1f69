use crate::types::{
    AudioEncoding, ErrorEnvelope, RecognitionAudio, RecognitionConfig, RecognizeRequest,
    RecognizeResponse,
};
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_BASE_URL: &str = "https://speech.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("request to the speech service failed: {0}")]
    Transport(reqwest::Error),
    #[error("speech service returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("could not decode speech service response: {0}")]
    Decode(String),
}

// An API key travels in the query string; keep the URL out of the error.
impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Transport(err.without_url())
    }
}

/// How requests are authenticated.
pub enum Credential {
    /// Sent as the `key` query parameter.
    ApiKey(SecretString),
    /// An OAuth access token minted for a service account, sent as a bearer token.
    AccessToken(SecretString),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(..)"),
            Credential::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

impl Credential {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::ApiKey(key) => request.query(&[("key", key.expose_secret())]),
            Credential::AccessToken(token) => request.bearer_auth(token.expose_secret()),
        }
    }
}

/// A client for the synchronous `speech:recognize` REST endpoint.
#[derive(Debug)]
pub struct SpeechClient {
    http: Client,
    base_url: String,
    credential: Credential,
}

impl SpeechClient {
    pub fn with_base_url(credential: Credential, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// Transcribes mono LINEAR16 (16-bit little-endian) PCM.
    pub async fn recognize_linear16(
        &self,
        pcm: &[u8],
        sample_rate_hertz: u32,
        language_code: &str,
    ) -> Result<RecognizeResponse, SpeechError> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: AudioEncoding::Linear16,
                sample_rate_hertz,
                language_code: language_code.to_string(),
            },
            audio: RecognitionAudio {
                content: general_purpose::STANDARD.encode(pcm),
            },
        };
        tracing::debug!(
            "Sending {} bytes of audio at {} Hz for recognition ({})",
            pcm.len(),
            sample_rate_hertz,
            language_code
        );

        let builder = self
            .http
            .post(format!("{}/v1/speech:recognize", self.base_url))
            .json(&request);
        let response = self.credential.apply(builder).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| "no error details".to_string());
            return Err(SpeechError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| SpeechError::Decode(e.to_string()))
    }
}
