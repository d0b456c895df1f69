use serde::{Deserialize, Serialize};

// Outgoing messages
#[derive(Debug, Clone, Serialize)]
pub struct RecognizeRequest {
    pub config: RecognitionConfig,
    pub audio: RecognitionAudio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,
    pub sample_rate_hertz: u32,
    pub language_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    /// Uncompressed 16-bit signed little-endian samples.
    Linear16,
}

/// Audio bytes, base64-encoded on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionAudio {
    pub content: String,
}

// Incoming messages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecognizeResponse {
    // Absent entirely when nothing was recognized.
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
}

impl RecognizeResponse {
    /// Top-ranked transcript of the first result, skipping blank ones.
    pub fn top_transcript(&self) -> Option<&str> {
        self.results
            .first()?
            .alternatives
            .first()
            .map(|alt| alt.transcript.trim())
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechRecognitionAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
