use async_trait::async_trait;
use chatbot_core::{AdapterError, FileTranscription, Outcome};
use cloud_speech::SpeechClient;
use std::sync::Arc;

/// Transcribes uploaded audio. The bytes are treated as an opaque LINEAR16
/// payload at the configured sample rate and are not decoded or resampled.
pub struct FileSpeechAdapter {
    client: Arc<SpeechClient>,
    language_code: String,
    sample_rate: u32,
}

impl FileSpeechAdapter {
    pub fn new(client: Arc<SpeechClient>, language_code: &str, sample_rate: u32) -> Self {
        Self {
            client,
            language_code: language_code.to_string(),
            sample_rate,
        }
    }

    async fn transcribe_bytes(&self, audio: &[u8]) -> Result<String, AdapterError> {
        if audio.is_empty() {
            return Err(AdapterError::NoSpeechDetected);
        }
        let response = self
            .client
            .recognize_linear16(audio, self.sample_rate, &self.language_code)
            .await
            .map_err(|e| {
                tracing::warn!("Upload transcription failed: {}", e);
                AdapterError::Upstream(e.to_string())
            })?;
        response
            .top_transcript()
            .map(str::to_string)
            .ok_or(AdapterError::NoSpeechDetected)
    }
}

#[async_trait]
impl FileTranscription for FileSpeechAdapter {
    async fn transcribe(&self, audio: &[u8]) -> Outcome {
        tracing::info!("Transcribing {} bytes of uploaded audio", audio.len());
        self.transcribe_bytes(audio).await.into()
    }
}
