use async_trait::async_trait;
use chatbot_core::{AdapterError, Outcome, SpeechCapture};
use chatbot_native_utils::audio::{SPEECH_PCM16_SAMPLE_RATE, ToBinary, resample};
use chatbot_native_utils::capture::{self, CaptureError, ListenSettings, Recording};
use cloud_speech::SpeechClient;
use std::sync::Arc;

/// Blocking capture of a single phrase. Split out so the adapter can be
/// tested without an audio device.
pub trait PhraseRecorder: Send + Sync + 'static {
    fn record(&self) -> Result<Recording, CaptureError>;
}

/// Records from a cpal input device.
pub struct CpalRecorder {
    device_name: Option<String>,
    settings: ListenSettings,
}

impl CpalRecorder {
    pub fn new(device_name: Option<String>, settings: ListenSettings) -> Self {
        Self {
            device_name,
            settings,
        }
    }
}

impl PhraseRecorder for CpalRecorder {
    fn record(&self) -> Result<Recording, CaptureError> {
        capture::record_phrase(self.device_name.as_deref(), &self.settings)
    }
}

/// Listens for one phrase on the local microphone and transcribes it.
pub struct MicrophoneAdapter {
    recorder: Arc<dyn PhraseRecorder>,
    client: Arc<SpeechClient>,
    language_code: String,
}

impl MicrophoneAdapter {
    pub fn new(
        recorder: Arc<dyn PhraseRecorder>,
        client: Arc<SpeechClient>,
        language_code: &str,
    ) -> Self {
        Self {
            recorder,
            client,
            language_code: language_code.to_string(),
        }
    }

    async fn capture(&self) -> Result<Recording, AdapterError> {
        let recorder = Arc::clone(&self.recorder);
        let recorded = tokio::task::spawn_blocking(move || recorder.record())
            .await
            .map_err(|e| AdapterError::Upstream(format!("capture task failed: {e}")))?;
        recorded.map_err(|e| match e {
            CaptureError::Timeout(window) => AdapterError::Timeout {
                seconds: window.as_secs(),
            },
            other => {
                tracing::warn!("Microphone capture failed: {}", other);
                AdapterError::Upstream(other.to_string())
            }
        })
    }

    async fn listen_once(&self) -> Result<String, AdapterError> {
        let recording = self.capture().await?;
        if recording.samples.is_empty() {
            return Err(AdapterError::Unintelligible);
        }

        let samples = resample(
            &recording.samples,
            recording.sample_rate,
            SPEECH_PCM16_SAMPLE_RATE,
        )
        .map_err(|e| AdapterError::Upstream(format!("{e:#}")))?;
        let pcm = samples.to_binary();

        let response = self
            .client
            .recognize_linear16(&pcm, SPEECH_PCM16_SAMPLE_RATE, &self.language_code)
            .await
            .map_err(|e| {
                tracing::warn!("Speech recognition failed: {}", e);
                AdapterError::Upstream(e.to_string())
            })?;
        response
            .top_transcript()
            .map(str::to_string)
            .ok_or(AdapterError::Unintelligible)
    }
}

#[async_trait]
impl SpeechCapture for MicrophoneAdapter {
    async fn listen(&self) -> Outcome {
        tracing::info!("Listening for speech...");
        self.listen_once().await.into()
    }
}
