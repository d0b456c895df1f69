//! Single-phrase microphone capture.
//!
//! The input device is opened, the first second of audio is used to measure
//! ambient noise, and the energy threshold is set from it. After that the
//! detector waits for a block louder than the threshold, records until
//! enough trailing silence has passed (or the phrase limit is reached) and
//! hands back the mono samples.
//!
//! All timing is counted in samples rather than wall-clock time, so the
//! detector can be driven with synthetic buffers.

use crate::audio::{downmix_to_mono, rms};
use crate::device;
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, StreamTrait};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// How long the capture loop tolerates a silent (stalled) input stream.
const STREAM_STALL_LIMIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct ListenSettings {
    pub calibration: Duration,
    /// Window after calibration in which speech must start.
    pub timeout: Duration,
    pub phrase_limit: Duration,
    /// Trailing silence that ends a phrase.
    pub pause: Duration,
    /// Threshold is ambient RMS times this ratio.
    pub energy_ratio: f32,
    pub min_threshold: f32,
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            calibration: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(15),
            pause: Duration::from_millis(800),
            energy_ratio: 1.5,
            min_threshold: 0.01,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("audio input device unavailable: {0}")]
    Device(String),
    #[error("audio input stream failed: {0}")]
    Stream(String),
    #[error("no speech detected within {0:?}")]
    Timeout(Duration),
}

/// Mono samples at the device's native rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorStatus {
    Listening,
    Complete,
    TimedOut,
}

#[derive(Debug)]
enum Stage {
    Calibrating { energy: f64, seen: usize },
    Waiting { waited: usize },
    Recording { trailing_silence: usize },
    Done,
}

#[derive(Debug)]
pub struct PhraseDetector {
    settings: ListenSettings,
    sample_rate: u32,
    stage: Stage,
    threshold: f32,
    // Last quiet block before onset, kept so the first syllable isn't clipped.
    pre_roll: Vec<f32>,
    recorded: Vec<f32>,
}

impl PhraseDetector {
    pub fn new(settings: ListenSettings, sample_rate: u32) -> Self {
        let threshold = settings.min_threshold;
        Self {
            settings,
            sample_rate,
            stage: Stage::Calibrating {
                energy: 0.0,
                seen: 0,
            },
            threshold,
            pre_roll: Vec::new(),
            recorded: Vec::new(),
        }
    }

    fn samples_for(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate as f64) as usize
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feeds one block of mono samples.
    pub fn feed(&mut self, block: &[f32]) -> DetectorStatus {
        let energy = rms(block);
        let calibration_len = self.samples_for(self.settings.calibration);
        let timeout_len = self.samples_for(self.settings.timeout);
        let pause_len = self.samples_for(self.settings.pause);
        let phrase_limit_len = self.samples_for(self.settings.phrase_limit);

        match &mut self.stage {
            Stage::Calibrating { energy: sum, seen } => {
                *sum += (energy as f64).powi(2) * block.len() as f64;
                *seen += block.len();
                if *seen >= calibration_len {
                    let ambient = (*sum / (*seen).max(1) as f64).sqrt() as f32;
                    self.threshold =
                        (ambient * self.settings.energy_ratio).max(self.settings.min_threshold);
                    tracing::debug!(
                        "Ambient RMS {:.4}, energy threshold set to {:.4}",
                        ambient,
                        self.threshold
                    );
                    self.stage = Stage::Waiting { waited: 0 };
                }
                DetectorStatus::Listening
            }
            Stage::Waiting { waited } => {
                if energy > self.threshold {
                    self.recorded.append(&mut self.pre_roll);
                    self.recorded.extend_from_slice(block);
                    self.stage = Stage::Recording {
                        trailing_silence: 0,
                    };
                    return DetectorStatus::Listening;
                }
                *waited += block.len();
                if *waited >= timeout_len {
                    self.stage = Stage::Done;
                    return DetectorStatus::TimedOut;
                }
                self.pre_roll = block.to_vec();
                DetectorStatus::Listening
            }
            Stage::Recording { trailing_silence } => {
                self.recorded.extend_from_slice(block);
                if energy > self.threshold {
                    *trailing_silence = 0;
                } else {
                    *trailing_silence += block.len();
                }
                let paused = *trailing_silence >= pause_len;
                let limit_hit = self.recorded.len() >= phrase_limit_len;
                if paused || limit_hit {
                    self.stage = Stage::Done;
                    return DetectorStatus::Complete;
                }
                DetectorStatus::Listening
            }
            Stage::Done => DetectorStatus::Complete,
        }
    }

    pub fn into_recording(self) -> Recording {
        Recording {
            samples: self.recorded,
            sample_rate: self.sample_rate,
        }
    }
}

/// Opens the input device and blocks until one phrase has been captured or
/// the listening window has passed. Must run off the async runtime.
pub fn record_phrase(
    device_name: Option<&str>,
    settings: &ListenSettings,
) -> Result<Recording, CaptureError> {
    let input = device::get_or_default_input(device_name)
        .map_err(|e| CaptureError::Device(format!("{e:#}")))?;
    let input_config = input
        .default_input_config()
        .map_err(|e| CaptureError::Device(e.to_string()))?;

    let channels = input_config.channels() as usize;
    let sample_rate = input_config.sample_rate().0;
    let stream_config: StreamConfig = input_config.config();
    tracing::info!(
        "Listening on {:?} ({}ch, {}hz)",
        input.name().unwrap_or_default(),
        channels,
        sample_rate
    );

    let (tx, rx) = mpsc::channel::<Vec<f32>>();
    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        // The receiver is gone once a phrase is complete; late blocks are dropped.
        let _ = tx.send(downmix_to_mono(data, channels));
    };
    let input_stream = input
        .build_input_stream(
            &stream_config,
            input_data_fn,
            move |err| tracing::error!("An error occurred on input stream: {}", err),
            None,
        )
        .map_err(|e| CaptureError::Stream(e.to_string()))?;
    input_stream
        .play()
        .map_err(|e| CaptureError::Stream(e.to_string()))?;

    let mut detector = PhraseDetector::new(settings.clone(), sample_rate);
    loop {
        let block = match rx.recv_timeout(STREAM_STALL_LIMIT) {
            Ok(block) => block,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return Err(CaptureError::Stream(
                    "input stream stopped delivering audio".to_string(),
                ));
            }
        };
        match detector.feed(&block) {
            DetectorStatus::Listening => continue,
            DetectorStatus::Complete => break,
            DetectorStatus::TimedOut => return Err(CaptureError::Timeout(settings.timeout)),
        }
    }
    drop(input_stream);

    let recording = detector.into_recording();
    tracing::debug!(
        "Captured {:.2}s of audio",
        recording.samples.len() as f32 / recording.sample_rate as f32
    );
    Ok(recording)
}
