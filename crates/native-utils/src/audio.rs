use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Sample rate the speech backend receives from the microphone path.
pub const SPEECH_PCM16_SAMPLE_RATE: u32 = 16000;

/// Frames handed to the resampler per call.
const RESAMPLE_CHUNK_SIZE: usize = 1024;
/// Upper bound on silent chunks fed in to push out the resampler's delay.
const MAX_FLUSH_CHUNKS: usize = 4;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits a slice of audio samples into a vector of vectors, where each inner vector has a fixed chunk size.
/// If a chunk is smaller than the `chunk_size`, it is padded with zeros.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Resamples a whole mono recording in one go.
///
/// The resampler's leading delay is dropped and the tail is flushed with
/// silence, so the output lines up with the input from first to last sample.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> anyhow::Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let mut resampler = create_resampler(from_rate as f64, to_rate as f64, RESAMPLE_CHUNK_SIZE)?;
    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).ceil() as usize;

    let mut out = Vec::with_capacity(delay + expected + RESAMPLE_CHUNK_SIZE);
    for chunk in split_for_chunks(samples, RESAMPLE_CHUNK_SIZE) {
        let resampled = resampler.process(&[chunk.as_slice()], None)?;
        if let Some(channel) = resampled.first() {
            out.extend_from_slice(channel);
        }
    }

    let silence = vec![0.0f32; RESAMPLE_CHUNK_SIZE];
    let mut flushes = 0;
    while out.len() < delay + expected && flushes < MAX_FLUSH_CHUNKS {
        let resampled = resampler.process(&[silence.as_slice()], None)?;
        if let Some(channel) = resampled.first() {
            out.extend_from_slice(channel);
        }
        flushes += 1;
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}

/// Averages interleaved frames down to a single channel.
pub fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels > 1 {
        data.chunks(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        data.to_vec()
    }
}

/// Root-mean-square energy of a block of samples, 0.0 for an empty block.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Converts a slice of f32 samples to a vector of i16 samples.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// A trait for converting audio sample types to little-endian PCM16 bytes.
pub trait ToBinary {
    fn to_binary(&self) -> Vec<u8>;
}

impl ToBinary for [i16] {
    fn to_binary(&self) -> Vec<u8> {
        self.iter().flat_map(|&sample| sample.to_le_bytes()).collect()
    }
}

impl ToBinary for [f32] {
    fn to_binary(&self) -> Vec<u8> {
        convert_f32_to_i16(self).to_binary()
    }
}
