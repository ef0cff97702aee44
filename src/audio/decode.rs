use std::io::Cursor;

use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::ExtractError;

/// All analysis runs at this rate; 48000 / 800-sample hop gives exactly 60 frames/s.
pub const TARGET_SAMPLE_RATE: u32 = 48_000;

const MIN_SOURCE_RATE: u32 = 8_000;
const MAX_SOURCE_RATE: u32 = 192_000;
const MAX_CHANNELS: usize = 8;
const SINC_LEN: usize = 256;

/// Decoded mono waveform.
#[derive(Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioData {
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an in-memory audio file to mono samples at the source rate.
pub fn decode_audio(bytes: &[u8]) -> Result<AudioData, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::decode("input is empty"));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(&Hint::new(), mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ExtractError::decode(format!("failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| ExtractError::decode("no audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let declared_channels = codec_params.channels.map_or(0, |c| c.count());

    let sample_rate = codec_params.sample_rate.ok_or_else(|| ExtractError::UnsupportedFormat {
        channels: declared_channels,
        sample_rate: 0,
        reason: "stream does not declare a sample rate".into(),
    })?;
    if !(MIN_SOURCE_RATE..=MAX_SOURCE_RATE).contains(&sample_rate) {
        return Err(ExtractError::UnsupportedFormat {
            channels: declared_channels,
            sample_rate,
            reason: format!(
                "sample rate must be between {} and {} Hz",
                MIN_SOURCE_RATE, MAX_SOURCE_RATE
            ),
        });
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| ExtractError::decode(format!("failed to create decoder: {}", e)))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(ExtractError::decode(format!("failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                log::debug!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(ExtractError::decode(format!("decode error: {}", e))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ExtractError::UnsupportedFormat {
                channels,
                sample_rate,
                reason: format!("can only downmix 1 to {} channels", MAX_CHANNELS),
            });
        }
        if spec.rate != sample_rate {
            return Err(ExtractError::UnsupportedFormat {
                channels,
                sample_rate: spec.rate,
                reason: format!("sample rate changed mid-stream from {} Hz", sample_rate),
            });
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        // Downmix to mono
        if channels == 1 {
            all_samples.extend_from_slice(samples);
        } else {
            for frame_samples in samples.chunks(channels) {
                let mono: f32 = frame_samples.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        }
    }

    if all_samples.is_empty() {
        return Err(ExtractError::decode("stream contains no audio samples"));
    }
    if all_samples.iter().any(|s| !s.is_finite()) {
        return Err(ExtractError::decode("decoded samples contain non-finite values"));
    }

    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.2}s",
        all_samples.len(),
        sample_rate,
        all_samples.len() as f64 / sample_rate as f64
    );

    Ok(AudioData {
        samples: all_samples,
        sample_rate,
    })
}

/// Resample to [`TARGET_SAMPLE_RATE`]. The output holds exactly
/// `round(duration * TARGET_SAMPLE_RATE)` samples so frame timing stays exact.
pub fn normalize_rate(audio: AudioData) -> Result<AudioData, ExtractError> {
    if audio.sample_rate == TARGET_SAMPLE_RATE {
        return Ok(audio);
    }

    let expected_len = (audio.duration() * TARGET_SAMPLE_RATE as f64).round() as usize;
    let ratio = TARGET_SAMPLE_RATE as f64 / audio.sample_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let unsupported = |reason: String| ExtractError::UnsupportedFormat {
        channels: 1,
        sample_rate: audio.sample_rate,
        reason,
    };

    // One chunk holding the clip plus a zero tail that flushes the filter
    // delay (half a sinc window) at any supported ratio.
    let chunk = audio.samples.len() + 2 * SINC_LEN;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, 1)
        .map_err(|e| unsupported(format!("cannot build resampler: {}", e)))?;
    let delay = resampler.output_delay();

    let mut padded = Vec::with_capacity(chunk);
    padded.extend_from_slice(&audio.samples);
    padded.resize(chunk, 0.0);
    let output = resampler
        .process(&[padded], None)
        .map_err(|e| unsupported(format!("resampling failed: {}", e)))?;

    let mut samples: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .collect();
    samples.resize(expected_len, 0.0);

    log::debug!(
        "Resampled {}Hz -> {}Hz ({} samples)",
        audio.sample_rate,
        TARGET_SAMPLE_RATE,
        samples.len()
    );

    Ok(AudioData {
        samples,
        sample_rate: TARGET_SAMPLE_RATE,
    })
}

/// 16-bit PCM WAV bytes for tests. `samples` are interleaved.
#[cfg(test)]
pub(crate) fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Mono click track: short decaying 1 kHz bursts on every beat.
#[cfg(test)]
pub(crate) fn click_track(bpm: f32, duration: f32, sample_rate: u32) -> Vec<f32> {
    let total = (duration * sample_rate as f32) as usize;
    let period = (60.0 / bpm * sample_rate as f32) as usize;
    let click_len = sample_rate as usize / 50;
    (0..total)
        .map(|i| {
            let pos = i % period;
            if pos < click_len {
                let env = 1.0 - pos as f32 / click_len as f32;
                let t = i as f32 / sample_rate as f32;
                0.8 * env * (2.0 * std::f32::consts::PI * 1000.0 * t).sin()
            } else {
                0.0
            }
        })
        .collect()
}
