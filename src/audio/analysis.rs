use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::decode::{self, AudioData, TARGET_SAMPLE_RATE};
use super::features::{
    frame_count_for, FeatureSet, BAND_CEILING_HZ, BAND_COUNT, DANCE_TEMPO_MAX, DANCE_TEMPO_MIN,
    DEFAULT_TEMPO_BPM, FRAME_RATE_HZ, PITCH_CLASSES,
};
use crate::error::ExtractError;

const FFT_SIZE: usize = 2048;
/// 48000 / 800 = 60 spectral frames per second.
const HOP_SIZE: usize = TARGET_SAMPLE_RATE as usize / FRAME_RATE_HZ as usize;

/// Dynamic range kept below the loudest band.
const TOP_DB: f32 = 80.0;
/// Band power at or below this is treated as digital silence.
const SILENCE_POWER: f32 = 1e-10;

/// Tempo search range for the autocorrelation, before folding.
const MIN_SEARCH_BPM: f64 = 40.0;
const MAX_SEARCH_BPM: f64 = 240.0;
/// Beat snapping window, as a fraction of the beat period.
const SNAP_FRACTION: f64 = 0.1;
/// Normalized autocorrelation peak below which the envelope counts as aperiodic.
const MIN_PERIODICITY: f64 = 0.1;
/// Onset envelope blur before autocorrelation, in frames.
const ONSET_SMOOTHING_SIGMA: f64 = 1.5;
/// A one-beat lag wins over a multi-beat peak when it reaches this share of it.
const SUBMULTIPLE_RATIO: f64 = 0.8;

/// Decode `bytes`, enforce `max_duration` and compute the 60 fps feature stream.
pub fn extract(bytes: &[u8], max_duration: f64) -> Result<FeatureSet, ExtractError> {
    let audio = decode::decode_audio(bytes)?;

    let duration = audio.duration();
    if duration > max_duration {
        return Err(ExtractError::DurationExceeded {
            actual: duration,
            limit: max_duration,
        });
    }

    let audio = decode::normalize_rate(audio)?;
    analyze(&audio)
}

/// Analyze mono audio already at [`TARGET_SAMPLE_RATE`].
pub fn analyze(audio: &AudioData) -> Result<FeatureSet, ExtractError> {
    debug_assert_eq!(audio.sample_rate, TARGET_SAMPLE_RATE);

    let duration = audio.duration();
    let total_frames = frame_count_for(duration);
    if total_frames == 0 {
        return Err(ExtractError::decode(format!(
            "audio is {:.4}s long, too short for a single {} fps frame",
            duration, FRAME_RATE_HZ
        )));
    }

    log::info!("Pass 1: Spectral frames ({} frames)...", total_frames);
    let (mel_power, chroma_power) = spectral_frames(&audio.samples);

    log::info!("Pass 2: Band and pitch-class normalization...");
    let bands = align_frames(&mel_to_unit_db(&mel_power), total_frames);
    let chroma = align_frames(&chroma_power, total_frames);
    let pitch_class_profile: Vec<[f32; PITCH_CLASSES]> =
        chroma.iter().map(|frame| normalize_chroma(frame)).collect();

    log::info!("Pass 3: Onsets, tempo and beats...");
    let onset_strength = onset_envelope(&bands);
    let raw_tempo = estimate_tempo(&onset_strength);
    let tempo_bpm = fold_tempo(raw_tempo.unwrap_or(DEFAULT_TEMPO_BPM));
    let beat_timestamps = if raw_tempo.is_some() {
        track_beats(&onset_strength, tempo_bpm)
    } else {
        Vec::new()
    };

    match raw_tempo {
        Some(raw) => log::info!(
            "Tempo: {:.1} BPM (raw {:.1}), {} beats",
            tempo_bpm,
            raw,
            beat_timestamps.len()
        ),
        None => log::info!(
            "No periodic onsets found, using default tempo {:.1} BPM",
            tempo_bpm
        ),
    }

    Ok(FeatureSet {
        sample_rate: audio.sample_rate,
        frame_rate_hz: FRAME_RATE_HZ,
        duration_seconds: duration,
        spectral_bands: bands,
        pitch_class_profile,
        onset_strength,
        tempo_bpm,
        beat_timestamps,
    })
}

/// Windowed FFT per hop, returning mel band power and raw pitch-class power.
fn spectral_frames(samples: &[f32]) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let natural_frames = samples.len().div_ceil(HOP_SIZE);
    let hann = hann_window(FFT_SIZE);
    let filterbank = mel_filterbank(TARGET_SAMPLE_RATE);
    let pitch_map = pitch_class_map(TARGET_SAMPLE_RATE);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);

    let frames: Vec<(Vec<f32>, Vec<f32>)> = (0..natural_frames)
        .into_par_iter()
        .map(|frame_idx| {
            // Window centred on the middle of this frame's hop
            let center = (frame_idx * HOP_SIZE + HOP_SIZE / 2) as isize;
            let start = center - (FFT_SIZE / 2) as isize;

            let mut buffer: Vec<Complex<f32>> = (0..FFT_SIZE)
                .map(|i| {
                    let idx = start + i as isize;
                    let s = if idx >= 0 && (idx as usize) < samples.len() {
                        samples[idx as usize]
                    } else {
                        0.0
                    };
                    Complex::new(s * hann[i], 0.0)
                })
                .collect();
            fft.process(&mut buffer);

            let power: Vec<f32> = buffer[..FFT_SIZE / 2 + 1].iter().map(|c| c.norm_sqr()).collect();

            let mel: Vec<f32> = filterbank
                .iter()
                .map(|band| band.iter().map(|&(bin, w)| w * power[bin]).sum())
                .collect();

            let mut chroma = vec![0.0f32; PITCH_CLASSES];
            for &(bin, pc) in &pitch_map {
                chroma[pc] += power[bin];
            }

            (mel, chroma)
        })
        .collect();

    frames.into_iter().unzip()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Sparse triangular mel filters: per band, `(fft_bin, weight)` pairs.
fn mel_filterbank(sample_rate: u32) -> Vec<Vec<(usize, f32)>> {
    let bin_hz = sample_rate as f32 / FFT_SIZE as f32;
    let max_mel = hz_to_mel(BAND_CEILING_HZ);
    let edges: Vec<f32> = (0..BAND_COUNT + 2)
        .map(|i| mel_to_hz(max_mel * i as f32 / (BAND_COUNT + 1) as f32))
        .collect();
    let last_bin = FFT_SIZE / 2;

    (0..BAND_COUNT)
        .map(|m| {
            let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
            let mut weights: Vec<(usize, f32)> = (0..=last_bin)
                .filter_map(|bin| {
                    let f = bin as f32 * bin_hz;
                    let w = if f > lower && f <= center {
                        (f - lower) / (center - lower)
                    } else if f > center && f < upper {
                        (upper - f) / (upper - center)
                    } else {
                        0.0
                    };
                    (w > 0.0).then_some((bin, w))
                })
                .collect();
            // Low bands narrower than one bin take the nearest bin
            if weights.is_empty() {
                let nearest = ((center / bin_hz).round() as usize).min(last_bin);
                weights.push((nearest, 1.0));
            }
            weights
        })
        .collect()
}

/// `(fft_bin, pitch_class)` for every bin between C1 and C8.
fn pitch_class_map(sample_rate: u32) -> Vec<(usize, usize)> {
    const C1_HZ: f32 = 32.703;
    const C8_HZ: f32 = 4186.01;
    let bin_hz = sample_rate as f32 / FFT_SIZE as f32;

    (1..=FFT_SIZE / 2)
        .filter_map(|bin| {
            let f = bin as f32 * bin_hz;
            if !(C1_HZ..=C8_HZ).contains(&f) {
                return None;
            }
            let midi = 69.0 + 12.0 * (f / 440.0).log2();
            let pc = (midi.round() as i64).rem_euclid(PITCH_CLASSES as i64) as usize;
            Some((bin, pc))
        })
        .collect()
}

/// Power to dB relative to the clip maximum, floored at -[`TOP_DB`], mapped to 0.0-1.0.
/// A silent clip maps to all zeros.
fn mel_to_unit_db(mel_power: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let peak = mel_power
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(0.0f32, f32::max);

    if peak <= SILENCE_POWER {
        return mel_power.iter().map(|frame| vec![0.0; frame.len()]).collect();
    }

    let peak_db = 10.0 * peak.log10();
    mel_power
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&p| {
                    let db = 10.0 * p.max(SILENCE_POWER).log10() - peak_db;
                    (db.max(-TOP_DB) + TOP_DB) / TOP_DB
                })
                .collect()
        })
        .collect()
}

fn normalize_chroma(frame: &[f32]) -> [f32; PITCH_CLASSES] {
    let mut out = [0.0f32; PITCH_CLASSES];
    let peak = frame.iter().copied().fold(0.0f32, f32::max);
    if peak > SILENCE_POWER {
        for (o, &v) in out.iter_mut().zip(frame) {
            *o = v / peak;
        }
    }
    out
}

/// Linearly interpolate a frame matrix onto `target` frames (endpoints preserved).
fn align_frames(frames: &[Vec<f32>], target: usize) -> Vec<Vec<f32>> {
    if frames.len() == target || frames.is_empty() {
        return frames.to_vec();
    }
    if frames.len() == 1 || target == 1 {
        return vec![frames[0].clone(); target];
    }

    log::debug!("Aligning {} spectral frames to {} motion frames", frames.len(), target);

    let scale = (frames.len() - 1) as f64 / (target - 1) as f64;
    (0..target)
        .map(|i| {
            let pos = i as f64 * scale;
            let lo = (pos.floor() as usize).min(frames.len() - 1);
            let hi = (lo + 1).min(frames.len() - 1);
            let frac = (pos - lo as f64) as f32;
            frames[lo]
                .iter()
                .zip(&frames[hi])
                .map(|(&a, &b)| a + (b - a) * frac)
                .collect()
        })
        .collect()
}

/// Positive band flux between consecutive frames, normalized to 0.0-1.0.
fn onset_envelope(bands: &[Vec<f32>]) -> Vec<f32> {
    let mut flux = vec![0.0f32; bands.len()];
    for i in 1..bands.len() {
        let rise: f32 = bands[i]
            .iter()
            .zip(&bands[i - 1])
            .map(|(cur, prev)| (cur - prev).max(0.0))
            .sum();
        flux[i] = rise / bands[i].len().max(1) as f32;
    }

    let peak = flux.iter().copied().fold(0.0f32, f32::max);
    if peak > 1e-6 {
        for v in &mut flux {
            *v /= peak;
        }
    } else {
        flux.iter_mut().for_each(|v| *v = 0.0);
    }
    flux
}

/// Autocorrelation tempo estimate over the onset envelope (one value per frame).
/// Returns `None` when the envelope has no periodic content.
fn estimate_tempo(onset: &[f32]) -> Option<f64> {
    let n = onset.len();
    let frame_rate = FRAME_RATE_HZ as f64;
    let min_lag = (60.0 * frame_rate / MAX_SEARCH_BPM).floor() as usize;
    // At least half the envelope overlaps itself at every lag
    let max_lag = ((60.0 * frame_rate / MIN_SEARCH_BPM).ceil() as usize).min(n / 2);
    if min_lag < 2 || min_lag + 1 >= max_lag {
        return None;
    }

    let smoothed = gaussian_smooth(onset, ONSET_SMOOTHING_SIGMA);
    let mean = smoothed.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = smoothed.iter().map(|&v| v - mean).collect();
    let variance = centered.iter().map(|v| v * v).sum::<f64>() / n as f64;
    if variance < 1e-12 {
        return None;
    }

    // Mean lagged product over the overlap, so long lags are not penalized
    let autocorr = |lag: usize| -> f64 {
        let overlap = n - lag;
        centered[..overlap]
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / (overlap as f64 * variance)
    };

    let mut best_lag = min_lag;
    let mut best_value = autocorr(min_lag);
    for lag in min_lag + 1..=max_lag {
        let value = autocorr(lag);
        if value > best_value {
            best_value = value;
            best_lag = lag;
        }
    }
    if best_value < MIN_PERIODICITY {
        return None;
    }

    // A peak at two or three beats also shows up at one beat; take the shortest
    // sub-multiple that is nearly as strong.
    'shorten: loop {
        for divisor in [3.0, 2.0] {
            let target = best_lag as f64 / divisor;
            let candidate = [target.floor() as usize, target.ceil() as usize]
                .into_iter()
                .filter(|&lag| lag >= min_lag)
                .map(|lag| (lag, autocorr(lag)))
                .fold(None, |best: Option<(usize, f64)>, (lag, v)| match best {
                    Some((_, bv)) if bv >= v => best,
                    _ => Some((lag, v)),
                });
            if let Some((lag, value)) = candidate {
                if value >= SUBMULTIPLE_RATIO * best_value {
                    log::debug!(
                        "Tempo lag {} -> {} (autocorrelation {:.3} vs {:.3})",
                        best_lag,
                        lag,
                        value,
                        best_value
                    );
                    best_lag = lag;
                    best_value = value;
                    continue 'shorten;
                }
            }
        }
        break;
    }

    // Parabolic refinement around the integer peak
    let (a, b, c) = (autocorr(best_lag - 1), best_value, autocorr(best_lag + 1));
    let denom = a - 2.0 * b + c;
    let offset = if denom < 0.0 {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    Some(60.0 * frame_rate / (best_lag as f64 + offset))
}

/// Gaussian blur with edge renormalization.
fn gaussian_smooth(values: &[f32], sigma: f64) -> Vec<f64> {
    let radius = (3.0 * sigma).ceil() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-(k * k) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let n = values.len() as isize;

    (0..n)
        .map(|i| {
            let mut sum = 0.0;
            let mut weight = 0.0;
            for (k, &w) in (-radius..=radius).zip(&kernel) {
                let j = i + k;
                if (0..n).contains(&j) {
                    sum += w * values[j as usize] as f64;
                    weight += w;
                }
            }
            sum / weight
        })
        .collect()
}

/// Fold a tempo estimate into the dance band by octaves. Estimates already in
/// the band are kept; invalid estimates fall back to the default tempo.
pub fn fold_tempo(bpm: f64) -> f64 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return DEFAULT_TEMPO_BPM;
    }
    let mut folded = bpm;
    while folded > DANCE_TEMPO_MAX {
        folded /= 2.0;
    }
    while folded < DANCE_TEMPO_MIN {
        folded *= 2.0;
    }
    folded
}

/// Beat grid at `tempo_bpm`, phase-aligned to the onset envelope, with each
/// grid point snapped to the strongest nearby onset.
fn track_beats(onset: &[f32], tempo_bpm: f64) -> Vec<f64> {
    let n = onset.len();
    let frame_rate = FRAME_RATE_HZ as f64;
    let period = 60.0 * frame_rate / tempo_bpm;
    if n == 0 || period < 1.0 {
        return Vec::new();
    }

    let grid_score = |phase: f64| -> f32 {
        (0..)
            .map(|k| (phase + k as f64 * period).round() as usize)
            .take_while(|&idx| idx < n)
            .map(|idx| onset[idx])
            .sum()
    };

    let mut best_phase = 0.0;
    let mut best_score = f32::MIN;
    for offset in 0..period.ceil() as usize {
        let score = grid_score(offset as f64);
        if score > best_score {
            best_score = score;
            best_phase = offset as f64;
        }
    }

    let window = ((period * SNAP_FRACTION).round() as usize).max(1);
    let mut beats: Vec<f64> = Vec::new();
    let mut last_frame: Option<usize> = None;

    for k in 0.. {
        let grid = (best_phase + k as f64 * period).round() as usize;
        if grid >= n {
            break;
        }
        let lo = grid.saturating_sub(window);
        let hi = (grid + window).min(n - 1);
        let mut frame = grid;
        let mut strongest = onset[grid];
        for (idx, &v) in onset.iter().enumerate().take(hi + 1).skip(lo) {
            if v > strongest {
                strongest = v;
                frame = idx;
            }
        }

        if last_frame.map_or(true, |last| frame > last) {
            beats.push(frame as f64 / frame_rate);
            last_frame = Some(frame);
        }
    }

    beats
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::{click_track, wav_bytes};
    use crate::motion::style::Style;

    fn sine(freq: f32, seconds: f32) -> Vec<f32> {
        let n = (seconds * TARGET_SAMPLE_RATE as f32) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / TARGET_SAMPLE_RATE as f32).sin())
            .collect()
    }

    #[test]
    fn fold_keeps_tempo_inside_band() {
        assert_eq!(fold_tempo(120.0), 120.0);
        assert_eq!(fold_tempo(80.0), 80.0);
        assert_eq!(fold_tempo(160.0), 160.0);
    }

    #[test]
    fn fold_halves_and_doubles() {
        assert_eq!(fold_tempo(240.0), 120.0);
        assert_eq!(fold_tempo(340.0), 85.0);
        assert_eq!(fold_tempo(60.0), 120.0);
        assert_eq!(fold_tempo(35.0), 140.0);
    }

    #[test]
    fn fold_rejects_invalid() {
        assert_eq!(fold_tempo(0.0), DEFAULT_TEMPO_BPM);
        assert_eq!(fold_tempo(f64::NAN), DEFAULT_TEMPO_BPM);
        assert_eq!(fold_tempo(-90.0), DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn feature_shapes_match_frame_count() {
        let audio = AudioData {
            samples: sine(440.0, 1.5),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert_eq!(features.frame_count(), 90);
        assert_eq!(features.pitch_class_profile.len(), 90);
        assert_eq!(features.onset_strength.len(), 90);
        assert!(features.spectral_bands.iter().all(|f| f.len() == BAND_COUNT));
        assert!(features.validate().is_ok());
    }

    #[test]
    fn odd_length_is_aligned_to_rounded_frame_count() {
        // 60.25 hops: 61 natural frames, 60 after rounding
        let audio = AudioData {
            samples: sine(220.0, 1.0).into_iter().chain(vec![0.0; 200]).collect(),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert_eq!(features.frame_count(), frame_count_for(audio.duration()));
        assert!(features.validate().is_ok());
    }

    #[test]
    fn a440_dominates_pitch_class_a() {
        let audio = AudioData {
            samples: sine(440.0, 1.0),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        let frame = features.pitch_class_profile[30];
        let argmax = frame
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        assert_eq!(argmax, 9);
        assert!((frame[9] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silence_yields_zero_features_and_default_tempo() {
        let audio = AudioData {
            samples: vec![0.0; TARGET_SAMPLE_RATE as usize * 2],
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert_eq!(features.frame_count(), 120);
        assert_eq!(features.tempo_bpm, DEFAULT_TEMPO_BPM);
        assert!(features.beat_timestamps.is_empty());
        assert!(features.spectral_bands.iter().flatten().all(|&v| v == 0.0));
        assert!(features.pitch_class_profile.iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn click_track_tempo_and_beats() {
        let audio = AudioData {
            samples: click_track(120.0, 6.0, TARGET_SAMPLE_RATE),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert!(
            (features.tempo_bpm - 120.0).abs() < 3.0,
            "tempo {}",
            features.tempo_bpm
        );
        assert!(features.beat_timestamps.len() >= 10);
        for w in features.beat_timestamps.windows(2) {
            assert!(w[1] > w[0]);
            assert!((w[1] - w[0] - 0.5).abs() < 0.06, "interval {}", w[1] - w[0]);
        }
    }

    fn assert_click_tempo(bpm: f64, seconds: f32) {
        let audio = AudioData {
            samples: click_track(bpm as f32, seconds, TARGET_SAMPLE_RATE),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert!(
            (features.tempo_bpm - bpm).abs() < 3.0,
            "{} BPM detected as {}",
            bpm,
            features.tempo_bpm
        );
        let period = 60.0 / features.tempo_bpm;
        assert!(features.beat_timestamps.len() as f64 >= seconds as f64 / period - 3.0);
        for w in features.beat_timestamps.windows(2) {
            assert!(
                (w[1] - w[0] - period).abs() < 0.03,
                "{} BPM: interval {} vs period {}",
                bpm,
                w[1] - w[0],
                period
            );
        }
    }

    #[test]
    fn fractional_period_tempo_is_not_a_multiple() {
        // 25.7 frames per beat: the three-beat lag of 77 frames is nearly integral
        assert_click_tempo(140.0, 10.0);
    }

    #[test]
    fn in_band_tempos_are_detected() {
        assert_click_tempo(110.0, 10.0);
        assert_click_tempo(90.0, 10.0);
        assert_click_tempo(128.0, 10.0);
        assert_click_tempo(150.0, 10.0);
    }

    #[test]
    fn auto_style_follows_fractional_tempo() {
        let audio = AudioData {
            samples: click_track(140.0, 8.0, TARGET_SAMPLE_RATE),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert_eq!(Style::Auto.resolve(features.tempo_bpm), Style::HipHop);
    }

    #[test]
    fn smoothing_preserves_mass_away_from_edges() {
        let mut impulse = vec![0.0f32; 41];
        impulse[20] = 1.0;
        let out = gaussian_smooth(&impulse, ONSET_SMOOTHING_SIGMA);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(out[20] > out[19] && (out[19] - out[21]).abs() < 1e-12);
        let flat = gaussian_smooth(&[0.5; 10], ONSET_SMOOTHING_SIGMA);
        assert!(flat.iter().all(|v| (v - 0.5).abs() < 1e-9));
    }

    #[test]
    fn slow_click_track_is_not_folded() {
        let audio = AudioData {
            samples: click_track(100.0, 8.0, TARGET_SAMPLE_RATE),
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let features = analyze(&audio).unwrap();
        assert!(
            (features.tempo_bpm - 100.0).abs() < 3.0,
            "tempo {}",
            features.tempo_bpm
        );
    }

    #[test]
    fn extract_enforces_duration_limit() {
        let bytes = wav_bytes(&vec![0.0; 8_000 * 45], 8_000, 1);
        match extract(&bytes, 30.0) {
            Err(ExtractError::DurationExceeded { actual, limit }) => {
                assert!((actual - 45.0).abs() < 1e-6);
                assert_eq!(limit, 30.0);
            }
            other => panic!("expected DurationExceeded, got {:?}", other.map(|f| f.duration_seconds)),
        }
    }

    #[test]
    fn extract_resamples_to_target_rate() {
        let samples: Vec<f32> = (0..44_100).map(|i| 0.3 * (i as f32 * 0.05).sin()).collect();
        let features = extract(&wav_bytes(&samples, 44_100, 1), 30.0).unwrap();
        assert_eq!(features.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(features.frame_count(), 60);
    }

    #[test]
    fn too_short_audio_is_rejected() {
        let audio = AudioData {
            samples: vec![0.1; 100],
            sample_rate: TARGET_SAMPLE_RATE,
        };
        assert!(matches!(analyze(&audio), Err(ExtractError::Decode { .. })));
    }

    #[test]
    fn align_interpolates_linearly() {
        let frames = vec![vec![0.0], vec![1.0], vec![2.0]];
        let out = align_frames(&frames, 5);
        let values: Vec<f32> = out.iter().map(|f| f[0]).collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn every_mel_band_has_weights() {
        let bank = mel_filterbank(TARGET_SAMPLE_RATE);
        assert_eq!(bank.len(), BAND_COUNT);
        assert!(bank.iter().all(|band| !band.is_empty()));
    }
}
