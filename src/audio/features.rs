/// Animation/analysis frame rate. Spectral frames map 1:1 onto motion frames.
pub const FRAME_RATE_HZ: u32 = 60;
/// Number of mel bands per frame.
pub const BAND_COUNT: usize = 128;
/// Upper edge of the mel filterbank.
pub const BAND_CEILING_HZ: f32 = 8000.0;
/// Pitch classes per frame (C = 0).
pub const PITCH_CLASSES: usize = 12;
/// Fallback tempo when nothing periodic is found (silence, too-short clips).
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;
/// Canonical dance-tempo band that raw tempo estimates are folded into.
pub const DANCE_TEMPO_MIN: f64 = 80.0;
pub const DANCE_TEMPO_MAX: f64 = 160.0;

/// Number of frames covering `duration_seconds` of audio.
pub fn frame_count_for(duration_seconds: f64) -> usize {
    (duration_seconds * FRAME_RATE_HZ as f64).round() as usize
}

/// Per-clip analysis output, consumed once by the motion synthesizer.
#[derive(Clone, Debug)]
pub struct FeatureSet {
    pub sample_rate: u32,
    pub frame_rate_hz: u32,
    pub duration_seconds: f64,
    /// Mel band energies, log-compressed and normalized to 0.0-1.0
    pub spectral_bands: Vec<Vec<f32>>,
    /// 12-bin chroma, max-normalized per frame (all zero for silent frames)
    pub pitch_class_profile: Vec<[f32; PITCH_CLASSES]>,
    /// Onset strength (positive spectral flux), normalized 0.0-1.0
    pub onset_strength: Vec<f32>,
    pub tempo_bpm: f64,
    /// Strictly increasing, in seconds
    pub beat_timestamps: Vec<f64>,
}

impl FeatureSet {
    pub fn frame_count(&self) -> usize {
        self.spectral_bands.len()
    }

    /// Checks the structural invariants the synthesizer relies on.
    /// Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate_hz != FRAME_RATE_HZ {
            return Err(format!(
                "frame rate is {} Hz, expected {} Hz",
                self.frame_rate_hz, FRAME_RATE_HZ
            ));
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds < 0.0 {
            return Err(format!("duration {} is not a valid length", self.duration_seconds));
        }

        let expected = frame_count_for(self.duration_seconds);
        let bands = self.spectral_bands.len();
        let pitch = self.pitch_class_profile.len();
        let onset = self.onset_strength.len();
        if bands != expected || pitch != expected || onset != expected {
            return Err(format!(
                "frame counts disagree: expected {} for {:.3}s, got {} band / {} pitch / {} onset frames",
                expected, self.duration_seconds, bands, pitch, onset
            ));
        }

        for (i, frame) in self.spectral_bands.iter().enumerate() {
            if frame.len() != BAND_COUNT {
                return Err(format!(
                    "band frame {} has {} bands, expected {}",
                    i,
                    frame.len(),
                    BAND_COUNT
                ));
            }
            if frame.iter().any(|v| !v.is_finite()) {
                return Err(format!("band frame {} contains a non-finite value", i));
            }
        }
        if let Some(i) = self
            .pitch_class_profile
            .iter()
            .position(|frame| frame.iter().any(|v| !v.is_finite()))
        {
            return Err(format!("pitch frame {} contains a non-finite value", i));
        }
        if let Some(i) = self.onset_strength.iter().position(|v| !v.is_finite()) {
            return Err(format!("onset frame {} is not finite", i));
        }

        if !self.tempo_bpm.is_finite() || self.tempo_bpm <= 0.0 {
            return Err(format!("tempo {} BPM is not positive", self.tempo_bpm));
        }
        if self.beat_timestamps.iter().any(|b| !b.is_finite()) {
            return Err("beat timestamps contain a non-finite value".into());
        }
        if let Some(w) = self.beat_timestamps.windows(2).find(|w| w[1] <= w[0]) {
            return Err(format!(
                "beat timestamps are not strictly increasing ({:.4}s then {:.4}s)",
                w[0], w[1]
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn flat_features(duration_seconds: f64, tempo_bpm: f64, beats: Vec<f64>) -> FeatureSet {
    let n = frame_count_for(duration_seconds);
    FeatureSet {
        sample_rate: 48_000,
        frame_rate_hz: FRAME_RATE_HZ,
        duration_seconds,
        spectral_bands: vec![vec![0.5; BAND_COUNT]; n],
        pitch_class_profile: vec![[0.0; PITCH_CLASSES]; n],
        onset_strength: vec![0.0; n],
        tempo_bpm,
        beat_timestamps: beats,
    }
}
