//! Beat clock and the shared beat envelope.
//!
//! The clock maps any time to a continuous beat position (`index + phase`).
//! Between detected beats the local inter-beat interval is used. Before the
//! first and after the last detected beat the grid is extrapolated with the
//! first/last interval. With fewer than two beats the interval comes from the
//! tempo estimate.

use std::f64::consts::PI;

/// Position on the beat grid at some time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatPosition {
    /// Index of the beat at or before the time (may be negative before the first beat)
    pub index: i64,
    /// Fraction of the local interval elapsed since that beat, in [0, 1)
    pub phase: f64,
}

impl BeatPosition {
    /// Continuous beat count.
    pub fn beats(&self) -> f64 {
        self.index as f64 + self.phase
    }
}

#[derive(Clone, Debug)]
pub struct BeatClock<'a> {
    beats: &'a [f64],
    period: f64,
}

impl<'a> BeatClock<'a> {
    /// `beats` must be strictly increasing; `tempo_bpm` must be positive.
    pub fn new(beats: &'a [f64], tempo_bpm: f64) -> Self {
        Self {
            beats,
            period: 60.0 / tempo_bpm,
        }
    }

    pub fn position(&self, time: f64) -> BeatPosition {
        match self.beats {
            [] => grid_position(0.0, self.period, time, 0),
            [only] => grid_position(*only, self.period, time, 0),
            [first, second, ..] if time < *first => grid_position(*first, second - first, time, 0),
            _ => {
                let idx = self.beats.partition_point(|&b| b <= time);
                let last = self.beats.len() - 1;
                if idx > last {
                    let interval = self.beats[last] - self.beats[last - 1];
                    return grid_position(self.beats[last], interval, time, last as i64);
                }
                let prev = self.beats[idx - 1];
                let next = self.beats[idx];
                BeatPosition {
                    index: idx as i64 - 1,
                    phase: ((time - prev) / (next - prev)).clamp(0.0, 1.0 - f64::EPSILON),
                }
            }
        }
    }
}

/// Position on a regular grid anchored at `anchor` (beat number `anchor_index`).
fn grid_position(anchor: f64, interval: f64, time: f64, anchor_index: i64) -> BeatPosition {
    let beats = (time - anchor) / interval;
    let whole = beats.floor();
    BeatPosition {
        index: anchor_index + whole as i64,
        phase: (beats - whole).clamp(0.0, 1.0 - f64::EPSILON),
    }
}

/// Raised-cosine pulse: 1.0 at phase 0 (on the beat), falling monotonically to
/// 0.0 half way between beats, symmetric about the midpoint.
pub fn envelope(phase: f64) -> f64 {
    0.5 * (1.0 + (2.0 * PI * phase).cos())
}

/// Side-to-side sway completing one cycle every two beats, in [-1, 1].
/// Zero on every beat, extreme half way between.
pub fn sway(position: BeatPosition) -> f64 {
    (PI * position.beats()).sin()
}
