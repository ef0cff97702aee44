use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::skeleton::{Region, JOINT_COUNT, SKELETON};
use crate::error::SynthError;

/// Dance style requested by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Auto,
    HipHop,
    Pop,
    Jazz,
    Ballet,
    House,
}

/// Motion multipliers a style resolves to.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleProfile {
    /// Overall scale on every procedural layer
    pub base_amplitude: f64,
    /// Scale on the shared beat envelope
    pub beat_snap_strength: f64,
    /// Per-joint response to the beat envelope, indexed by joint id
    pub joint_emphasis: [f64; JOINT_COUNT],
}

/// Region weights: pelvis, leg, spine, head, arm.
struct Emphasis([f64; 5]);

impl Emphasis {
    fn for_region(&self, region: Region) -> f64 {
        match region {
            Region::Pelvis => self.0[0],
            Region::Leg => self.0[1],
            Region::Spine => self.0[2],
            Region::Head => self.0[3],
            Region::Arm => self.0[4],
        }
    }
}

/// Tempo thresholds for `auto`.
const AUTO_SLOW_BELOW_BPM: f64 = 100.0;
const AUTO_FAST_FROM_BPM: f64 = 130.0;

impl Style {
    pub const ALL: [Style; 6] = [
        Style::Auto,
        Style::HipHop,
        Style::Pop,
        Style::Jazz,
        Style::Ballet,
        Style::House,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Style::Auto => "auto",
            Style::HipHop => "hip-hop",
            Style::Pop => "pop",
            Style::Jazz => "jazz",
            Style::Ballet => "ballet",
            Style::House => "house",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Style::Auto => "pick ballet, pop or hip-hop from the detected tempo",
            Style::HipHop => "hard beat hits, strong head and hip accents",
            Style::Pop => "medium energy, even emphasis across the body",
            Style::Jazz => "loose torso and arms, softer beat snap",
            Style::Ballet => "low amplitude, flowing arms and legs",
            Style::House => "driving footwork, restrained upper body",
        }
    }

    /// Concrete style for `auto` at the given tempo. Other styles return themselves.
    pub fn resolve(self, tempo_bpm: f64) -> Style {
        match self {
            Style::Auto if tempo_bpm < AUTO_SLOW_BELOW_BPM => Style::Ballet,
            Style::Auto if tempo_bpm < AUTO_FAST_FROM_BPM => Style::Pop,
            Style::Auto => Style::HipHop,
            other => other,
        }
    }

    pub fn profile(self, tempo_bpm: f64) -> StyleProfile {
        let (base_amplitude, beat_snap_strength, emphasis) = match self {
            Style::Auto => return self.resolve(tempo_bpm).profile(tempo_bpm),
            Style::HipHop => (1.0, 1.0, Emphasis([1.2, 1.2, 0.9, 1.3, 1.0])),
            Style::Pop => (0.85, 0.75, Emphasis([1.0, 0.9, 0.8, 0.9, 1.0])),
            Style::Jazz => (0.8, 0.65, Emphasis([1.1, 0.8, 1.0, 0.8, 1.15])),
            Style::Ballet => (0.6, 0.4, Emphasis([0.5, 1.0, 0.6, 0.5, 1.1])),
            Style::House => (1.0, 0.9, Emphasis([1.0, 1.4, 0.8, 1.0, 0.8])),
        };

        let mut joint_emphasis = [0.0; JOINT_COUNT];
        for (weight, joint) in joint_emphasis.iter_mut().zip(SKELETON.joints()) {
            *weight = emphasis.for_region(joint.region);
        }

        StyleProfile {
            base_amplitude,
            beat_snap_strength,
            joint_emphasis,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Style {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.label() == s)
            .ok_or_else(|| SynthError::UnknownStyle {
                label: s.to_string(),
                expected: Style::ALL.map(Style::label).join(", "),
            })
    }
}
