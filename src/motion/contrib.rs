//! Per-joint motion layers.
//!
//! Each layer maps the current frame's signals to a rotation offset for one
//! joint. The synthesizer sums [`CONTRIBUTIONS`] in order, then clamps.

use super::skeleton::{JointDef, Region, Side};
use super::style::StyleProfile;
use crate::audio::features::{BAND_COUNT, PITCH_CLASSES};

/// Fraction of a limb's sway added to the favored side (and removed from the other).
const PITCH_SIDE_BIAS: f64 = 0.25;
/// Onset strength that counts as a strong hit.
const ONSET_THRESHOLD: f64 = 0.5;
/// Extra pulse, relative to the beat pulse, at full onset strength.
const ONSET_ACCENT_GAIN: f64 = 0.2;
/// Share of the sway that is present even in silence.
const SWAY_FLOOR: f64 = 0.35;

/// Per-frame signals shared by every joint.
#[derive(Clone, Debug)]
pub struct FrameContext<'a> {
    pub profile: &'a StyleProfile,
    /// Raised-cosine beat envelope in [0, 1]
    pub envelope: f64,
    /// Two-beat sway in [-1, 1]
    pub sway: f64,
    /// Mean energy of the lowest quarter of the bands, [0, 1]
    pub low_energy: f64,
    /// Mean energy of the upper half of the bands, [0, 1]
    pub high_energy: f64,
    pub dominant_pitch: Option<usize>,
    pub onset: f64,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        profile: &'a StyleProfile,
        envelope: f64,
        sway: f64,
        bands: &[f32],
        chroma: &[f32; PITCH_CLASSES],
        onset: f32,
    ) -> Self {
        Self {
            profile,
            envelope,
            sway,
            low_energy: mean(&bands[..BAND_COUNT / 4]),
            high_energy: mean(&bands[BAND_COUNT / 2..]),
            dominant_pitch: dominant_pitch(chroma),
            onset: onset as f64,
        }
    }
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Loudest pitch class, lowest index on ties; `None` for an all-zero frame.
pub fn dominant_pitch(chroma: &[f32; PITCH_CLASSES]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (pc, &v) in chroma.iter().enumerate() {
        if v > 0.0 && best.map_or(true, |(_, b)| v > b) {
            best = Some((pc, v));
        }
    }
    best.map(|(pc, _)| pc)
}

/// A named layer. `apply` gets the frame context, the joint record and its id.
pub struct Contribution {
    pub name: &'static str,
    pub apply: fn(&FrameContext, &JointDef, usize) -> [f64; 3],
}

/// Layers in the order they are summed.
pub const CONTRIBUTIONS: &[Contribution] = &[
    Contribution { name: "rest_pose", apply: rest_pose },
    Contribution { name: "beat_pulse", apply: beat_pulse },
    Contribution { name: "spectral_sway", apply: spectral_sway },
    Contribution { name: "pitch_symmetry", apply: pitch_symmetry },
    Contribution { name: "onset_accent", apply: onset_accent },
];

fn scale(v: [f64; 3], k: f64) -> [f64; 3] {
    [v[0] * k, v[1] * k, v[2] * k]
}

/// Constant resting posture.
pub fn rest_pose(_ctx: &FrameContext, joint: &JointDef, _index: usize) -> [f64; 3] {
    joint.rest
}

/// Shared beat envelope, weighted by style snap and the joint's emphasis.
pub fn beat_pulse(ctx: &FrameContext, joint: &JointDef, index: usize) -> [f64; 3] {
    let p = ctx.profile;
    let k = ctx.envelope * p.beat_snap_strength * p.joint_emphasis[index] * p.base_amplitude;
    scale(joint.pulse, k)
}

/// Slow two-beat sway. Arms and head follow the bright bands, everything
/// else follows the bass.
pub fn spectral_sway(ctx: &FrameContext, joint: &JointDef, _index: usize) -> [f64; 3] {
    let energy = match joint.region {
        Region::Arm | Region::Head => ctx.high_energy,
        Region::Pelvis | Region::Leg | Region::Spine => ctx.low_energy,
    };
    let amplitude = ctx.profile.base_amplitude * (SWAY_FLOOR + (1.0 - SWAY_FLOOR) * energy);
    scale(joint.sway, ctx.sway * amplitude)
}

/// Even dominant pitch classes favor the left limbs, odd ones the right.
pub fn pitch_symmetry(ctx: &FrameContext, joint: &JointDef, index: usize) -> [f64; 3] {
    let Some(pc) = ctx.dominant_pitch else {
        return [0.0; 3];
    };
    let favored = if pc % 2 == 0 { Side::Left } else { Side::Right };
    let bias = match joint.side {
        Side::Center => return [0.0; 3],
        side if side == favored => PITCH_SIDE_BIAS,
        _ => -PITCH_SIDE_BIAS,
    };
    scale(spectral_sway(ctx, joint, index), bias)
}

/// Extra kick on strong onsets.
pub fn onset_accent(ctx: &FrameContext, joint: &JointDef, index: usize) -> [f64; 3] {
    if ctx.onset <= ONSET_THRESHOLD {
        return [0.0; 3];
    }
    let p = ctx.profile;
    let k = ONSET_ACCENT_GAIN * ctx.onset * p.joint_emphasis[index] * p.base_amplitude;
    scale(joint.pulse, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::skeleton::SKELETON;
    use crate::motion::style::Style;

    fn context(profile: &StyleProfile) -> FrameContext<'_> {
        FrameContext {
            profile,
            envelope: 1.0,
            sway: 1.0,
            low_energy: 0.5,
            high_energy: 0.5,
            dominant_pitch: None,
            onset: 0.0,
        }
    }

    fn joint(name: &str) -> (usize, &'static JointDef) {
        let index = SKELETON.joints().iter().position(|j| j.name == name).unwrap();
        (index, SKELETON.joint(index))
    }

    #[test]
    fn layers_run_in_declared_order() {
        let names: Vec<_> = CONTRIBUTIONS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["rest_pose", "beat_pulse", "spectral_sway", "pitch_symmetry", "onset_accent"]
        );
    }

    #[test]
    fn beat_pulse_follows_envelope_and_emphasis() {
        let profile = Style::HipHop.profile(120.0);
        let (i, knee) = joint("L_Knee");
        let mut ctx = context(&profile);
        let full = beat_pulse(&ctx, knee, i);
        assert!((full[1] - knee.pulse[1] * profile.joint_emphasis[i]).abs() < 1e-12);
        ctx.envelope = 0.0;
        assert_eq!(beat_pulse(&ctx, knee, i), [0.0; 3]);
    }

    #[test]
    fn sway_tracks_band_energy_by_region() {
        let profile = Style::Pop.profile(120.0);
        let (si, shoulder) = joint("L_Shoulder");
        let (hi, hip) = joint("L_Hip");
        let mut ctx = context(&profile);
        ctx.high_energy = 1.0;
        ctx.low_energy = 0.0;
        let loud_arm = spectral_sway(&ctx, shoulder, si);
        let quiet_leg = spectral_sway(&ctx, hip, hi);
        assert!((loud_arm[0] - shoulder.sway[0] * profile.base_amplitude).abs() < 1e-12);
        assert!((quiet_leg[0] - hip.sway[0] * profile.base_amplitude * SWAY_FLOOR).abs() < 1e-12);
    }

    #[test]
    fn pitch_parity_picks_a_side() {
        let profile = Style::Pop.profile(120.0);
        let (li, left) = joint("L_Shoulder");
        let (ri, right) = joint("R_Shoulder");
        let (ci, spine) = joint("Spine2");
        let mut ctx = context(&profile);

        ctx.dominant_pitch = Some(4);
        let l = pitch_symmetry(&ctx, left, li);
        let r = pitch_symmetry(&ctx, right, ri);
        let sway_l = spectral_sway(&ctx, left, li);
        assert!((l[0] - PITCH_SIDE_BIAS * sway_l[0]).abs() < 1e-12);
        assert!((r[0] + PITCH_SIDE_BIAS * spectral_sway(&ctx, right, ri)[0]).abs() < 1e-12);
        assert_eq!(pitch_symmetry(&ctx, spine, ci), [0.0; 3]);

        ctx.dominant_pitch = Some(7);
        let l_odd = pitch_symmetry(&ctx, left, li);
        assert!((l_odd[0] + PITCH_SIDE_BIAS * sway_l[0]).abs() < 1e-12);

        ctx.dominant_pitch = None;
        assert_eq!(pitch_symmetry(&ctx, left, li), [0.0; 3]);
    }

    #[test]
    fn onset_accent_needs_a_strong_hit() {
        let profile = Style::House.profile(120.0);
        let (i, head) = joint("Head");
        let mut ctx = context(&profile);
        ctx.onset = 0.5;
        assert_eq!(onset_accent(&ctx, head, i), [0.0; 3]);
        ctx.onset = 1.0;
        let hit = onset_accent(&ctx, head, i);
        assert!(hit[1] > 0.0);
    }

    #[test]
    fn dominant_pitch_prefers_lowest_on_ties() {
        let mut chroma = [0.0f32; PITCH_CLASSES];
        assert_eq!(dominant_pitch(&chroma), None);
        chroma[3] = 1.0;
        chroma[8] = 1.0;
        assert_eq!(dominant_pitch(&chroma), Some(3));
        chroma[11] = 1.5;
        assert_eq!(dominant_pitch(&chroma), Some(11));
    }
}
