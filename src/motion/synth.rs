use std::f64::consts::PI;

use super::beat::{self, BeatClock};
use super::contrib::{FrameContext, CONTRIBUTIONS};
use super::pose::{PoseFrame, PoseSequence};
use super::skeleton::{Skeleton, ROOT_REST_HEIGHT, SKELETON};
use super::style::Style;
use crate::audio::features::FeatureSet;
use crate::error::SynthError;

/// Largest per-frame change of any rotation channel, degrees.
pub const MAX_DEGREES_PER_FRAME: f64 = 6.0;
/// Largest root displacement from its rest position on any axis, metres.
pub const MAX_ROOT_DISPLACEMENT: f64 = 0.12;

/// Peak side sway of the root at full amplitude, metres.
const ROOT_SWAY: f64 = 0.07;
/// Peak downward bounce of the root on a beat, metres.
const ROOT_BOUNCE: f64 = 0.05;
/// Peak forward/back drift, metres; one cycle every eight beats.
const ROOT_DRIFT: f64 = 0.03;

/// Build the animation for `features` in the given style.
///
/// Deterministic: the same input always yields the same bits.
pub fn synthesize(features: &FeatureSet, style: Style) -> Result<PoseSequence, SynthError> {
    features.validate().map_err(SynthError::InvalidFeatureSet)?;

    let skeleton: &Skeleton = &SKELETON;
    let profile = style.profile(features.tempo_bpm);
    let clock = BeatClock::new(&features.beat_timestamps, features.tempo_bpm);
    let frame_rate = features.frame_rate_hz as f64;
    let total_frames = features.frame_count();

    log::info!(
        "Synthesizing {} frames, style {} (resolved {}), amplitude {:.2}, snap {:.2}",
        total_frames,
        style,
        style.resolve(features.tempo_bpm),
        profile.base_amplitude,
        profile.beat_snap_strength
    );
    log::debug!(
        "Layers: {}",
        CONTRIBUTIONS.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
    );

    let mut frames: Vec<PoseFrame> = Vec::with_capacity(total_frames);
    let mut previous: Option<Vec<[f64; 3]>> = None;

    for i in 0..total_frames {
        let time = i as f64 / frame_rate;
        let position = clock.position(time);
        let envelope = beat::envelope(position.phase);
        let sway = beat::sway(position);

        let ctx = FrameContext::new(
            &profile,
            envelope,
            sway,
            &features.spectral_bands[i],
            &features.pitch_class_profile[i],
            features.onset_strength[i],
        );

        let rotations: Vec<[f64; 3]> = skeleton
            .joints()
            .iter()
            .enumerate()
            .map(|(index, joint)| {
                let mut target = [0.0; 3];
                for layer in CONTRIBUTIONS {
                    let offset = (layer.apply)(&ctx, joint, index);
                    for axis in 0..3 {
                        target[axis] += offset[axis];
                    }
                }

                let mut out = [0.0; 3];
                for axis in 0..3 {
                    let (lo, hi) = joint.range[axis];
                    let clamped = target[axis].clamp(lo, hi);
                    out[axis] = match &previous {
                        Some(prev) => {
                            let last = prev[index][axis];
                            let step = (clamped - last).clamp(-MAX_DEGREES_PER_FRAME, MAX_DEGREES_PER_FRAME);
                            (last + step).clamp(lo, hi)
                        }
                        None => clamped,
                    };
                }
                out
            })
            .collect();

        let root_translation = root_translation(
            profile.base_amplitude,
            profile.beat_snap_strength,
            envelope,
            sway,
            position.beats(),
        );

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "frame {}: beat {:.3}, envelope {:.3}, root {:?}",
                i,
                position.beats(),
                envelope,
                root_translation
            );
        }

        previous = Some(rotations.clone());
        frames.push(PoseFrame {
            root_translation,
            rotations,
        });
    }

    Ok(PoseSequence {
        frame_rate_hz: features.frame_rate_hz,
        frames,
    })
}

/// Bounce on the beat, sway over two beats, slow drift over eight.
fn root_translation(amplitude: f64, snap: f64, envelope: f64, sway: f64, beats: f64) -> [f64; 3] {
    let offset = [
        ROOT_SWAY * amplitude * sway,
        -ROOT_BOUNCE * amplitude * snap * envelope,
        ROOT_DRIFT * amplitude * (PI * beats / 4.0).sin(),
    ];
    let bounded = offset.map(|d| d.clamp(-MAX_ROOT_DISPLACEMENT, MAX_ROOT_DISPLACEMENT));
    [bounded[0], ROOT_REST_HEIGHT + bounded[1], bounded[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::{flat_features, BAND_COUNT, DEFAULT_TEMPO_BPM, PITCH_CLASSES};
    use crate::motion::skeleton::JOINT_COUNT;

    fn varied_features(seconds: f64) -> FeatureSet {
        let beats: Vec<f64> = (0..(seconds * 2.2) as usize).map(|k| 0.2 + k as f64 * 0.45).collect();
        let mut f = flat_features(seconds, 133.0, beats);
        for (i, frame) in f.spectral_bands.iter_mut().enumerate() {
            for (b, v) in frame.iter_mut().enumerate() {
                *v = (((i * 7 + b * 3) % 100) as f32) / 100.0;
            }
        }
        for (i, frame) in f.pitch_class_profile.iter_mut().enumerate() {
            frame[(i / 20) % PITCH_CLASSES] = 1.0;
        }
        for (i, v) in f.onset_strength.iter_mut().enumerate() {
            *v = if i % 27 == 0 { 1.0 } else { 0.1 };
        }
        f
    }

    #[test]
    fn frame_count_and_joint_completeness() {
        let features = varied_features(3.0);
        let poses = synthesize(&features, Style::Auto).unwrap();
        assert_eq!(poses.len(), 180);
        assert_eq!(poses.frame_rate_hz, 60);
        assert!(poses.frames.iter().all(|f| f.rotations.len() == JOINT_COUNT));
    }

    #[test]
    fn deterministic_output() {
        let features = varied_features(2.0);
        for style in Style::ALL {
            let a = synthesize(&features, style).unwrap();
            let b = synthesize(&features, style).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn rotations_stay_in_anatomical_range() {
        let features = varied_features(4.0);
        for style in Style::ALL {
            let poses = synthesize(&features, style).unwrap();
            for frame in &poses.frames {
                for (joint, rot) in SKELETON.joints().iter().zip(&frame.rotations) {
                    for axis in 0..3 {
                        let (lo, hi) = joint.range[axis];
                        assert!(rot[axis] >= lo && rot[axis] <= hi, "{} axis {} = {}", joint.name, axis, rot[axis]);
                    }
                }
            }
        }
    }

    #[test]
    fn angular_velocity_is_bounded() {
        let features = varied_features(4.0);
        for style in Style::ALL {
            let poses = synthesize(&features, style).unwrap();
            for pair in poses.frames.windows(2) {
                for (a, b) in pair[0].rotations.iter().zip(&pair[1].rotations) {
                    for axis in 0..3 {
                        assert!((b[axis] - a[axis]).abs() <= MAX_DEGREES_PER_FRAME + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn root_stays_within_displacement_bound() {
        let features = varied_features(4.0);
        let poses = synthesize(&features, Style::HipHop).unwrap();
        for frame in &poses.frames {
            let [x, y, z] = frame.root_translation;
            assert!(x.abs() <= MAX_ROOT_DISPLACEMENT);
            assert!((y - ROOT_REST_HEIGHT).abs() <= MAX_ROOT_DISPLACEMENT);
            assert!(z.abs() <= MAX_ROOT_DISPLACEMENT);
        }
    }

    #[test]
    fn root_dips_on_beats() {
        let features = flat_features(2.0, 120.0, vec![0.5, 1.0, 1.5]);
        let poses = synthesize(&features, Style::Pop).unwrap();
        let height = |frame: usize| poses.frames[frame].root_translation[1];
        // Beat at 1.0s is frame 60, half way to the next beat is frame 75
        assert!(height(60) < height(59));
        assert!(height(60) < height(61));
        assert!(height(60) < height(75));
    }

    #[test]
    fn silent_features_still_animate() {
        let mut features = flat_features(2.0, DEFAULT_TEMPO_BPM, vec![]);
        for frame in &mut features.spectral_bands {
            *frame = vec![0.0; BAND_COUNT];
        }
        let poses = synthesize(&features, Style::Auto).unwrap();
        assert_eq!(poses.len(), 120);
        let shoulder = SKELETON.joints().iter().position(|j| j.name == "L_Shoulder").unwrap();
        let first = poses.frames[0].rotations[shoulder];
        let moved = poses.frames.iter().any(|f| f.rotations[shoulder] != first);
        assert!(moved);
    }

    #[test]
    fn invalid_features_are_rejected() {
        let mut features = flat_features(1.0, 120.0, vec![]);
        features.pitch_class_profile.truncate(10);
        assert!(matches!(
            synthesize(&features, Style::Pop),
            Err(SynthError::InvalidFeatureSet(_))
        ));
    }

    #[test]
    fn style_changes_motion() {
        let features = varied_features(2.0);
        let ballet = synthesize(&features, Style::Ballet).unwrap();
        let house = synthesize(&features, Style::House).unwrap();
        assert_ne!(ballet, house);
    }
}
