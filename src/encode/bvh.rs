//! BVH writer.
//!
//! Consumers map motion columns to joints by position, so the channel order in
//! the MOTION rows must follow the HIERARCHY traversal exactly.

use crate::error::WriteError;
use crate::motion::pose::PoseSequence;
use crate::motion::skeleton::{Skeleton, POSITION_CHANNELS, ROTATION_CHANNELS};

/// Fixed decimal places for every number in the file.
pub const DECIMALS: usize = 6;

/// Serialize `poses` over `skeleton` as BVH text.
pub fn write(skeleton: &Skeleton, poses: &PoseSequence) -> Result<Vec<u8>, WriteError> {
    if poses.is_empty() {
        return Err(WriteError::EmptySequence);
    }
    if poses.frame_rate_hz == 0 {
        return Err(WriteError::InvalidFrameRate(poses.frame_rate_hz));
    }
    for (i, frame) in poses.frames.iter().enumerate() {
        if frame.rotations.len() != skeleton.len() {
            return Err(WriteError::SkeletonMismatch {
                frame: i,
                expected: skeleton.len(),
                found: frame.rotations.len(),
            });
        }
        let finite = frame.root_translation.iter().all(|v| v.is_finite())
            && frame.rotations.iter().flatten().all(|v| v.is_finite());
        if !finite {
            return Err(WriteError::NonFiniteValue { frame: i });
        }
    }

    let order = skeleton.traversal_order();
    let channels = 3 + 3 * order.len();
    let mut out = String::with_capacity(4096 + poses.len() * channels * 12);

    out.push_str("HIERARCHY\n");
    write_joint(&mut out, skeleton, skeleton.root(), 0);

    out.push_str("MOTION\n");
    out.push_str(&format!("Frames: {}\n", poses.len()));
    out.push_str(&format!("Frame Time: {:.*}\n", DECIMALS, poses.frame_time()));

    let mut row: Vec<String> = Vec::with_capacity(channels);
    for frame in &poses.frames {
        row.clear();
        row.extend(frame.root_translation.iter().map(|&v| format_value(v)));
        for &joint in &order {
            row.extend(frame.rotations[joint].iter().map(|&v| format_value(v)));
        }
        out.push_str(&row.join(" "));
        out.push('\n');
    }

    log::info!(
        "BVH: {} joints, {} channels, {} frames",
        order.len(),
        channels,
        poses.len()
    );

    Ok(out.into_bytes())
}

fn write_joint(out: &mut String, skeleton: &Skeleton, index: usize, depth: usize) {
    let indent = "  ".repeat(depth);
    let joint = skeleton.joint(index);
    let keyword = if joint.parent.is_none() { "ROOT" } else { "JOINT" };

    out.push_str(&format!("{}{} {}\n", indent, keyword, joint.name));
    out.push_str(&format!("{}{{\n", indent));
    out.push_str(&format!("{}  OFFSET {}\n", indent, format_triple(joint.offset)));

    if joint.parent.is_none() {
        out.push_str(&format!(
            "{}  CHANNELS 6 {} {}\n",
            indent,
            POSITION_CHANNELS.join(" "),
            ROTATION_CHANNELS.join(" ")
        ));
    } else {
        out.push_str(&format!("{}  CHANNELS 3 {}\n", indent, ROTATION_CHANNELS.join(" ")));
    }

    let mut has_children = false;
    for child in skeleton.children(index) {
        has_children = true;
        write_joint(out, skeleton, child, depth + 1);
    }

    if !has_children {
        let end = joint.end_site.unwrap_or([0.0; 3]);
        out.push_str(&format!("{}  End Site\n", indent));
        out.push_str(&format!("{}  {{\n", indent));
        out.push_str(&format!("{}    OFFSET {}\n", indent, format_triple(end)));
        out.push_str(&format!("{}  }}\n", indent));
    }

    out.push_str(&format!("{}}}\n", indent));
}

fn format_triple(v: [f64; 3]) -> String {
    v.map(format_value).join(" ")
}

/// Fixed-precision number; values that round to zero print without a sign.
fn format_value(v: f64) -> String {
    let s = format!("{:.*}", DECIMALS, v);
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}
