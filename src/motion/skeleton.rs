//! The fixed 24-joint humanoid used for synthesis and export.
//!
//! Joints are stored as a flat table indexed by joint id, in SMPL order.
//! Parents are indices into the same table, so the hierarchy needs no
//! pointers and the whole thing can live in a `static`.

/// Rotation channels as written to BVH. Every rotation triple in this crate
/// is ordered the same way.
pub const ROTATION_CHANNELS: [&str; 3] = ["Zrotation", "Xrotation", "Yrotation"];
/// Translation channels of the root joint.
pub const POSITION_CHANNELS: [&str; 3] = ["Xposition", "Yposition", "Zposition"];

pub const JOINT_COUNT: usize = 24;

/// Rest height of the pelvis above the floor, in metres.
pub const ROOT_REST_HEIGHT: f64 = 1.0;

/// Which side of the body a joint sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Center,
}

/// Coarse body region, used by style emphasis tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Pelvis,
    Leg,
    Spine,
    Head,
    Arm,
}

/// One joint record. Angles are degrees in [`ROTATION_CHANNELS`] order.
#[derive(Clone, Copy, Debug)]
pub struct JointDef {
    pub name: &'static str,
    pub parent: Option<usize>,
    /// Rest offset from the parent joint, metres
    pub offset: [f64; 3],
    /// End Site offset for leaf joints
    pub end_site: Option<[f64; 3]>,
    pub side: Side,
    pub region: Region,
    /// Anatomical limits per channel (min, max)
    pub range: [(f64, f64); 3],
    /// Resting posture
    pub rest: [f64; 3],
    /// Rotation at full beat envelope and unit emphasis
    pub pulse: [f64; 3],
    /// Peak rotation of the slow sway at full band energy
    pub sway: [f64; 3],
}

/// Read-only view over a joint table.
#[derive(Debug)]
pub struct Skeleton {
    joints: &'static [JointDef],
}

impl Skeleton {
    pub fn joints(&self) -> &[JointDef] {
        self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn joint(&self, index: usize) -> &JointDef {
        &self.joints[index]
    }

    pub fn root(&self) -> usize {
        0
    }

    /// Children of `index` in canonical (ascending index) order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, j)| j.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Depth-first, children in canonical order. This is the BVH channel order.
    pub fn traversal_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![self.root()];
        while let Some(index) = stack.pop() {
            order.push(index);
            let children: Vec<usize> = self.children(index).collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }
}

/// The process-wide skeleton.
pub static SKELETON: Skeleton = Skeleton { joints: &JOINTS };

#[allow(clippy::too_many_arguments)]
const fn joint(
    name: &'static str,
    parent: Option<usize>,
    offset: [f64; 3],
    end_site: Option<[f64; 3]>,
    side: Side,
    region: Region,
    range: [(f64, f64); 3],
    rest: [f64; 3],
    pulse: [f64; 3],
    sway: [f64; 3],
) -> JointDef {
    JointDef {
        name,
        parent,
        offset,
        end_site,
        side,
        region,
        range,
        rest,
        pulse,
        sway,
    }
}

use Region::*;
use Side::*;

// name, parent, offset, end site, side, region, range (Z, X, Y), rest, pulse, sway
static JOINTS: [JointDef; JOINT_COUNT] = [
    joint("Pelvis",     None,     [0.0, 0.0, 0.0],       None,                       Center, Pelvis, [(-20.0, 20.0), (-20.0, 20.0), (-35.0, 35.0)], [0.0, 0.0, 0.0],   [0.0, 4.0, 0.0],     [6.0, 0.0, 10.0]),
    joint("L_Hip",      Some(0),  [0.1, -0.05, 0.0],     None,                       Left,   Leg,    [(-30.0, 45.0), (-90.0, 30.0), (-40.0, 40.0)], [0.0, 0.0, 0.0],   [0.0, -12.0, 0.0],   [10.0, -4.0, 0.0]),
    joint("R_Hip",      Some(0),  [-0.1, -0.05, 0.0],    None,                       Right,  Leg,    [(-45.0, 30.0), (-90.0, 30.0), (-40.0, 40.0)], [0.0, 0.0, 0.0],   [0.0, -12.0, 0.0],   [-10.0, -4.0, 0.0]),
    joint("Spine1",     Some(0),  [0.0, 0.1, 0.0],       None,                       Center, Spine,  [(-25.0, 25.0), (-20.0, 35.0), (-30.0, 30.0)], [0.0, 0.0, 0.0],   [0.0, 5.0, 0.0],     [3.0, 0.0, 5.0]),
    joint("L_Knee",     Some(1),  [0.0, -0.4, 0.0],      None,                       Left,   Leg,    [(-5.0, 5.0), (0.0, 120.0), (-5.0, 5.0)],      [0.0, 5.0, 0.0],   [0.0, 20.0, 0.0],    [0.0, 6.0, 0.0]),
    joint("R_Knee",     Some(2),  [0.0, -0.4, 0.0],      None,                       Right,  Leg,    [(-5.0, 5.0), (0.0, 120.0), (-5.0, 5.0)],      [0.0, 5.0, 0.0],   [0.0, 20.0, 0.0],    [0.0, 6.0, 0.0]),
    joint("Spine2",     Some(3),  [0.0, 0.15, 0.0],      None,                       Center, Spine,  [(-20.0, 20.0), (-15.0, 25.0), (-25.0, 25.0)], [0.0, 0.0, 0.0],   [0.0, 3.0, 0.0],     [2.0, 0.0, 4.0]),
    joint("L_Ankle",    Some(4),  [0.0, -0.4, 0.0],      None,                       Left,   Leg,    [(-20.0, 20.0), (-45.0, 30.0), (-15.0, 15.0)], [0.0, 0.0, 0.0],   [0.0, -8.0, 0.0],    [0.0, -2.0, 0.0]),
    joint("R_Ankle",    Some(5),  [0.0, -0.4, 0.0],      None,                       Right,  Leg,    [(-20.0, 20.0), (-45.0, 30.0), (-15.0, 15.0)], [0.0, 0.0, 0.0],   [0.0, -8.0, 0.0],    [0.0, -2.0, 0.0]),
    joint("Spine3",     Some(6),  [0.0, 0.15, 0.0],      None,                       Center, Spine,  [(-20.0, 20.0), (-15.0, 25.0), (-25.0, 25.0)], [0.0, 0.0, 0.0],   [0.0, 2.0, 0.0],     [2.0, 0.0, 3.0]),
    joint("L_Foot",     Some(7),  [0.0, -0.1, 0.1],      Some([0.0, 0.0, 0.08]),     Left,   Leg,    [(-10.0, 10.0), (-20.0, 30.0), (-10.0, 10.0)], [0.0, 0.0, 0.0],   [0.0, 4.0, 0.0],     [0.0, 0.0, 0.0]),
    joint("R_Foot",     Some(8),  [0.0, -0.1, 0.1],      Some([0.0, 0.0, 0.08]),     Right,  Leg,    [(-10.0, 10.0), (-20.0, 30.0), (-10.0, 10.0)], [0.0, 0.0, 0.0],   [0.0, 4.0, 0.0],     [0.0, 0.0, 0.0]),
    joint("Neck",       Some(9),  [0.0, 0.15, 0.0],      None,                       Center, Head,   [(-30.0, 30.0), (-40.0, 40.0), (-50.0, 50.0)], [0.0, 0.0, 0.0],   [0.0, 6.0, 0.0],     [4.0, 0.0, 6.0]),
    joint("L_Collar",   Some(9),  [0.15, 0.05, 0.0],     None,                       Left,   Arm,    [(-15.0, 30.0), (-10.0, 10.0), (-15.0, 15.0)], [0.0, 0.0, 0.0],   [6.0, 0.0, 0.0],     [4.0, 0.0, 0.0]),
    joint("R_Collar",   Some(9),  [-0.15, 0.05, 0.0],    None,                       Right,  Arm,    [(-30.0, 15.0), (-10.0, 10.0), (-15.0, 15.0)], [0.0, 0.0, 0.0],   [-6.0, 0.0, 0.0],    [-4.0, 0.0, 0.0]),
    joint("Head",       Some(12), [0.0, 0.15, 0.0],      Some([0.0, 0.12, 0.0]),     Center, Head,   [(-30.0, 30.0), (-40.0, 40.0), (-60.0, 60.0)], [0.0, 0.0, 0.0],   [0.0, 10.0, 0.0],    [5.0, 0.0, 8.0]),
    joint("L_Shoulder", Some(13), [0.2, 0.0, 0.0],       None,                       Left,   Arm,    [(-90.0, 90.0), (-60.0, 120.0), (-90.0, 90.0)], [-45.0, 0.0, 0.0], [35.0, 15.0, 0.0],   [25.0, 20.0, 10.0]),
    joint("R_Shoulder", Some(14), [-0.2, 0.0, 0.0],      None,                       Right,  Arm,    [(-90.0, 90.0), (-60.0, 120.0), (-90.0, 90.0)], [45.0, 0.0, 0.0],  [-35.0, 15.0, 0.0],  [-25.0, 20.0, -10.0]),
    joint("L_Elbow",    Some(16), [0.25, 0.0, 0.0],      None,                       Left,   Arm,    [(-10.0, 10.0), (-10.0, 10.0), (-140.0, 0.0)],  [0.0, 0.0, -15.0], [0.0, 0.0, -30.0],   [0.0, 0.0, -20.0]),
    joint("R_Elbow",    Some(17), [-0.25, 0.0, 0.0],     None,                       Right,  Arm,    [(-10.0, 10.0), (-10.0, 10.0), (0.0, 140.0)],   [0.0, 0.0, 15.0],  [0.0, 0.0, 30.0],    [0.0, 0.0, 20.0]),
    joint("L_Wrist",    Some(18), [0.25, 0.0, 0.0],      None,                       Left,   Arm,    [(-45.0, 45.0), (-60.0, 60.0), (-30.0, 30.0)], [0.0, 0.0, 0.0],   [10.0, 0.0, 0.0],    [8.0, 10.0, 0.0]),
    joint("R_Wrist",    Some(19), [-0.25, 0.0, 0.0],     None,                       Right,  Arm,    [(-45.0, 45.0), (-60.0, 60.0), (-30.0, 30.0)], [0.0, 0.0, 0.0],   [-10.0, 0.0, 0.0],   [-8.0, 10.0, 0.0]),
    joint("L_Hand",     Some(20), [0.1, 0.0, 0.0],       Some([0.08, 0.0, 0.0]),     Left,   Arm,    [(-20.0, 20.0), (-20.0, 20.0), (-20.0, 20.0)], [0.0, 0.0, 0.0],   [5.0, 0.0, 0.0],     [4.0, 0.0, 0.0]),
    joint("R_Hand",     Some(21), [-0.1, 0.0, 0.0],      Some([-0.08, 0.0, 0.0]),    Right,  Arm,    [(-20.0, 20.0), (-20.0, 20.0), (-20.0, 20.0)], [0.0, 0.0, 0.0],   [-5.0, 0.0, 0.0],    [-4.0, 0.0, 0.0]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_24_joints_with_single_root() {
        assert_eq!(SKELETON.len(), JOINT_COUNT);
        let roots: Vec<_> = SKELETON.joints().iter().filter(|j| j.parent.is_none()).collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "Pelvis");
    }

    #[test]
    fn parents_precede_children() {
        for (i, j) in SKELETON.joints().iter().enumerate() {
            if let Some(p) = j.parent {
                assert!(p < i, "{} has parent {} after it", j.name, p);
            }
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = SKELETON.joints().iter().map(|j| j.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), JOINT_COUNT);
    }

    #[test]
    fn traversal_visits_every_joint_once() {
        let order = SKELETON.traversal_order();
        assert_eq!(order.len(), JOINT_COUNT);
        let names: Vec<_> = order.iter().map(|&i| SKELETON.joint(i).name).collect();
        assert_eq!(
            &names[..6],
            &["Pelvis", "L_Hip", "L_Knee", "L_Ankle", "L_Foot", "R_Hip"]
        );
        assert_eq!(names[9], "Spine1");
        assert_eq!(names[23], "R_Hand");
    }

    #[test]
    fn end_sites_only_on_leaves() {
        for i in 0..SKELETON.len() {
            let is_leaf = SKELETON.children(i).next().is_none();
            assert_eq!(SKELETON.joint(i).end_site.is_some(), is_leaf, "{}", SKELETON.joint(i).name);
        }
    }

    #[test]
    fn rest_pose_lies_within_range() {
        for j in SKELETON.joints() {
            for axis in 0..3 {
                let (lo, hi) = j.range[axis];
                assert!(lo < hi);
                assert!(j.rest[axis] >= lo && j.rest[axis] <= hi, "{} axis {}", j.name, axis);
            }
        }
    }

    #[test]
    fn children_in_index_order() {
        let pelvis: Vec<_> = SKELETON.children(0).collect();
        assert_eq!(pelvis, vec![1, 2, 3]);
        let spine3: Vec<_> = SKELETON.children(9).collect();
        assert_eq!(spine3, vec![12, 13, 14]);
    }
}
