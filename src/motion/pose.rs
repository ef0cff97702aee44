/// One animation frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseFrame {
    /// Root position in metres (X, Y, Z)
    pub root_translation: [f64; 3],
    /// Per-joint rotation in degrees, indexed by joint id, channel order Z, X, Y
    pub rotations: Vec<[f64; 3]>,
}

/// A complete animation at a fixed frame rate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseSequence {
    pub frame_rate_hz: u32,
    pub frames: Vec<PoseFrame>,
}

impl PoseSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> f64 {
        if self.frame_rate_hz == 0 {
            return 0.0;
        }
        self.frames.len() as f64 / self.frame_rate_hz as f64
    }

    pub fn frame_time(&self) -> f64 {
        1.0 / self.frame_rate_hz as f64
    }
}
