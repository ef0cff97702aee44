pub mod beat;
pub mod contrib;
pub mod pose;
pub mod skeleton;
pub mod style;
pub mod synth;
