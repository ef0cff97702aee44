pub mod bvh;
pub mod parse;
