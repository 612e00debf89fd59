//! Value types the animation engine knows how to interpolate.

mod color;

pub use color::*;

pub type Vector3 = glam::DVec3;
pub type Vector4 = glam::DVec4;
pub type Quaternion = glam::DQuat;
