use tempo_geometry::{Color, Quaternion, Vector3, Vector4};

/// A value that can be blended between a start and an end value.
///
/// `t` is not restricted to `[0, 1]`: eased ratios overshoot, so implementations must extrapolate
/// linearly instead of clamping.
pub trait Interpolatable: Clone + Send + 'static {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self;
}

// `from * (1 - t) + to * t` hits both ends exactly, `from + (to - from) * t` does not at `t = 1`.

impl Interpolatable for f32 {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        let t = t as f32;
        from * (1.0 - t) + to * t
    }
}

impl Interpolatable for f64 {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        from * (1.0 - t) + to * t
    }
}

impl Interpolatable for Vector3 {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        let x = interpolate(&from.x, &to.x, t);
        let y = interpolate(&from.y, &to.y, t);
        let z = interpolate(&from.z, &to.z, t);
        (x, y, z).into()
    }
}

impl Interpolatable for Color {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        let t = t as f32;
        *from * (1.0 - t) + *to * t
    }
}

/// Normalized linear interpolation along the shorter arc.
///
/// This is not slerp: angular velocity is not constant over `t`.
impl Interpolatable for Quaternion {
    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        let from = Vector4::from(*from);
        let mut to = Vector4::from(*to);
        if from.dot(to) < 0.0 {
            to = -to;
        }
        let blended = from + (to - from) * t;
        Quaternion::from_vec4(blended.normalize_or(from))
    }
}

pub fn interpolate<T>(from: &T, to: &T, t: f64) -> T
where
    T: Interpolatable,
{
    T::interpolate(from, to, t)
}
