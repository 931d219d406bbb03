/// A value a [`KeyframeTrack`](crate::animation::tracks::KeyframeTrack) can
/// interpolate between keys.
pub trait Interpolatable: Copy + Sized {
    /// The tangent used when a key is inserted without explicit tangents.
    fn zero_tangent() -> Self;

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    /// Cubic Hermite blend; tangents are per second and scaled by `dt`.
    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self;
}

impl Interpolatable for f32 {
    fn zero_tangent() -> Self {
        0.0
    }

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let t2 = t * t;
        let t3 = t2 * t;

        let s2 = -2.0 * t3 + 3.0 * t2;
        let s3 = t3 - t2;
        let s0 = 1.0 - s2;
        let s1 = s3 - t2 + t;

        let m0 = out_tangent0 * dt;
        let m1 = in_tangent1 * dt;

        s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1
    }
}
