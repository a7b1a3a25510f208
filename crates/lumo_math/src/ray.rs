use crate::Vec3;

/// A ray in 3D space, `P(t) = origin + t * direction` for `t >= 0`.
///
/// The reciprocal of the direction and its per-axis signs are computed once
/// here, so every bounding box test along the ray reuses them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized direction of the ray
    pub direction: Vec3,
    /// Componentwise inverse of the direction.
    /// Zero components become infinities carrying the sign of the zero.
    pub inv_direction: Vec3,
    /// Per-axis sign bit of the direction (`-0.0` counts as negative)
    pub dir_is_neg: [bool; 3],
}

impl Ray {
    /// Create a new ray. The direction is normalized and must not be zero.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            dir_is_neg: [
                direction.x.is_sign_negative(),
                direction.y.is_sign_negative(),
                direction.z.is_sign_negative(),
            ],
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the (unit length) direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
