use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// The box is stored as its two extreme corners. The empty box has
/// `p_min = +inf` and `p_max = -inf` on every axis, so it is the identity
/// of [`Bounds3::union`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds3 {
    pub p_min: Vec3,
    pub p_max: Vec3,
}

impl Bounds3 {
    /// An empty box (contains nothing).
    pub const EMPTY: Bounds3 = Bounds3 {
        p_min: Vec3::INFINITY,
        p_max: Vec3::NEG_INFINITY,
    };

    /// A box around a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { p_min: p, p_max: p }
    }

    /// Create a box from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            p_min: a.min(b),
            p_max: a.max(b),
        }
    }

    /// True for a box that contains no point.
    pub fn is_empty(&self) -> bool {
        self.p_min.cmpgt(self.p_max).any()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Bounds3) -> Bounds3 {
        Bounds3 {
            p_min: self.p_min.min(other.p_min),
            p_max: self.p_max.max(other.p_max),
        }
    }

    /// Smallest box containing this box and the point.
    pub fn union_point(&self, p: Vec3) -> Bounds3 {
        Bounds3 {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }

    /// Overlapping region of two boxes (empty if they do not overlap).
    pub fn intersect(&self, other: &Bounds3) -> Bounds3 {
        Bounds3 {
            p_min: self.p_min.max(other.p_min),
            p_max: self.p_max.min(other.p_max),
        }
    }

    pub fn diagonal(&self) -> Vec3 {
        self.p_max - self.p_min
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        0.5 * self.p_min + 0.5 * self.p_max
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    ///
    /// Ties go to the earlier axis.
    pub fn max_extent(&self) -> usize {
        let d = self.diagonal();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Position of `p` relative to the box corners, 0 at `p_min` and 1 at `p_max`
    /// on every axis with nonzero extent.
    pub fn offset(&self, p: Vec3) -> Vec3 {
        let mut o = p - self.p_min;
        let d = self.diagonal();
        for axis in 0..3 {
            if d[axis] > 0.0 {
                o[axis] /= d[axis];
            }
        }
        o
    }

    /// Inclusive point membership test.
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.p_min).all() && p.cmple(self.p_max).all()
    }

    pub fn overlaps(&self, other: &Bounds3) -> bool {
        self.p_max.cmpge(other.p_min).all() && self.p_min.cmple(other.p_max).all()
    }

    /// Slab test of a ray against the box.
    ///
    /// `inv_dir` is the componentwise reciprocal of the ray direction and
    /// `dir_is_neg` its per-axis sign. Zero direction components rely on
    /// IEEE-754 infinities. Boxes lying entirely behind the origin are misses.
    #[inline]
    pub fn intersect_p(&self, ray: &Ray, inv_dir: Vec3, dir_is_neg: [bool; 3]) -> bool {
        let t0 = (self.p_min - ray.origin) * inv_dir;
        let t1 = (self.p_max - ray.origin) * inv_dir;

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        for axis in 0..3 {
            let (near, far) = if dir_is_neg[axis] {
                (t1[axis], t0[axis])
            } else {
                (t0[axis], t1[axis])
            };
            t_enter = t_enter.max(near);
            t_exit = t_exit.min(far);
        }

        t_enter < t_exit && t_exit >= 0.0
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}
