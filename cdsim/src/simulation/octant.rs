//! # Octant
//!
//! Axis-aligned box used as the spatial domain of one octree node. An
//! octant is described by its `center` and per-axis `length`; it never
//! changes after construction. Subdividing an octant yields 8 children of
//! half the extent whose centers sit a quarter-extent away from the parent
//! center along each axis.
//!
//! ## Octant codes
//!
//! A point is classified relative to the center with one bit per axis:
//!
//! - Bit 0 (value 1): x >= center.x
//! - Bit 1 (value 2): y >= center.y
//! - Bit 2 (value 4): z >= center.z
//!
//! so code 0 is the all-negative child and code 7 the all-positive one.
//! The classic node names are kept as labels for the 8 codes:
//!
//! | code | name  | x | y | z |
//! |------|-------|---|---|---|
//! | 0    | `uNE` | - | - | - |
//! | 1    | `uNW` | + | - | - |
//! | 2    | `uSE` | - | + | - |
//! | 3    | `uSW` | + | + | - |
//! | 4    | `lNE` | - | - | + |
//! | 5    | `lNW` | + | - | + |
//! | 6    | `lSE` | - | + | + |
//! | 7    | `lSW` | + | + | + |
//!
//! Ties (a component exactly on the center plane) go to the upper half,
//! which matches [`Octant::contains`] being closed on the low side and
//! open on the high side.

use crate::simulation::states::NVec3;

/// Labels for the 8 child codes, indexed by code
pub const OCTANT_NAMES: [&str; 8] = ["uNE", "uNW", "uSE", "uSW", "lNE", "lNW", "lSE", "lSW"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Octant {
    center: NVec3,
    length: NVec3,
}

impl Octant {
    pub fn new(center: NVec3, length: NVec3) -> Self {
        Self { center, length }
    }

    /// Octant spanning `[min, max]` on every axis
    pub fn from_bounds(min: NVec3, max: NVec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            length: max - min,
        }
    }

    /// Smallest octant enclosing `base` and every point in `points`.
    ///
    /// The upper bound is nudged outward so the largest point still
    /// satisfies the half-open [`Octant::contains`].
    pub fn enclosing<'a, I>(base: &Octant, points: I) -> Self
    where
        I: IntoIterator<Item = &'a NVec3>,
    {
        let mut min = base.min();
        let mut max = base.max();

        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }

        let span = (max - min).max().max(1.0);
        let pad = span * 1e-9;
        max.add_scalar_mut(pad);

        Self::from_bounds(min, max)
    }

    pub fn center(&self) -> NVec3 {
        self.center
    }

    pub fn length(&self) -> NVec3 {
        self.length
    }

    pub fn min(&self) -> NVec3 {
        self.center - self.length * 0.5
    }

    pub fn max(&self) -> NVec3 {
        self.center + self.length * 0.5
    }

    /// Longest side, used as the node size in the Barnes-Hut criterion
    pub fn max_side(&self) -> f64 {
        self.length.x.max(self.length.y).max(self.length.z)
    }

    pub fn volume(&self) -> f64 {
        self.length.x * self.length.y * self.length.z
    }

    /// Half-open containment `[center - length/2, center + length/2)` on all axes
    pub fn contains(&self, p: &NVec3) -> bool {
        let lo = self.min();
        let hi = self.max();
        (0..3).all(|k| p[k] >= lo[k] && p[k] < hi[k])
    }

    /// Which of the 8 children `p` falls into (see the module table)
    pub fn octant_code(&self, p: &NVec3) -> usize {
        let rel = p - self.center;
        let mut code = 0;

        if rel.x >= 0.0 { code |= 1; } // bit 0
        if rel.y >= 0.0 { code |= 2; } // bit 1
        if rel.z >= 0.0 { code |= 4; } // bit 2

        code
    }

    /// Geometry of child `code` (0..8)
    pub fn child(&self, code: usize) -> Octant {
        debug_assert!(code < 8, "octant code out of range: {code}");
        let quarter = self.length * 0.25;
        let sign = |bit: usize| if code & bit == 0 { -1.0 } else { 1.0 };

        let offset = NVec3::new(sign(1) * quarter.x, sign(2) * quarter.y, sign(4) * quarter.z);

        Octant {
            center: self.center + offset,
            length: self.length * 0.5,
        }
    }

    pub fn children(&self) -> [Octant; 8] {
        std::array::from_fn(|code| self.child(code))
    }

    pub fn une(&self) -> Octant { self.child(0) }
    pub fn unw(&self) -> Octant { self.child(1) }
    pub fn use_(&self) -> Octant { self.child(2) }
    pub fn usw(&self) -> Octant { self.child(3) }
    pub fn lne(&self) -> Octant { self.child(4) }
    pub fn lnw(&self) -> Octant { self.child(5) }
    pub fn lse(&self) -> Octant { self.child(6) }
    pub fn lsw(&self) -> Octant { self.child(7) }

    /// Volume shared by two octants (0 if they only touch)
    pub fn overlap_volume(&self, other: &Octant) -> f64 {
        let lo = self.min().sup(&other.min());
        let hi = self.max().inf(&other.max());
        let d = hi - lo;
        if d.x <= 0.0 || d.y <= 0.0 || d.z <= 0.0 {
            return 0.0;
        }
        d.x * d.y * d.z
    }
}
