//! Device boundary box and electrode crossing tests.
//!
//! The anode plane is `z = z_start`, the cathode plane `z = z_end`. The
//! lateral extent is the x/y rectangle of the box.

use crate::error::{Result, SimError};
use crate::simulation::constants::LEN_SCALE;
use crate::simulation::octant::Octant;
use crate::simulation::states::{Carrier, NVec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceBox {
    pub x_start: f64, // all bounds in um
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
    pub z_start: f64, // anode plane
    pub z_end: f64, // cathode plane
}

impl DeviceBox {
    pub fn new(x: [f64; 2], y: [f64; 2], z: [f64; 2]) -> Self {
        Self {
            x_start: x[0],
            x_end: x[1],
            y_start: y[0],
            y_end: y[1],
            z_start: z[0],
            z_end: z[1],
        }
    }

    /// Positive extent on every axis
    pub fn is_valid(&self) -> bool {
        self.x_end > self.x_start && self.y_end > self.y_start && self.z_end > self.z_start
    }

    /// Strict containment on all three axes
    pub fn is_inside(&self, p: &NVec3) -> bool {
        p.x > self.x_start && p.x < self.x_end
            && p.y > self.y_start && p.y < self.y_end
            && p.z > self.z_start && p.z < self.z_end
    }

    /// Inclusive containment in the x/y rectangle
    pub fn within_lateral(&self, p: &NVec3) -> bool {
        p.x >= self.x_start && p.x <= self.x_end && p.y >= self.y_start && p.y <= self.y_end
    }

    /// Whether the move `prev -> cur` reached an electrode.
    ///
    /// A carrier whose previous position already lies beyond an electrode
    /// plane (inside the lateral extent) counts as collected. Otherwise the
    /// segment is intersected with both planes and the crossing point must
    /// fall within the lateral extent.
    ///
    /// Having neither endpoint inside the lateral extent is an invariant
    /// violation and returns [`SimError::OutsideLateralExtent`].
    pub fn is_collectable(&self, carrier: &Carrier, prev: &NVec3) -> Result<bool> {
        let cur = &carrier.x;

        if !self.within_lateral(prev) && !self.within_lateral(cur) {
            return Err(SimError::OutsideLateralExtent {
                index: carrier.index,
                x: cur.x,
                y: cur.y,
                z: cur.z,
            });
        }

        if self.within_lateral(prev) && (prev.z < self.z_start || prev.z > self.z_end) {
            return Ok(true);
        }

        Ok(self.crosses_plane(prev, cur, self.z_start) || self.crosses_plane(prev, cur, self.z_end))
    }

    /// Segment `a -> b` meets the plane `z = z_plane` inside the lateral extent
    pub fn crosses_plane(&self, a: &NVec3, b: &NVec3, z_plane: f64) -> bool {
        let dz = b.z - a.z;
        if dz == 0.0 {
            return false;
        }

        let t = (z_plane - a.z) / dz;
        if !(0.0..=1.0).contains(&t) {
            return false;
        }

        let hit = a + (b - a) * t;
        self.within_lateral(&hit)
    }

    /// Anode to cathode distance (m)
    pub fn thickness_m(&self) -> f64 {
        (self.z_end - self.z_start) / LEN_SCALE
    }

    /// Box volume (cm^3)
    pub fn volume_cm3(&self) -> f64 {
        // um -> cm is 1e-4 per axis
        ((self.x_end - self.x_start) * 1e-4)
            * ((self.y_end - self.y_start) * 1e-4)
            * ((self.z_end - self.z_start) * 1e-4)
    }

    /// Box volume (m^3)
    pub fn volume_m3(&self) -> f64 {
        self.volume_cm3() * 1e-6
    }

    pub fn octant(&self) -> Octant {
        Octant::from_bounds(
            NVec3::new(self.x_start, self.y_start, self.z_start),
            NVec3::new(self.x_end, self.y_end, self.z_end),
        )
    }
}

impl Default for DeviceBox {
    fn default() -> Self {
        Self::new([-10000.0, 10000.0], [-10000.0, 10000.0], [0.0, 500.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab() -> DeviceBox {
        DeviceBox::new([-10.0, 10.0], [-10.0, 10.0], [0.0, 5.0])
    }

    #[test]
    fn crossing_inside_lateral_extent() {
        let b = slab();
        let a = NVec3::new(0.0, 0.0, 1.0);
        let c = NVec3::new(1.0, 1.0, -1.0);
        assert!(b.crosses_plane(&a, &c, 0.0));
        assert!(!b.crosses_plane(&a, &c, 5.0));
    }

    #[test]
    fn crossing_outside_lateral_extent_is_rejected() {
        let b = slab();
        let a = NVec3::new(9.0, 0.0, 1.0);
        let c = NVec3::new(13.0, 0.0, -1.0);
        // meets z = 0 at x = 11
        assert!(!b.crosses_plane(&a, &c, 0.0));
    }

    #[test]
    fn flat_segment_never_crosses() {
        let b = slab();
        let a = NVec3::new(0.0, 0.0, 1.0);
        let c = NVec3::new(3.0, 0.0, 1.0);
        assert!(!b.crosses_plane(&a, &c, 0.0));
    }

    #[test]
    fn volume_units() {
        let b = DeviceBox::new([0.0, 100.0], [0.0, 100.0], [0.0, 100.0]);
        assert!((b.volume_cm3() - 1e-6).abs() < 1e-18);
        assert!((b.thickness_m() - 1e-4).abs() < 1e-18);
    }
}
