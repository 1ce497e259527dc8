//! Core state types for the carrier drift simulation.
//!
//! - `Carrier`     a point charge (electron or hole) in the device volume
//! - `CarrierType` derived from the sign of the charge, never stored
//!
//! Positions are in micrometers, velocities in um/s, forces in N.

use std::fmt;

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarrierType {
    Electron,
    Hole,
}

impl CarrierType {
    /// Negative charge is an electron, everything else is a hole
    pub fn from_charge(charge: f64) -> Self {
        if charge < 0.0 {
            CarrierType::Electron
        } else {
            CarrierType::Hole
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CarrierType::Electron => "Electron",
            CarrierType::Hole => "Hole",
        }
    }
}

impl fmt::Display for CarrierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Carrier {
    pub index: usize, // unique key within a population
    charge: f64, // signed charge (C)
    pub mass: f64, // effective mass (kg)
    pub x: NVec3, // position (um)
    pub v: NVec3, // velocity (um/s)
    pub f: NVec3, // accumulated force (N)
    pub outside_steps: u32, // consecutive drifts spent outside the device box
}

impl Carrier {
    pub fn new(index: usize, charge: f64, x: NVec3, v: NVec3, mass: f64) -> Self {
        Self {
            index,
            charge,
            mass,
            x,
            v,
            f: NVec3::zeros(),
            outside_steps: 0,
        }
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn set_charge(&mut self, charge: f64) {
        self.charge = charge;
    }

    pub fn carrier_type(&self) -> CarrierType {
        CarrierType::from_charge(self.charge)
    }

    pub fn is_electron(&self) -> bool {
        self.carrier_type() == CarrierType::Electron
    }

    /// Human readable identifier, e.g. `[12]Electron`
    pub fn id(&self) -> String {
        format!("[{}]{}", self.index, self.carrier_type())
    }

    /// NaN or infinite in any coordinate
    pub fn has_non_finite_position(&self) -> bool {
        !self.x.iter().all(|c| c.is_finite())
    }

    /// Multi-line dump used when a carrier fails numerically
    pub fn describe(&self) -> String {
        format!(
            "Carrier {}\n  Force (N): ({}, {}, {})\n  Velocity (um/s): ({}, {}, {})\n  Position (um): ({}, {}, {})",
            self.id(),
            self.f.x, self.f.y, self.f.z,
            self.v.x, self.v.y, self.v.z,
            self.x.x, self.x.y, self.x.z,
        )
    }
}
