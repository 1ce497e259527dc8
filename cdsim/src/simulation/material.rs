//! Built-in material table.
//!
//! Band, lifetime and Auger parameters for silicon follow the Silvaco
//! Atlas defaults; insulators only carry a permittivity.

use crate::error::{Result, SimError};
use crate::simulation::constants::{K_B_EV, M_ELEC};

/// Semiconductor-only parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemiconductorParams {
    pub taun0: f64, // SRH electron lifetime (s)
    pub taup0: f64, // SRH hole lifetime (s)
    pub augn: f64, // Auger coefficient, electrons (cm^6/s)
    pub augp: f64, // Auger coefficient, holes (cm^6/s)
    pub nc300: f64, // conduction band DOS at 300 K (cm^-3)
    pub nv300: f64, // valence band DOS at 300 K (cm^-3)
    pub eg300: f64, // band gap at 300 K (eV)
    pub eg_alpha: f64, // band gap temperature coefficients
    pub eg_beta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub eps_r: f64, // relative permittivity
    pub semiconductor: Option<SemiconductorParams>,
}

impl Material {
    pub fn silicon() -> Self {
        Self {
            name: "Silicon".into(),
            eps_r: 11.8,
            semiconductor: Some(SemiconductorParams {
                taun0: 1.0e-7,
                taup0: 1.0e-7,
                augn: 2.8e-31,
                augp: 9.9e-32,
                nc300: 2.8e19,
                nv300: 1.04e19,
                eg300: 1.08,
                eg_alpha: 4.73e-4,
                eg_beta: 636.0,
            }),
        }
    }

    pub fn sio2() -> Self {
        Self::insulator("SiO2", 3.9)
    }

    pub fn si3n4() -> Self {
        Self::insulator("Si3N4", 7.5)
    }

    pub fn vacuum() -> Self {
        Self::insulator("Vacuum", 1.0)
    }

    fn insulator(name: &str, eps_r: f64) -> Self {
        Self {
            name: name.into(),
            eps_r,
            semiconductor: None,
        }
    }

    /// Case-insensitive lookup by name
    pub fn lookup(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "silicon" | "si" => Ok(Self::silicon()),
            "sio2" => Ok(Self::sio2()),
            "si3n4" => Ok(Self::si3n4()),
            "vacuum" => Ok(Self::vacuum()),
            _ => Err(SimError::UnknownMaterial(name.to_string())),
        }
    }

    pub fn is_semiconductor(&self) -> bool {
        self.semiconductor.is_some()
    }

    /// Thermal electron effective mass (kg)
    pub fn electron_mass(&self, temperature: f64) -> f64 {
        match self.semiconductor {
            Some(_) => (1.045 + 4.5e-4 * temperature) * M_ELEC,
            None => M_ELEC,
        }
    }

    /// Thermal hole effective mass (kg)
    pub fn hole_mass(&self, temperature: f64) -> f64 {
        match self.semiconductor {
            Some(_) => (0.523 + 1.4e-3 * temperature - 1.48e-6 * temperature * temperature) * M_ELEC,
            None => M_ELEC,
        }
    }

    /// Mass for a carrier of the given charge sign
    pub fn mass_for_charge(&self, charge: f64, temperature: f64) -> f64 {
        if charge < 0.0 {
            self.electron_mass(temperature)
        } else {
            self.hole_mass(temperature)
        }
    }

    /// Band gap (eV) at `temperature`
    pub fn band_gap(&self, temperature: f64) -> Option<f64> {
        let s = self.semiconductor?;
        let t = temperature;
        Some(s.eg300 + s.eg_alpha * ((300.0 * 300.0) / (300.0 + s.eg_beta) - (t * t) / (t + s.eg_beta)))
    }

    /// Intrinsic carrier density n_i (cm^-3); zero for insulators
    pub fn intrinsic_density(&self, temperature: f64) -> f64 {
        match (self.semiconductor, self.band_gap(temperature)) {
            (Some(s), Some(eg)) => (s.nc300 * s.nv300).sqrt() * (-eg / (2.0 * K_B_EV * temperature)).exp(),
            _ => 0.0,
        }
    }
}
