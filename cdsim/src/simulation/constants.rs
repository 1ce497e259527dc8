//! Physical constants (SI unless noted)

use std::f64::consts::PI;

pub const Q_H: f64 = 1.60217662e-19; // elementary charge (C)
pub const Q_E: f64 = -Q_H; // electron charge (C)
pub const K_B: f64 = 1.38064852e-23; // Boltzmann constant (J/K)
pub const K_B_EV: f64 = 8.617332478e-5; // Boltzmann constant (eV/K)
pub const M_ELEC: f64 = 9.10938356e-31; // free electron mass (kg)
pub const EPS_0: f64 = 8.8541878176e-12; // vacuum permittivity (F/m)
pub const C_LIGHT: f64 = 299792458.0; // speed of light (m/s)
pub const MU_0: f64 = 1.2566370614e-6; // vacuum permeability (H/m)

/// Coulomb's constant, k_e = c^2 mu_0 / 4 pi
pub const K_E: f64 = C_LIGHT * C_LIGHT * MU_0 / (4.0 * PI);

/// Positions are stored in micrometers: meters * LEN_SCALE = um
pub const LEN_SCALE: f64 = 1e6;

/// Mean free time window for thermal scattering (s)
pub const MEAN_FREE_TIME_MIN: f64 = 1e-14;
pub const MEAN_FREE_TIME_MAX: f64 = 1e-13;

/// Relative jitter applied to a hole spawned next to its electron
pub const PAIR_JITTER_MIN: f64 = 1e-6;
pub const PAIR_JITTER_MAX: f64 = 1e-5;

/// Thermal voltage k_B T / q (V)
pub fn thermal_voltage(temperature: f64) -> f64 {
    K_B * temperature / Q_H
}

/// Thermal speed sqrt(3 k_B T / m) (m/s)
pub fn thermal_speed(temperature: f64, mass: f64) -> f64 {
    (3.0 * K_B * temperature / mass).sqrt()
}
