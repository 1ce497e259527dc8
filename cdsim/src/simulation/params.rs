//! Numerical and physical parameters for a run
//!
//! `Parameters` holds runtime settings:
//! - fixed or adaptive time step (`delta_t`, `nu`),
//! - lattice temperature and substrate doping,
//! - random seed and physics switches,
//! - out-of-box grace period and an optional step limit

use crate::simulation::boundary::DeviceBox;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub delta_t: Option<f64>, // fixed step (s), None = adaptive
    pub nu: f64, // adaptive step stability constant
    pub temperature: f64, // K
    pub doping: f64, // cm^-3
    pub anode_bias: f64, // V
    pub cathode_bias: f64, // V
    pub seed: u64, // deterministic seed
    pub brownian: bool, // thermal displacement on/off
    pub recombination: bool, // bulk recombination on/off
    pub out_of_bounds_grace_steps: Option<u32>, // None = never force-classify as lost
    pub max_steps: Option<u64>, // stop early
    pub device: DeviceBox, // boundary box
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            delta_t: None,
            nu: 0.03,
            temperature: 300.0,
            doping: 3.59e11,
            anode_bias: -200.0,
            cathode_bias: -1.0,
            seed: 42,
            brownian: true,
            recombination: true,
            out_of_bounds_grace_steps: None,
            max_steps: None,
            device: DeviceBox::default(),
        }
    }
}
