//! High-level runtime engine settings
//!
//! Selects the Coulomb model, stepping scheme, Barnes–Hut threshold and
//! worker count used when building and running a `Scenario`

use crate::configuration::config::{AlgorithmConfig, ForceModelConfig};
use crate::simulation::barnes_hut::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone)]
pub struct Engine {
    pub model: ForceModelConfig, // direct or octree
    pub algorithm: AlgorithmConfig, // oneshot, sdkd or skdk
    pub alpha: f64, // Barnes–Hut acceptance threshold
    pub processes: usize, // worker threads
    pub max_tree_depth: usize, // octree depth bound
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            model: ForceModelConfig::Octree,
            algorithm: AlgorithmConfig::Skdk,
            alpha: 0.5,
            processes: num_cpus::get(),
            max_tree_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
