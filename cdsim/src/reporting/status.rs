//! Per-step run status.

use std::fmt;
use std::time::Duration;

use log::info;

use crate::configuration::config::ForceModelConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct SimStatus {
    pub step: u64,
    pub elapsed_sim_time: f64, // s
    pub wall_time: Duration,
    pub dt: f64, // last time step (s)
    pub alpha: f64,
    pub model: ForceModelConfig,
    pub total: usize,
    pub electrons: usize,
    pub holes: usize,
    pub collected: usize,
    pub lost: usize,
    pub recombined: usize,
}

impl SimStatus {
    /// Carriers accounted for: still live or already removed
    pub fn accounted(&self) -> usize {
        self.total + self.collected + self.lost + self.recombined
    }
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = match self.model {
            ForceModelConfig::Direct => "direct".to_string(),
            ForceModelConfig::Octree => format!("octree (alpha = {})", self.alpha),
        };
        writeln!(f, "=== Step {} ===", self.step)?;
        writeln!(f, "  Simulated time: {:e} s (dt = {:e} s)", self.elapsed_sim_time, self.dt)?;
        writeln!(f, "  Wall time:      {:.3} s", self.wall_time.as_secs_f64())?;
        writeln!(f, "  Force model:    {model}")?;
        writeln!(f, "  Carriers:       {} ({} electrons, {} holes)", self.total, self.electrons, self.holes)?;
        write!(
            f,
            "  Removed:        {} collected, {} lost, {} recombined",
            self.collected, self.lost, self.recombined
        )
    }
}

pub fn report(status: &SimStatus) {
    info!("{status}");
}
