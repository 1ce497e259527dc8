//! Bulk (substrate) recombination.
//!
//! Electron and hole densities are the simulated carriers spread over the
//! device volume on top of the equilibrium densities of a p-type
//! substrate (`p0 = N_A`, `n0 = n_i^2 / N_A`). Rates are in cm^-3 s^-1.
//!
//! - Trap assisted (SRH, trap at the intrinsic level):
//!   `(np - n_i^2) / (taup0 (n + n_i) + taun0 (p + n_i))`
//! - Auger: `Cn (p n^2 - n n_i^2) + Cp (n p^2 - p n_i^2)`

use log::debug;
use rand::seq::index;
use rand::Rng;

use crate::simulation::constants::K_B_EV;
use crate::simulation::material::{Material, SemiconductorParams};
use crate::simulation::population::Population;

#[derive(Debug, Clone, Copy)]
pub struct BulkRecombination {
    pub n_i: f64, // intrinsic density (cm^-3)
    pub doping: f64, // acceptor density (cm^-3)
    pub temperature: f64, // K
    pub e_trap: f64, // trap level relative to intrinsic (eV)
    pub params: Option<SemiconductorParams>, // None: no recombination
}

impl BulkRecombination {
    pub fn new(material: &Material, temperature: f64, doping: f64) -> Self {
        Self {
            n_i: material.intrinsic_density(temperature),
            doping,
            temperature,
            e_trap: 0.0,
            params: material.semiconductor,
        }
    }

    /// (n, p) in cm^-3 for the given counts and volume
    pub fn concentrations(&self, num_elec: usize, num_hole: usize, volume_cm3: f64) -> (f64, f64) {
        let (n0, p0) = if self.doping > 0.0 {
            (self.n_i * self.n_i / self.doping, self.doping)
        } else {
            (self.n_i, self.n_i)
        };
        (num_elec as f64 / volume_cm3 + n0, num_hole as f64 / volume_cm3 + p0)
    }

    pub fn trap_rate(&self, n: f64, p: f64) -> f64 {
        let Some(s) = self.params else { return 0.0 };
        let kt = K_B_EV * self.temperature;
        let num = n * p - self.n_i * self.n_i;
        let den = s.taup0 * (n + self.n_i * (self.e_trap / kt).exp())
            + s.taun0 * (p + self.n_i * (-self.e_trap / kt).exp());
        if den == 0.0 {
            return 0.0;
        }
        num / den
    }

    pub fn auger_rate(&self, n: f64, p: f64) -> f64 {
        let Some(s) = self.params else { return 0.0 };
        let ni2 = self.n_i * self.n_i;
        s.augn * (p * n * n - n * ni2) + s.augp * (n * p * p - p * ni2)
    }

    /// Trap + Auger rate (cm^-3 s^-1)
    pub fn total_rate(&self, num_elec: usize, num_hole: usize, volume_cm3: f64) -> f64 {
        let (n, p) = self.concentrations(num_elec, num_hole, volume_cm3);
        self.trap_rate(n, p) + self.auger_rate(n, p)
    }

    /// Expected number of recombination events in `dt` seconds
    pub fn event_count(&self, num_elec: usize, num_hole: usize, volume_cm3: f64, dt: f64) -> usize {
        let events = (self.total_rate(num_elec, num_hole, volume_cm3) * volume_cm3 * dt).round();
        if events.is_finite() && events > 0.0 {
            events as usize
        } else {
            0
        }
    }

    /// Indices of the carriers that recombine this step.
    ///
    /// Chooses `count` distinct carriers uniformly over the whole
    /// population, or everyone when `count` reaches the population size.
    pub fn select<R: Rng>(&self, population: &Population, count: usize, rng: &mut R) -> Vec<usize> {
        let indices: Vec<usize> = population.indices().collect();

        let chosen: Vec<usize> = if count >= indices.len() {
            indices
        } else {
            index::sample(rng, indices.len(), count)
                .into_iter()
                .map(|k| indices[k])
                .collect()
        };

        debug!("bulk recombination selects {} of {} carriers", chosen.len(), population.len());
        chosen
    }
}
