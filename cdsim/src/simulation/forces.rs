//! Force contributors for the carrier engine
//!
//! - [`CoulombLaw`]: screened pairwise Coulomb force
//! - [`DirectCoulomb`] / [`TreeCoulomb`]: all-pairs and Barnes–Hut sums
//! - [`DriftField`]: uniform bias field along z
//! - [`ThermalMotion`]: Brownian displacement (not a force, applied in Drift)
//!
//! Force terms are collected into a [`ForceSet`], which the Kick phase
//! queries once per carrier.

use std::f64::consts::PI;

use log::{log_enabled, trace, Level};
use rand::Rng;

use crate::error::Result;
use crate::simulation::barnes_hut::BHTree;
use crate::simulation::boundary::DeviceBox;
use crate::simulation::constants::{self, EPS_0, K_E, LEN_SCALE, MEAN_FREE_TIME_MAX, MEAN_FREE_TIME_MIN};
use crate::simulation::octant::Octant;
use crate::simulation::states::{Carrier, NVec3};

/// Collection of force terms.
/// Each term implements [`ForceTerm`]; contributions are summed per carrier.
pub struct ForceSet {
    terms: Vec<Box<dyn ForceTerm + Send + Sync>>,
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: ForceTerm + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Let every term see the frame before per-carrier queries (tree rebuild)
    pub fn prepare(&mut self, carriers: &[Carrier]) -> Result<()> {
        for term in self.terms.iter_mut() {
            term.prepare(carriers)?;
        }
        Ok(())
    }

    /// Total force on `carriers[slot]`
    pub fn total_force(&self, slot: usize, carriers: &[Carrier]) -> NVec3 {
        self.terms
            .iter()
            .fold(NVec3::zeros(), |acc, term| acc + term.force_on(slot, carriers))
    }
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A force source evaluated per carrier.
///
/// `prepare` runs single-threaded once per Kick; `force_on` may then be
/// called concurrently from several workers.
pub trait ForceTerm {
    fn prepare(&mut self, _carriers: &[Carrier]) -> Result<()> {
        Ok(())
    }

    fn force_on(&self, slot: usize, carriers: &[Carrier]) -> NVec3;
}

/// Screened Coulomb interaction.
///
/// Interactions closer than the Debye length are dropped; with no doping
/// there is no screening charge and the cutoff is disabled.
#[derive(Debug, Clone, Copy)]
pub struct CoulombLaw {
    pub eps_r: f64, // relative permittivity
    pub thermal_voltage: f64, // k_B T / q (V)
    pub doping: f64, // dopant concentration (cm^-3)
}

impl CoulombLaw {
    pub fn new(eps_r: f64, temperature: f64, doping: f64) -> Self {
        Self {
            eps_r,
            thermal_voltage: constants::thermal_voltage(temperature),
            doping,
        }
    }

    /// Debye length for `carrier` (m)
    pub fn debye_length(&self, carrier: &Carrier) -> f64 {
        // cm^-3 -> m^-3
        let screening = (carrier.charge() * self.doping * 1e6).abs();
        if screening == 0.0 {
            return 0.0;
        }
        (self.eps_r * EPS_0 * self.thermal_voltage / screening).sqrt()
    }

    /// Force on `a` due to `b` (N): k_e q_a q_b / r^2 along the unit vector a -> b
    pub fn force(&self, a: &Carrier, b: &Carrier) -> NVec3 {
        if a.x == b.x {
            return NVec3::zeros();
        }

        let r = b.x - a.x;
        // um -> m
        let dist = r.norm() / LEN_SCALE;
        if dist <= self.debye_length(a) {
            return NVec3::zeros();
        }

        let magnitude = K_E * a.charge() * b.charge() / (dist * dist);
        r.normalize() * magnitude
    }
}

/// All-pairs Coulomb sum, O(n^2)
pub struct DirectCoulomb {
    pub law: CoulombLaw,
}

impl ForceTerm for DirectCoulomb {
    fn force_on(&self, slot: usize, carriers: &[Carrier]) -> NVec3 {
        let target = &carriers[slot];
        carriers
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != slot)
            .fold(NVec3::zeros(), |acc, (_, c)| acc + self.law.force(target, c))
    }
}

/// Coulomb sum through a Barnes–Hut octree rebuilt in `prepare`
pub struct TreeCoulomb {
    pub law: CoulombLaw,
    pub alpha: f64, // distance / node size threshold
    pub domain: Octant, // nominal root region
    pub max_depth: usize,
    tree: Option<BHTree>,
}

impl TreeCoulomb {
    pub fn new(law: CoulombLaw, alpha: f64, domain: Octant, max_depth: usize) -> Self {
        Self {
            law,
            alpha,
            domain,
            max_depth,
            tree: None,
        }
    }

    /// Tree from the last `prepare`, if any
    pub fn tree(&self) -> Option<&BHTree> {
        self.tree.as_ref()
    }
}

impl ForceTerm for TreeCoulomb {
    fn prepare(&mut self, carriers: &[Carrier]) -> Result<()> {
        let tree = BHTree::build(carriers, &self.domain, self.max_depth)?;
        if log_enabled!(Level::Trace) {
            trace!("octree dump:\n{}", tree.dump(carriers));
        }
        self.tree = Some(tree);
        Ok(())
    }

    fn force_on(&self, slot: usize, carriers: &[Carrier]) -> NVec3 {
        match &self.tree {
            Some(tree) => tree.force_on_carrier(slot, carriers, &self.law, self.alpha),
            None => NVec3::zeros(),
        }
    }
}

/// Parallel plate field between anode (z_start) and cathode (z_end)
#[derive(Debug, Clone, Copy)]
pub struct DriftField {
    pub e_z: f64, // field strength along z (V/m)
}

impl DriftField {
    pub fn new(device: &DeviceBox, anode_bias: f64, cathode_bias: f64) -> Self {
        Self {
            e_z: (anode_bias - cathode_bias) / device.thickness_m(),
        }
    }

    /// F = qE (N)
    pub fn force(&self, carrier: &Carrier) -> NVec3 {
        NVec3::new(0.0, 0.0, self.e_z * carrier.charge())
    }
}

impl ForceTerm for DriftField {
    fn force_on(&self, slot: usize, carriers: &[Carrier]) -> NVec3 {
        self.force(&carriers[slot])
    }
}

/// Brownian displacement from thermal scattering
#[derive(Debug, Clone, Copy)]
pub struct ThermalMotion {
    pub temperature: f64, // lattice temperature (K)
    pub enabled: bool,
}

impl ThermalMotion {
    pub fn new(temperature: f64, enabled: bool) -> Self {
        Self { temperature, enabled }
    }

    /// Random thermal velocity (m/s): |v| = sqrt(3 k_B T / m), uniform direction
    pub fn thermal_velocity<R: Rng>(&self, carrier: &Carrier, rng: &mut R) -> NVec3 {
        let speed = constants::thermal_speed(self.temperature, carrier.mass);
        let phi = rng.random_range(0.0..2.0 * PI);
        let cos_theta: f64 = rng.random_range(-1.0..=1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        NVec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta) * speed
    }

    /// Displacement (um) accumulated over `tau` seconds.
    ///
    /// A mean free time is drawn once; the carrier then scatters
    /// `round(tau / mft)` times, each hop moving `v_th * mft`.
    pub fn displacement<R: Rng>(&self, carrier: &Carrier, tau: f64, rng: &mut R) -> NVec3 {
        if !self.enabled || tau <= 0.0 {
            return NVec3::zeros();
        }

        let mean_free_time = rng.random_range(MEAN_FREE_TIME_MIN..MEAN_FREE_TIME_MAX);
        let hops = (tau / mean_free_time).round() as u64;

        let mut delta = NVec3::zeros();
        for _ in 0..hops {
            delta += self.thermal_velocity(carrier, rng) * LEN_SCALE * mean_free_time;
        }
        delta
    }
}
