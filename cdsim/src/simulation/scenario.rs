//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! (`Scenario`) containing:
//! - engine settings (`Engine`) and numerical parameters (`Parameters`)
//! - the live carrier population
//! - the active force set and Brownian model
//! - bulk recombination model, worker pool, clock and seeded RNG
//!
//! The integrator functions in [`crate::simulation::integrator`] advance a
//! `Scenario` in place.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::configuration::config::{ForceModelConfig, InputConfig, ScenarioConfig};
use crate::error::{Result, SimError};
use crate::io::{loader, snapshot};
use crate::reporting::status::SimStatus;
use crate::simulation::barnes_hut::DEFAULT_MAX_DEPTH;
use crate::simulation::boundary::DeviceBox;
use crate::simulation::engine::Engine;
use crate::simulation::forces::{CoulombLaw, DirectCoulomb, DriftField, ForceSet, ThermalMotion, TreeCoulomb};
use crate::simulation::material::Material;
use crate::simulation::parallel::WorkerPool;
use crate::simulation::params::Parameters;
use crate::simulation::population::Population;
use crate::simulation::recombination::BulkRecombination;
use crate::simulation::constants::Q_H;
use crate::simulation::states::{Carrier, NVec3};

/// Step counter and time bookkeeping
#[derive(Debug, Clone)]
pub struct SimClock {
    pub step: u64, // absolute step number
    pub start_step: u64, // step the current run started from
    pub elapsed: f64, // simulated time (s)
    pub dt: f64, // last selected time step (s)
    pub drifts: u64, // drift phases so far, feeds per-carrier RNG streams
    pub started: Instant, // wall clock at construction
}

impl SimClock {
    pub fn new(step: u64, elapsed: f64) -> Self {
        Self {
            step,
            start_step: step,
            elapsed,
            dt: 0.0,
            drifts: 0,
            started: Instant::now(),
        }
    }

    /// Steps taken since this run started
    pub fn steps_this_run(&self) -> u64 {
        self.step - self.start_step
    }
}

/// Runtime bundle for one carrier drift simulation
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub material: Material,
    pub population: Population,
    pub forces: ForceSet,
    pub thermal: ThermalMotion,
    pub recombination: BulkRecombination,
    pub pool: WorkerPool,
    pub clock: SimClock,
    pub rng: StdRng,
    pub resumed: bool, // continuation run; single-shot skips its first Kick
}

impl Scenario {
    /// Assemble a scenario from already-resolved parts
    pub fn new(engine: Engine, parameters: Parameters, material: Material, population: Population) -> Result<Self> {
        if !parameters.device.is_valid() {
            return Err(SimError::InvalidConfig(format!("device box has no volume: {:?}", parameters.device)));
        }

        let forces = build_forces(&engine, &parameters, &material);
        let thermal = ThermalMotion::new(parameters.temperature, parameters.brownian);
        let recombination = BulkRecombination::new(
            &material,
            parameters.temperature,
            parameters.doping,
        );
        let pool = WorkerPool::new(engine.processes)?;
        let rng = StdRng::seed_from_u64(parameters.seed);

        Ok(Self {
            engine,
            parameters,
            material,
            population,
            forces,
            thermal,
            recombination,
            pool,
            clock: SimClock::new(0, 0.0),
            rng,
            resumed: false,
        })
    }

    /// Build a scenario from YAML-facing config.
    ///
    /// Relative input paths are resolved against `base_dir`.
    pub fn build_scenario(cfg: ScenarioConfig, base_dir: &Path) -> Result<Self> {
        // Engine (runtime) from EngineConfig
        let e_cfg = &cfg.engine;
        let engine = Engine {
            model: e_cfg.model,
            algorithm: e_cfg.algorithm,
            alpha: e_cfg.alpha.unwrap_or(0.5),
            processes: e_cfg.processes.unwrap_or_else(num_cpus::get),
            max_tree_depth: e_cfg.max_tree_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        };

        // Parameters (runtime) from the device, material and parameter sections
        let p_cfg = &cfg.parameters;
        let parameters = Parameters {
            delta_t: p_cfg.delta_t.filter(|dt| *dt > 0.0),
            nu: p_cfg.nu,
            temperature: cfg.material.temperature,
            doping: cfg.material.doping,
            anode_bias: cfg.device.anode_bias,
            cathode_bias: cfg.device.cathode_bias,
            seed: p_cfg.seed,
            brownian: p_cfg.brownian,
            recombination: p_cfg.recombination,
            out_of_bounds_grace_steps: p_cfg.out_of_bounds_grace_steps,
            max_steps: p_cfg.max_steps,
            device: DeviceBox::new(cfg.device.x, cfg.device.y, cfg.device.z),
        };

        let material = Material::lookup(&cfg.material.name)?;

        let mut scenario = Scenario::new(engine, parameters, material, Population::new())?;
        scenario.load_input(&cfg.input, base_dir)?;
        Ok(scenario)
    }

    /// Seed the population from the input section.
    ///
    /// Precedence: continuation snapshot, then CSV events, then inline carriers.
    pub fn load_input(&mut self, input: &InputConfig, base_dir: &Path) -> Result<()> {
        let temperature = self.parameters.temperature;

        if let Some(path) = &input.continue_from {
            let path = resolve(base_dir, path);
            let resumed = snapshot::load_latest(&path, &self.material, temperature)?;
            info!(
                "resuming from {} at t = {:e} s (step {}, {} carriers)",
                path.display(),
                resumed.elapsed,
                resumed.step,
                resumed.carriers.len()
            );
            self.population = Population::from_carriers(resumed.carriers);
            self.clock = SimClock::new(resumed.step, resumed.elapsed);
            self.resumed = true;
        } else if let Some(path) = &input.events {
            let path = resolve(base_dir, path);
            let norm = NVec3::from(input.norm_factor);
            let carriers = loader::load_events(&path, norm, &self.material, temperature, &mut self.rng)?;
            info!("generated {} carriers from {}", carriers.len(), path.display());
            self.population = Population::from_carriers(carriers);
        } else {
            let mut carriers = Vec::with_capacity(input.carriers.len());
            for (index, cc) in input.carriers.iter().enumerate() {
                if cc.charge_sign == 0 {
                    return Err(SimError::InvalidConfig(format!("carrier {index} has zero charge_sign")));
                }
                let charge = f64::from(cc.charge_sign.signum()) * Q_H;
                let mass = self.material.mass_for_charge(charge, temperature);
                carriers.push(Carrier::new(index, charge, NVec3::from(cc.x), NVec3::from(cc.v), mass));
            }
            self.population = Population::from_carriers(carriers);
        }

        Ok(())
    }

    /// Snapshot of the status fields for reporting
    pub fn status(&self) -> SimStatus {
        SimStatus {
            step: self.clock.step,
            elapsed_sim_time: self.clock.elapsed,
            wall_time: self.clock.started.elapsed(),
            dt: self.clock.dt,
            alpha: self.engine.alpha,
            model: self.engine.model,
            total: self.population.len(),
            electrons: self.population.num_electrons(),
            holes: self.population.num_holes(),
            collected: self.population.collected(),
            lost: self.population.lost(),
            recombined: self.population.recombined(),
        }
    }
}

/// Coulomb term for the selected model plus the drift field
pub fn build_forces(engine: &Engine, parameters: &Parameters, material: &Material) -> ForceSet {
    let law = CoulombLaw::new(material.eps_r, parameters.temperature, parameters.doping);
    let drift = DriftField::new(&parameters.device, parameters.anode_bias, parameters.cathode_bias);

    let forces = ForceSet::new();
    let forces = match engine.model {
        ForceModelConfig::Direct => forces.with(DirectCoulomb { law }),
        ForceModelConfig::Octree => forces.with(TreeCoulomb::new(
            law,
            engine.alpha,
            parameters.device.octant(),
            engine.max_tree_depth,
        )),
    };
    forces.with(drift)
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
