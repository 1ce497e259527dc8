//! Select / Kick / Drift phases and the three stepping schemes
//!
//! - `select`: fixed or adaptive time step
//! - `kick`:   rebuild the force index, v += F/m * tau (parallel)
//! - `drift`:  x += v * tau plus Brownian hops, boundary classification (parallel)
//!
//! Run modes compose the phases per step:
//! - one-shot: Kick(dt), Drift(dt)
//! - SDKD:     Drift(dt/2) [not on step 0], Kick(dt), Drift(dt/2)
//! - SKDK:     Kick(dt/2), Drift(dt/2 on step 0, dt after), Kick(dt/2)
//!
//! Every step first selects dt and applies bulk recombination.

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::constants::{K_E, LEN_SCALE};
use super::population::{Removal, RemovalReason};
use super::scenario::Scenario;
use super::states::{Carrier, NVec3};
use crate::configuration::config::AlgorithmConfig;
use crate::error::{Result, SimError};
use crate::io::Recorder;
use crate::reporting::status::{self, SimStatus};

/// Δt = ν / sqrt(k_e · density), density in m^-3
pub fn adaptive_delta_t(count: usize, volume_m3: f64, nu: f64) -> f64 {
    let density = count as f64 / volume_m3;
    nu / (K_E * density).sqrt()
}

/// Choose this step's Δt and store it on the clock
pub fn select(sc: &mut Scenario) -> f64 {
    let dt = match sc.parameters.delta_t {
        Some(dt) if dt > 0.0 => dt,
        _ => adaptive_delta_t(sc.population.len(), sc.parameters.device.volume_m3(), sc.parameters.nu),
    };
    sc.clock.dt = dt;
    dt
}

/// Queue bulk recombination victims for the current Δt and excise them
pub fn bulk_recombination(sc: &mut Scenario) -> Vec<Removal> {
    if !sc.parameters.recombination || sc.population.is_empty() {
        return Vec::new();
    }

    let volume = sc.parameters.device.volume_cm3();
    let count = sc.recombination.event_count(
        sc.population.num_electrons(),
        sc.population.num_holes(),
        volume,
        sc.clock.dt,
    );
    if count == 0 {
        return Vec::new();
    }

    info!("*** Recombination Rate: {count} /current volume /{:e} second(s) ***", sc.clock.dt);
    if count >= sc.population.len() {
        warn!("recombination consumes all {} carriers", sc.population.len());
    }

    for index in sc.recombination.select(&sc.population, count, &mut sc.rng) {
        sc.population.mark_for_removal(index, RemovalReason::Recombined);
    }
    sc.population.apply_removals()
}

/// Rebuild the force index and update every velocity by `tau` seconds
pub fn kick(sc: &mut Scenario, tau: f64) -> Result<()> {
    if sc.population.is_empty() {
        return Ok(());
    }

    // Read-only frame shared by all workers; slots follow index order
    let frame = sc.population.snapshot();
    sc.forces.prepare(&frame)?;

    let forces = &sc.forces;
    let mut handles = sc.population.handles_mut();

    sc.pool.run_partitioned(&mut handles, |offset, part| {
        for (k, c) in part.iter_mut().enumerate() {
            let c: &mut Carrier = c;
            // zero, then accumulate Coulomb + drift
            c.f = NVec3::zeros();
            c.f += forces.total_force(offset + k, &frame);
            c.v += c.f / c.mass * tau * LEN_SCALE;
        }
    });

    Ok(())
}

/// Move every carrier by `tau` seconds and queue boundary removals.
///
/// Non-finite positions are queued as numerical losses. Carriers leaving
/// the box are collected when their path crossed an electrode; otherwise
/// they stay, unless the configured grace period has run out. With a grace
/// period set, a carrier drifting entirely beside the device counts toward
/// it instead of failing the run.
pub fn drift(sc: &mut Scenario, tau: f64) -> Result<()> {
    if sc.population.is_empty() {
        return Ok(());
    }

    let device = sc.parameters.device;
    let thermal = sc.thermal;
    let grace = sc.parameters.out_of_bounds_grace_steps;
    let seed = sc.parameters.seed;
    let drift_no = sc.clock.drifts;
    sc.clock.drifts += 1;

    let mut handles = sc.population.handles_mut();

    let results: Vec<Result<Vec<(usize, RemovalReason)>>> = sc.pool.run_partitioned(&mut handles, |_, part| {
        let mut local = Vec::new();

        for c in part.iter_mut() {
            let c: &mut Carrier = c;
            let prev = c.x;

            c.x += c.v * tau;
            if thermal.enabled {
                let mut rng = carrier_rng(seed, drift_no, c.index);
                let hop = thermal.displacement(c, tau, &mut rng);
                c.x += hop;
            }

            if c.has_non_finite_position() {
                error!("{} left the finite domain...\n{}", c.id(), c.describe());
                local.push((c.index, RemovalReason::Numerical));
                continue;
            }

            if device.is_inside(&c.x) {
                c.outside_steps = 0;
                continue;
            }

            let beside = !device.within_lateral(&prev) && !device.within_lateral(&c.x);
            let collected = if grace.is_some() && beside {
                false
            } else {
                device.is_collectable(c, &prev)?
            };
            if collected {
                info!("Collected carrier: {} at ({}, {}, {})", c.id(), c.x.x, c.x.y, c.x.z);
                local.push((c.index, RemovalReason::Collected));
                continue;
            }

            c.outside_steps += 1;
            if let Some(limit) = grace {
                if c.outside_steps > limit {
                    warn!("Detected out of reach carrier: {} at ({}, {}, {})", c.id(), c.x.x, c.x.y, c.x.z);
                    local.push((c.index, RemovalReason::Lost));
                }
            }
        }

        Ok(local)
    });

    // barrier passed: merge the per-worker queues
    for local in results {
        for (index, reason) in local? {
            sc.population.mark_for_removal(index, reason);
        }
    }

    Ok(())
}

/// Advance one step with the configured scheme; returns what was removed
pub fn step(sc: &mut Scenario) -> Result<Vec<Removal>> {
    let dt = select(sc);
    let mut removed = bulk_recombination(sc);
    if sc.population.is_empty() {
        // nothing left to move; the step does not count
        return Ok(removed);
    }

    match sc.engine.algorithm {
        AlgorithmConfig::OneShot => {
            // a continuation run already carries the velocities of its last kick
            let skip_kick = sc.resumed && sc.clock.steps_this_run() == 0;
            if !skip_kick {
                kick(sc, dt)?;
            }
            drift(sc, dt)?;
            removed.extend(sc.population.apply_removals());
        }
        AlgorithmConfig::Sdkd => {
            if sc.clock.step != 0 {
                drift(sc, 0.5 * dt)?;
                removed.extend(sc.population.apply_removals());
            }
            kick(sc, dt)?;
            drift(sc, 0.5 * dt)?;
            removed.extend(sc.population.apply_removals());
        }
        AlgorithmConfig::Skdk => {
            kick(sc, 0.5 * dt)?;
            let tau = if sc.clock.step == 0 { 0.5 * dt } else { dt };
            drift(sc, tau)?;
            removed.extend(sc.population.apply_removals());
            kick(sc, 0.5 * dt)?;
        }
    }

    sc.clock.step += 1;
    sc.clock.elapsed += dt;
    Ok(removed)
}

/// Step until the population is empty (or `max_steps` is reached).
///
/// The recorder sees the initial frame, every removal and every
/// `log_every`-th step.
pub fn run(sc: &mut Scenario, recorder: &mut Recorder) -> Result<SimStatus> {
    if sc.population.is_empty() {
        return Err(SimError::EmptyPopulation);
    }

    info!(
        "starting {:?} run with {} carriers ({} electrons, {} holes) on {} workers",
        sc.engine.algorithm,
        sc.population.len(),
        sc.population.num_electrons(),
        sc.population.num_holes(),
        sc.pool.workers()
    );
    recorder.record(sc.clock.elapsed, sc.clock.step, &sc.population, true)?;

    while !sc.population.is_empty() {
        let removed = step(sc)?;

        for r in &removed {
            recorder.removed(sc.clock.elapsed, r)?;
        }
        recorder.record(sc.clock.elapsed, sc.clock.step, &sc.population, false)?;
        status::report(&sc.status());

        if let Some(max) = sc.parameters.max_steps {
            if sc.clock.steps_this_run() >= max {
                warn!("stopping after {max} steps with {} carriers left", sc.population.len());
                break;
            }
        }
    }

    recorder.finish()?;
    Ok(sc.status())
}

// helpers ==============================================================================

/// Independent stream per (seed, drift phase, carrier) so results do not
/// depend on how carriers are split across workers. The triple is laid out
/// verbatim in the 32-byte key, so distinct triples never share a stream.
fn carrier_rng(seed: u64, drift_no: u64, index: usize) -> StdRng {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&drift_no.to_le_bytes());
    key[16..24].copy_from_slice(&(index as u64).to_le_bytes());
    StdRng::from_seed(key)
}
