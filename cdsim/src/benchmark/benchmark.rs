use std::time::Instant;

use crate::configuration::config::ForceModelConfig;
use crate::error::Result;
use crate::simulation::constants::{Q_E, Q_H};
use crate::simulation::engine::Engine;
use crate::simulation::integrator::kick;
use crate::simulation::material::Material;
use crate::simulation::params::Parameters;
use crate::simulation::population::Population;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{Carrier, NVec3};

/// Helper to build a population of `n` alternating electrons and holes
/// spread through the default device box
fn make_population(n: usize, material: &Material, temperature: f64) -> Population {
    let carriers = (0..n).map(|i| {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec3::new(
            (i_f * 0.37).sin() * 5000.0,
            (i_f * 0.13).cos() * 5000.0,
            250.0 + (i_f * 0.07).sin() * 200.0,
        );
        let charge = if i % 2 == 0 { Q_E } else { Q_H };
        Carrier::new(i, charge, x, NVec3::zeros(), material.mass_for_charge(charge, temperature))
    });
    Population::from_carriers(carriers)
}

/// Helper to build a scenario with a fixed step and no stochastic physics
fn make_scenario(n: usize, model: ForceModelConfig) -> Result<Scenario> {
    let material = Material::silicon();
    let parameters = Parameters {
        delta_t: Some(1e-12),
        brownian: false,
        recombination: false,
        ..Parameters::default()
    };
    let engine = Engine {
        model,
        ..Engine::default()
    };
    let population = make_population(n, &material, parameters.temperature);
    Scenario::new(engine, parameters, material, population)
}

/// Mean milliseconds per Kick over `reps` repetitions, after one warm-up
fn time_kick(sc: &mut Scenario, reps: usize) -> Result<f64> {
    kick(sc, 1e-12)?;

    let t0 = Instant::now();
    for _ in 0..reps {
        kick(sc, 1e-12)?;
    }
    Ok(t0.elapsed().as_secs_f64() * 1000.0 / reps as f64)
}

/// Time one Kick with the direct and octree models for a range of n.
/// Paste output directly into a spreadsheet to graph
pub fn bench_kick_curve() -> Result<()> {
    println!("N,direct_ms,octree_ms");

    for n in (250..=4000).step_by(250) {
        // Small n: average over a few kicks to smooth noise
        let reps_direct = if n <= 1000 { 5 } else { 1 };
        let reps_tree = if n <= 2000 { 3 } else { 1 };

        let mut direct = make_scenario(n, ForceModelConfig::Direct)?;
        let ms_direct = time_kick(&mut direct, reps_direct)?;

        let mut tree = make_scenario(n, ForceModelConfig::Octree)?;
        let ms_tree = time_kick(&mut tree, reps_tree)?;

        println!("{},{:.6},{:.6}", n, ms_direct, ms_tree);
    }

    Ok(())
}
