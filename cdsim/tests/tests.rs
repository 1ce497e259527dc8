use cdsim::configuration::config::{AlgorithmConfig, ForceModelConfig, ScenarioConfig};
use cdsim::simulation::constants::{K_E, Q_E, Q_H};
use cdsim::simulation::engine::Engine;
use cdsim::simulation::integrator::{self, adaptive_delta_t};
use cdsim::simulation::params::Parameters;
use cdsim::{
    BHTree, BulkRecombination, Carrier, CoulombLaw, DeviceBox, DriftField, Material, NVec3, Octant, Population,
    Recorder, RemovalReason, Scenario, SimError, ThermalMotion, TreeCoulomb, ForceTerm,
};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;

/// Silicon carrier at room temperature
pub fn carrier(index: usize, charge: f64, x: [f64; 3]) -> Carrier {
    let mass = Material::silicon().mass_for_charge(charge, 300.0);
    Carrier::new(index, charge, x.into(), NVec3::zeros(), mass)
}

/// `n` carriers on a deterministic, pairwise-distinct spiral inside the default box
pub fn spiral(n: usize) -> Vec<Carrier> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = [
                (i_f * 0.37).sin() * 500.0 + i_f * 0.01,
                (i_f * 0.13).cos() * 500.0,
                250.0 + (i_f * 0.07).sin() * 200.0,
            ];
            let charge = if i % 2 == 0 { Q_E } else { Q_H };
            carrier(i, charge, x)
        })
        .collect()
}

/// Deterministic parameters: fixed step, no Brownian hops, no recombination
pub fn quiet_params(delta_t: f64) -> Parameters {
    Parameters {
        delta_t: Some(delta_t),
        brownian: false,
        recombination: false,
        ..Parameters::default()
    }
}

pub fn engine(model: ForceModelConfig, algorithm: AlgorithmConfig, processes: usize) -> Engine {
    Engine {
        model,
        algorithm,
        processes,
        ..Engine::default()
    }
}

pub fn scenario(carriers: Vec<Carrier>, params: Parameters, engine: Engine) -> Scenario {
    Scenario::new(engine, params, Material::silicon(), Population::from_carriers(carriers)).unwrap()
}

// ==================================================================================
// Octant tests
// ==================================================================================

#[test]
fn octant_children_tile_parent() {
    let parent = Octant::new(NVec3::new(1.0, -2.0, 3.0), NVec3::new(4.0, 6.0, 8.0));
    let children = [
        parent.une(), parent.unw(), parent.use_(), parent.usw(),
        parent.lne(), parent.lnw(), parent.lse(), parent.lsw(),
    ];

    let total: f64 = children.iter().map(|c| c.volume()).sum();
    assert!((total - parent.volume()).abs() < 1e-9, "Children volume {} != parent {}", total, parent.volume());

    for (i, a) in children.iter().enumerate() {
        assert!((a.overlap_volume(&parent) - a.volume()).abs() < 1e-9, "Child {} leaks out of parent", i);
        for b in children.iter().skip(i + 1) {
            assert_eq!(a.overlap_volume(b), 0.0, "Children overlap: {:?} {:?}", a, b);
        }
    }
}

#[test]
fn octant_codes_are_injective() {
    let cube = Octant::new(NVec3::zeros(), NVec3::new(1.0, 1.0, 1.0));
    let codes: HashSet<usize> = cube
        .children()
        .iter()
        .map(|child| cube.octant_code(&child.center()))
        .collect();
    assert_eq!(codes.len(), 8, "Codes collide: {:?}", codes);

    for code in 0..8 {
        let child = cube.child(code);
        assert_eq!(cube.octant_code(&child.center()), code);
    }
}

// ==================================================================================
// Octree tests
// ==================================================================================

#[test]
fn tree_holds_every_carrier_in_one_leaf() {
    let carriers = spiral(300);
    let tree = BHTree::build(&carriers, &DeviceBox::default().octant(), 64).unwrap();

    let leaves = tree.leaves();
    assert_eq!(leaves.len(), carriers.len(), "Expected one leaf per carrier");

    let distinct: HashSet<usize> = leaves.iter().copied().collect();
    assert_eq!(distinct.len(), carriers.len(), "A carrier sits in two leaves");
}

#[test]
fn tree_eight_octant_centers() {
    let cube = Octant::new(NVec3::zeros(), NVec3::new(1.0, 1.0, 1.0));
    let carriers: Vec<Carrier> = cube
        .children()
        .iter()
        .enumerate()
        .map(|(i, child)| carrier(i, Q_H, child.center().into()))
        .collect();

    let codes: HashSet<usize> = carriers.iter().map(|c| cube.octant_code(&c.x)).collect();
    assert_eq!(codes.len(), 8);

    let tree = BHTree::build(&carriers, &cube, 64).unwrap();
    let leaves: HashSet<usize> = tree.leaves().into_iter().collect();
    assert_eq!(leaves.len(), 8, "Expected 8 distinct leaves, got {:?}", leaves);
    assert_eq!(tree.node_count(), 9, "Root plus one child per carrier");
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.nodes[tree.root].id(), "D0BDHead");

    let dump = tree.dump(&carriers);
    assert_eq!(dump.lines().count(), 9, "{}", dump);
    assert!(dump.lines().skip(1).all(|l| l.starts_with("  D1BD")), "{}", dump);
}

#[test]
fn tree_coulomb_rebuilds_on_prepare() {
    let mut term = TreeCoulomb::new(CoulombLaw::new(11.8, 300.0, 0.0), 0.5, DeviceBox::default().octant(), 64);
    assert!(term.tree().is_none());

    let carriers = spiral(50);
    term.prepare(&carriers).unwrap();
    assert_eq!(term.tree().unwrap().leaves().len(), 50);

    term.prepare(&carriers[..10]).unwrap();
    assert_eq!(term.tree().unwrap().leaves().len(), 10, "Tree must be rebuilt, not extended");
}

#[test]
fn tree_rejects_coincident_positions() {
    let carriers = vec![carrier(0, Q_E, [1.0, 2.0, 3.0]), carrier(1, Q_H, [1.0, 2.0, 3.0])];
    let result = BHTree::build(&carriers, &DeviceBox::default().octant(), 16);
    assert!(
        matches!(result, Err(SimError::TreeDepthExceeded { index: 1, depth: 16 })),
        "Expected depth failure, got {:?}",
        result.err()
    );
}

#[test]
fn tree_force_matches_direct_sum_when_everything_counts() {
    let carriers = spiral(60);
    let law = CoulombLaw::new(11.8, 300.0, 0.0);
    let tree = BHTree::build(&carriers, &DeviceBox::default().octant(), 64).unwrap();

    for slot in [0, 17, 59] {
        let via_tree = tree.force_on_carrier(slot, &carriers, &law, 1e12);
        let direct = carriers
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != slot)
            .fold(NVec3::zeros(), |acc, (_, c)| acc + law.force(&carriers[slot], c));

        let err = (via_tree - direct).norm();
        assert!(err <= 1e-9 * direct.norm(), "Slot {}: tree {:?} vs direct {:?}", slot, via_tree, direct);
    }
}

#[test]
fn tree_force_with_zero_alpha_is_zero() {
    let carriers = spiral(20);
    let law = CoulombLaw::new(11.8, 300.0, 0.0);
    let tree = BHTree::build(&carriers, &DeviceBox::default().octant(), 64).unwrap();
    assert_eq!(tree.force_on_carrier(3, &carriers, &law, 0.0), NVec3::zeros());
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn coulomb_newton_third_law() {
    let law = CoulombLaw::new(11.8, 300.0, 3.59e11);
    let a = carrier(0, Q_E, [0.0, 0.0, 100.0]);
    let b = carrier(1, Q_H, [30.0, -20.0, 140.0]);

    let fab = law.force(&a, &b);
    let fba = law.force(&b, &a);

    assert!(fab.norm() > 0.0);
    assert!((fab + fba).norm() < 1e-12 * fab.norm(), "Net force not zero: {:?}", fab + fba);
}

#[test]
fn coulomb_vanishes_inside_debye_length() {
    let law = CoulombLaw::new(11.8, 300.0, 3.59e11);
    let a = carrier(0, Q_E, [0.0, 0.0, 100.0]);
    let debye_um = law.debye_length(&a) * 1e6;
    assert!(debye_um > 1.0, "Debye length {} um", debye_um);

    let near = carrier(1, Q_H, [0.5 * debye_um, 0.0, 100.0]);
    let edge = carrier(2, Q_H, [debye_um, 0.0, 100.0]);
    let far = carrier(3, Q_H, [2.0 * debye_um, 0.0, 100.0]);

    assert_eq!(law.force(&a, &near), NVec3::zeros());
    assert_eq!(law.force(&a, &edge), NVec3::zeros());
    assert!(law.force(&a, &far).norm() > 0.0);
}

#[test]
fn coulomb_vacuum_pair_one_micrometer() {
    let vacuum = Material::vacuum();
    let law = CoulombLaw::new(vacuum.eps_r, 300.0, 0.0);
    let a = Carrier::new(0, Q_H, NVec3::new(0.0, 0.0, 0.0), NVec3::zeros(), vacuum.hole_mass(300.0));
    let b = Carrier::new(1, Q_E, NVec3::new(0.0, 1.0, 0.0), NVec3::zeros(), vacuum.electron_mass(300.0));

    let f = law.force(&a, &b);
    let expected = K_E * Q_H * Q_H / (1e-6 * 1e-6);

    assert!((f.norm() - expected).abs() < 1e-9 * expected, "Magnitude {} != {}", f.norm(), expected);
    let line = b.x - a.x;
    assert!(f.cross(&line).norm() < 1e-12 * f.norm(), "Force {:?} not along {:?}", f, line);
}

#[test]
fn coulomb_same_position_is_zero() {
    let law = CoulombLaw::new(1.0, 300.0, 0.0);
    let a = carrier(0, Q_E, [5.0, 5.0, 5.0]);
    let b = carrier(1, Q_H, [5.0, 5.0, 5.0]);
    assert_eq!(law.force(&a, &b), NVec3::zeros());
}

#[test]
fn drift_field_pushes_electrons_and_holes_apart() {
    let device = DeviceBox::default();
    let field = DriftField::new(&device, -200.0, -1.0);
    let e = field.force(&carrier(0, Q_E, [0.0, 0.0, 250.0]));
    let h = field.force(&carrier(1, Q_H, [0.0, 0.0, 250.0]));

    assert!(e.z > 0.0, "Electrons should head for the cathode: {:?}", e);
    assert!((e + h).norm() == 0.0);
    let expected = Q_H * 199.0 / 500e-6;
    assert!((e.z - expected).abs() < 1e-9 * expected);
}

#[test]
fn thermal_velocity_has_thermal_speed() {
    let thermal = ThermalMotion::new(300.0, true);
    let c = carrier(0, Q_E, [0.0, 0.0, 250.0]);
    let mut rng = StdRng::seed_from_u64(9);

    let expected = (3.0 * cdsim::simulation::constants::K_B * 300.0 / c.mass).sqrt();
    for _ in 0..10 {
        let v = thermal.thermal_velocity(&c, &mut rng);
        assert!((v.norm() - expected).abs() < 1e-9 * expected);
    }

    let off = ThermalMotion::new(300.0, false);
    assert_eq!(off.displacement(&c, 1e-12, &mut rng), NVec3::zeros());
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn drift_is_linear_without_brownian() {
    let mut carriers = spiral(40);
    for (i, c) in carriers.iter_mut().enumerate() {
        c.v = NVec3::new(1e3 * i as f64, -2e3, 5e2);
    }
    let expected: Vec<NVec3> = carriers.iter().map(|c| c.x + c.v * 1e-9).collect();

    let mut sc = scenario(carriers, quiet_params(1e-9), engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, 3));
    integrator::drift(&mut sc, 1e-9).unwrap();

    for (c, x) in sc.population.iter().zip(expected) {
        assert_eq!(c.x, x, "Carrier {} drifted to {:?}", c.id(), c.x);
    }
}

#[test]
fn adaptive_delta_t_decreases_with_density() {
    let volume = DeviceBox::default().volume_m3();
    let mut last = f64::INFINITY;
    for n in [1, 10, 100, 1000, 10000] {
        let dt = adaptive_delta_t(n, volume, 0.03);
        assert!(dt < last, "dt {} did not drop below {} at n = {}", dt, last, n);
        last = dt;
    }
}

#[test]
fn select_prefers_fixed_step() {
    let mut sc = scenario(spiral(10), quiet_params(2e-12), engine(ForceModelConfig::Direct, AlgorithmConfig::OneShot, 1));
    assert_eq!(integrator::select(&mut sc), 2e-12);

    sc.parameters.delta_t = None;
    let adaptive = integrator::select(&mut sc);
    let expected = adaptive_delta_t(10, sc.parameters.device.volume_m3(), sc.parameters.nu);
    assert_eq!(adaptive, expected);
    assert_eq!(sc.clock.dt, expected);
}

#[test]
fn kick_resets_force_before_accumulating() {
    let mut lone = carrier(0, Q_H, [0.0, 0.0, 250.0]);
    lone.f = NVec3::new(1.0, 1.0, 1.0);
    let mut sc = scenario(vec![lone], quiet_params(1e-12), engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, 1));

    integrator::kick(&mut sc, 1e-12).unwrap();

    let field = DriftField::new(&sc.parameters.device, sc.parameters.anode_bias, sc.parameters.cathode_bias);
    let c = sc.population.search(0).unwrap();
    assert_eq!(c.f, field.force(c));
    assert_eq!(c.v, c.f / c.mass * 1e-12 * 1e6);
}

#[test]
fn kick_does_not_depend_on_worker_count() {
    let run = |workers: usize| {
        let mut sc = scenario(spiral(120), quiet_params(1e-12), engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, workers));
        integrator::kick(&mut sc, 1e-12).unwrap();
        sc.population.snapshot()
    };

    let one = run(1);
    let four = run(4);
    for (a, b) in one.iter().zip(&four) {
        assert_eq!(a.v, b.v, "Carrier {} differs across worker counts", a.id());
    }
}

#[test]
fn recombination_bound() {
    // 1 um^3 box so a handful of carriers is a high density
    let mut params = quiet_params(1e-7);
    params.recombination = true;
    params.device = DeviceBox::new([0.0, 1.0], [0.0, 1.0], [0.0, 1.0]);

    let carriers: Vec<Carrier> = (0..60)
        .map(|i| {
            let f = i as f64 / 60.0;
            carrier(i, if i % 2 == 0 { Q_E } else { Q_H }, [0.05 + 0.9 * f, 0.5 + 0.3 * (f * 7.0).sin(), 0.5])
        })
        .collect();
    let mut sc = scenario(carriers, params, engine(ForceModelConfig::Direct, AlgorithmConfig::OneShot, 2));

    let before = sc.population.len();
    integrator::select(&mut sc);
    let expected = sc.recombination.event_count(
        sc.population.num_electrons(),
        sc.population.num_holes(),
        sc.parameters.device.volume_cm3(),
        sc.clock.dt,
    );
    assert!(expected > 0, "Test setup should produce recombination events");

    let removed = integrator::bulk_recombination(&mut sc);

    assert_eq!(sc.population.len(), before.saturating_sub(expected));
    assert_eq!(removed.len(), before - sc.population.len());
    assert!(removed.iter().all(|r| r.reason == RemovalReason::Recombined));
    assert_eq!(sc.population.recombined(), removed.len());

    let live: Vec<usize> = sc.population.indices().collect();
    let distinct: HashSet<usize> = live.iter().copied().collect();
    assert_eq!(live.len(), distinct.len(), "Index appears twice after recombination");
}

#[test]
fn step_emptied_by_recombination_does_not_count() {
    // a full second in a 1 um^3 box recombines everything
    let mut params = quiet_params(1.0);
    params.recombination = true;
    params.device = DeviceBox::new([0.0, 1.0], [0.0, 1.0], [0.0, 1.0]);
    let carriers: Vec<Carrier> = (0..20)
        .map(|i| carrier(i, if i % 2 == 0 { Q_E } else { Q_H }, [0.05 + 0.045 * i as f64, 0.5, 0.5]))
        .collect();

    for algorithm in [AlgorithmConfig::OneShot, AlgorithmConfig::Sdkd, AlgorithmConfig::Skdk] {
        let mut sc = scenario(carriers.clone(), params.clone(), engine(ForceModelConfig::Direct, algorithm, 1));
        let removed = integrator::step(&mut sc).unwrap();

        assert_eq!(removed.len(), 20, "{:?}", algorithm);
        assert!(removed.iter().all(|r| r.reason == RemovalReason::Recombined));
        assert_eq!(sc.clock.step, 0, "{:?}", algorithm);
        assert_eq!(sc.clock.elapsed, 0.0, "{:?}", algorithm);
        assert_eq!(sc.clock.drifts, 0);
    }
}

#[test]
fn recombination_select_is_unique_and_bounded() {
    let pop = Population::from_carriers(spiral(25));
    let model = BulkRecombination::new(&Material::silicon(), 300.0, 3.59e11);
    let mut rng = StdRng::seed_from_u64(1);

    let picked = model.select(&pop, 10, &mut rng);
    let distinct: HashSet<usize> = picked.iter().copied().collect();
    assert_eq!(picked.len(), 10);
    assert_eq!(distinct.len(), 10);
    assert!(picked.iter().all(|i| pop.search(*i).is_some()));

    assert_eq!(model.select(&pop, 40, &mut rng).len(), 25);
}

#[test]
fn insulators_never_recombine() {
    let model = BulkRecombination::new(&Material::sio2(), 300.0, 3.59e11);
    assert_eq!(model.event_count(1000, 1000, 1e-12, 1.0), 0);
}

#[test]
fn single_shot_elapsed_time_is_exact() {
    // power of two so every partial sum is exact
    let dt = 2f64.powi(-40);
    let carriers: Vec<Carrier> = (0..100)
        .map(|i| {
            let (gx, gy) = ((i % 10) as f64, (i / 10) as f64);
            carrier(i, if i % 2 == 0 { Q_E } else { Q_H }, [gx * 20.0, gy * 20.0, 250.0])
        })
        .collect();
    let mut sc = scenario(carriers, quiet_params(dt), engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, 4));

    let k = 12;
    for _ in 0..k {
        integrator::step(&mut sc).unwrap();
    }

    assert_eq!(sc.clock.step, k);
    assert_eq!(sc.clock.elapsed, k as f64 * dt, "Elapsed {} after {} steps", sc.clock.elapsed, k);
    assert_eq!(sc.population.len(), 100);
}

#[test]
fn every_scheme_advances_the_clock() {
    for algorithm in [AlgorithmConfig::OneShot, AlgorithmConfig::Sdkd, AlgorithmConfig::Skdk] {
        let mut sc = scenario(spiral(30), quiet_params(1e-13), engine(ForceModelConfig::Direct, algorithm, 2));
        for _ in 0..3 {
            integrator::step(&mut sc).unwrap();
        }
        assert_eq!(sc.clock.step, 3, "{:?}", algorithm);
        assert!((sc.clock.elapsed - 3e-13).abs() < 1e-25, "{:?}: {}", algorithm, sc.clock.elapsed);
    }
}

#[test]
fn run_rejects_empty_population() {
    let mut sc = scenario(Vec::new(), quiet_params(1e-12), engine(ForceModelConfig::Octree, AlgorithmConfig::Skdk, 1));
    let result = integrator::run(&mut sc, &mut Recorder::null());
    assert!(matches!(result, Err(SimError::EmptyPopulation)));
}

#[test]
fn run_collects_carriers_at_the_electrodes() {
    let carriers = vec![
        carrier(0, Q_E, [0.0, 0.0, 499.9]),
        carrier(1, Q_H, [100.0, 100.0, 0.1]),
    ];
    let mut params = quiet_params(1e-12);
    params.max_steps = Some(10_000);
    let mut sc = scenario(carriers, params, engine(ForceModelConfig::Octree, AlgorithmConfig::Skdk, 2));

    let status = integrator::run(&mut sc, &mut Recorder::null()).unwrap();

    assert!(sc.population.is_empty(), "Carriers left: {}", sc.population.len());
    assert_eq!(status.collected, 2);
    assert_eq!(status.lost, 0);
    assert_eq!(status.accounted(), 2);
}

// ==================================================================================
// Boundary tests
// ==================================================================================

#[test]
fn lateral_escape_without_grace_stays_then_fails() {
    let mut c = carrier(0, Q_E, [9999.99, 0.0, 250.0]);
    c.v = NVec3::new(1e9, 0.0, 0.0);
    let mut sc = scenario(vec![c], quiet_params(1e-9), engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, 1));

    integrator::drift(&mut sc, 1e-9).unwrap();
    assert!(sc.population.apply_removals().is_empty(), "Permissive mode should keep the carrier");
    assert_eq!(sc.population.search(0).unwrap().outside_steps, 1);

    let second = integrator::drift(&mut sc, 1e-9);
    assert!(
        matches!(second, Err(SimError::OutsideLateralExtent { index: 0, .. })),
        "Expected lateral violation, got {:?}",
        second
    );
}

#[test]
fn lateral_escape_with_grace_is_lost() {
    for grace in [0u32, 2, 5] {
        let mut c = carrier(0, Q_E, [9999.99, 0.0, 250.0]);
        c.v = NVec3::new(1e9, 0.0, 0.0);
        let mut params = quiet_params(1e-9);
        params.out_of_bounds_grace_steps = Some(grace);
        let mut sc = scenario(vec![c], params, engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, 1));

        // outside for grace + 1 drifts, the last ones entirely beside the device
        for drift in 0..grace {
            integrator::drift(&mut sc, 1e-9).unwrap();
            assert!(sc.population.apply_removals().is_empty(), "grace {}: removed early at drift {}", grace, drift);
        }
        assert_eq!(sc.population.search(0).unwrap().outside_steps, grace);

        integrator::drift(&mut sc, 1e-9).unwrap();
        let removed = sc.population.apply_removals();
        assert_eq!(removed.len(), 1, "grace {}", grace);
        assert_eq!(removed[0].reason, RemovalReason::Lost);
        assert_eq!(sc.population.lost(), 1);
    }
}

#[test]
fn grace_run_survives_a_sideways_escape() {
    let mut runaway = carrier(0, Q_E, [9999.99, 0.0, 250.0]);
    runaway.v = NVec3::new(1e9, 0.0, 0.0);
    let mut params = quiet_params(1e-9);
    params.anode_bias = params.cathode_bias; // no field, pure sideways motion
    params.out_of_bounds_grace_steps = Some(3);
    let mut sc = scenario(vec![runaway], params, engine(ForceModelConfig::Direct, AlgorithmConfig::OneShot, 1));

    let status = integrator::run(&mut sc, &mut Recorder::null()).unwrap();
    assert_eq!(status.lost, 1);
    assert_eq!(status.step, 4);
}

#[test]
fn infinite_position_is_a_numerical_loss() {
    let mut sideways = carrier(3, Q_H, [0.0, 0.0, 250.0]);
    sideways.v = NVec3::new(f64::INFINITY, 0.0, 0.0);
    let mut downward = carrier(5, Q_E, [10.0, 0.0, 250.0]);
    downward.v = NVec3::new(0.0, 0.0, f64::NEG_INFINITY);
    let steady = carrier(4, Q_E, [50.0, 0.0, 250.0]);
    let mut sc = scenario(vec![sideways, steady, downward], quiet_params(1e-12), engine(ForceModelConfig::Octree, AlgorithmConfig::OneShot, 2));

    integrator::drift(&mut sc, 1e-12).unwrap();
    let removed = sc.population.apply_removals();
    assert_eq!(removed.len(), 2);
    assert!(removed.iter().all(|r| r.reason == RemovalReason::Numerical), "{:?}", removed);

    // the survivor still builds a finite tree
    integrator::kick(&mut sc, 1e-12).unwrap();
    assert_eq!(sc.population.len(), 1);
}

#[test]
fn nan_position_is_a_numerical_loss() {
    let mut c = carrier(3, Q_H, [0.0, 0.0, 250.0]);
    c.v = NVec3::new(f64::NAN, 0.0, 0.0);
    let mut sc = scenario(vec![c, carrier(4, Q_E, [50.0, 0.0, 250.0])], quiet_params(1e-12), engine(ForceModelConfig::Direct, AlgorithmConfig::OneShot, 2));

    integrator::drift(&mut sc, 1e-12).unwrap();
    let removed = sc.population.apply_removals();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].carrier.index, 3);
    assert_eq!(removed[0].reason, RemovalReason::Numerical);
    assert_eq!(sc.population.len(), 1);
}

#[test]
fn collectable_when_previous_position_is_past_an_electrode() {
    let device = DeviceBox::default();
    let c = carrier(0, Q_H, [0.0, 0.0, -2.0]);
    assert!(device.is_collectable(&c, &NVec3::new(0.0, 0.0, -1.0)).unwrap());
    assert!(!device.is_inside(&c.x));
}

// ==================================================================================
// Population tests
// ==================================================================================

#[test]
fn population_counters_follow_removals() {
    let mut pop = Population::from_carriers(spiral(10));
    assert_eq!((pop.num_electrons(), pop.num_holes()), (5, 5));

    let removed = pop.remove_carr(0).unwrap();
    assert!(removed.is_electron());
    assert_eq!(pop.num_electrons(), 4);
    assert!(pop.remove_carr(0).is_none());
    assert_eq!(pop.num_electrons(), 4, "Failed removal must not touch counters");

    pop.mark_for_removal(1, RemovalReason::Collected);
    pop.mark_for_removal(1, RemovalReason::Recombined);
    pop.mark_for_removal(2, RemovalReason::Numerical);
    pop.mark_for_removal(99, RemovalReason::Lost);
    assert_eq!(pop.pending_removals(), 2);

    let removed = pop.apply_removals();
    assert_eq!(removed[0].reason, RemovalReason::Collected, "First reason wins");
    assert_eq!((pop.collected(), pop.lost(), pop.recombined()), (1, 1, 0));
    assert_eq!(pop.len(), 7);
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
input:
  carriers:
    - { charge_sign: -1, x: [0.0, 0.0, 250.0] }
    - { charge_sign: 1, x: [0.0, 0.5, 250.0], v: [0.0, 0.0, -10.0] }
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.engine.model, ForceModelConfig::Octree);
    assert_eq!(cfg.engine.algorithm, AlgorithmConfig::Skdk);
    assert_eq!(cfg.material.name, "Silicon");
    assert_eq!(cfg.device.z, [0.0, 500.0]);

    let sc = Scenario::build_scenario(cfg, Path::new(".")).unwrap();
    assert_eq!(sc.population.len(), 2);
    assert_eq!(sc.population.num_electrons(), 1);
    assert_eq!(sc.engine.alpha, 0.5);
    assert_eq!(sc.parameters.delta_t, None);
    assert_eq!(sc.population.search(1).unwrap().v, NVec3::new(0.0, 0.0, -10.0));
}

#[test]
fn yaml_accepts_legacy_names() {
    let yaml = r#"
engine:
  model: "OneToOne"
  algorithm: "SDKD"
parameters:
  delta_t: 0.0
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.engine.model, ForceModelConfig::Direct);
    assert_eq!(cfg.engine.algorithm, AlgorithmConfig::Sdkd);

    // zero step means adaptive
    let sc = Scenario::build_scenario(cfg, Path::new(".")).unwrap();
    assert_eq!(sc.parameters.delta_t, None);
}

#[test]
fn unknown_material_is_rejected() {
    let cfg: ScenarioConfig = serde_yaml::from_str("material:\n  name: \"Unobtainium\"\n").unwrap();
    let result = Scenario::build_scenario(cfg, Path::new("."));
    assert!(matches!(result, Err(SimError::UnknownMaterial(_))));
}

#[test]
fn zero_charge_sign_is_rejected() {
    let yaml = "input:\n  carriers:\n    - { charge_sign: 0, x: [0.0, 0.0, 1.0] }\n";
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let result = Scenario::build_scenario(cfg, Path::new("."));
    assert!(matches!(result, Err(SimError::InvalidConfig(_))));
}

#[test]
fn flat_device_is_rejected() {
    let yaml = "device:\n  z: [10.0, 10.0]\n";
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let result = Scenario::build_scenario(cfg, Path::new("."));
    assert!(matches!(result, Err(SimError::InvalidConfig(_))));
}
