pub mod simulation;
pub mod configuration;
pub mod io;
pub mod reporting;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Carrier, CarrierType, NVec3};
pub use simulation::octant::Octant;
pub use simulation::barnes_hut::{BHNode, BHTree};
pub use simulation::forces::{CoulombLaw, DirectCoulomb, DriftField, ForceSet, ForceTerm, ThermalMotion, TreeCoulomb};
pub use simulation::boundary::DeviceBox;
pub use simulation::population::{Population, Removal, RemovalReason};
pub use simulation::material::Material;
pub use simulation::recombination::BulkRecombination;
pub use simulation::parallel::WorkerPool;
pub use simulation::integrator::{run, step};
pub use simulation::scenario::Scenario;

pub use configuration::config::{AlgorithmConfig, CarrierLogConfig, EngineConfig, ForceModelConfig, ParametersConfig, ScenarioConfig};

pub use io::Recorder;
pub use reporting::status::SimStatus;
pub use error::{Result, SimError};

pub use benchmark::benchmark::bench_kick_curve;
