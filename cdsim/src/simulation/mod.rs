pub mod constants;
pub mod states;
pub mod octant;
pub mod barnes_hut;
pub mod forces;
pub mod boundary;
pub mod population;
pub mod material;
pub mod recombination;
pub mod parallel;
pub mod params;
pub mod engine;
pub mod integrator;
pub mod scenario;
