//! Configuration types for loading carrier drift scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]     – force model, stepping scheme, Barnes–Hut and thread options
//! - [`DeviceConfig`]     – boundary box and electrode biases
//! - [`MaterialConfig`]   – substrate material, doping and temperature
//! - [`ParametersConfig`] – time step, seed and physics switches
//! - [`InputConfig`]      – where the initial carriers come from
//! - [`OutputConfig`]     – carrier log and event log settings
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! Every section and nearly every field has a default, so a minimal file
//! only needs an `input` section.
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   model: "octree"          # or "direct"
//!   algorithm: "skdk"        # "oneshot", "sdkd" or "skdk"
//!   alpha: 0.5
//!   processes: 4             # omit for the CPU count
//!
//! device:
//!   x: [-10000.0, 10000.0]   # um
//!   y: [-10000.0, 10000.0]
//!   z: [0.0, 500.0]          # anode at z = 0, cathode at z = 500
//!   anode_bias: -200.0       # V
//!   cathode_bias: -1.0
//!
//! material:
//!   name: "Silicon"
//!   doping: 3.59e11          # cm^-3
//!   temperature: 300.0       # K
//!
//! parameters:
//!   delta_t: 0.0             # 0 or omitted -> adaptive
//!   nu: 0.03
//!   seed: 42
//!
//! input:
//!   events: "events.csv"
//!   norm_factor: [1.0, 1.0, 1.0]
//!
//! output:
//!   directory: "out"
//!   carrier_log: "delimited" # "none", "delimited", "table" or "snapshot"
//!   log_every: 10
//! ```

use std::io::Read;

use serde::Deserialize;

use crate::error::Result;

/// How carrier-carrier Coulomb forces are summed
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceModelConfig {
    #[serde(rename = "direct", alias = "OneToOne")] // exact all-pairs sum
    Direct,

    #[default]
    #[serde(rename = "octree", alias = "Octree")] // Barnes–Hut traversal of the per-step octree
    Octree,
}

/// Stepping scheme composed from Select, Kick and Drift
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmConfig {
    #[serde(rename = "oneshot", alias = "OneShot")] // Kick then Drift
    OneShot,

    #[serde(rename = "sdkd", alias = "SDKD")] // half Drift, Kick, half Drift
    Sdkd,

    #[default]
    #[serde(rename = "skdk", alias = "SKDK")] // half Kick, Drift, half Kick
    Skdk,
}

/// Format of the per-step carrier log
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarrierLogConfig {
    #[default]
    #[serde(rename = "none")]
    None,

    #[serde(rename = "delimited", alias = "csv")] // CSV text
    Delimited,

    #[serde(rename = "table")] // fixed-width columns
    Table,

    #[serde(rename = "snapshot", alias = "db")] // bincode frames, usable for continuation
    Snapshot,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub model: ForceModelConfig, // direct or octree Coulomb sum
    pub algorithm: AlgorithmConfig, // stepping scheme
    pub alpha: Option<f64>, // Barnes–Hut acceptance threshold, 0.5 if absent
    pub processes: Option<usize>, // worker threads, CPU count if absent
    pub max_tree_depth: Option<usize>, // octree insertion depth bound
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DeviceConfig {
    pub x: [f64; 2], // [start, end] in um
    pub y: [f64; 2],
    pub z: [f64; 2], // anode plane at z[0], cathode plane at z[1]
    pub anode_bias: f64, // V
    pub cathode_bias: f64, // V
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            x: [-10000.0, 10000.0],
            y: [-10000.0, 10000.0],
            z: [0.0, 500.0],
            anode_bias: -200.0,
            cathode_bias: -1.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MaterialConfig {
    pub name: String, // material table entry
    pub doping: f64, // cm^-3
    pub temperature: f64, // K
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            name: "Silicon".into(),
            doping: 3.59e11,
            temperature: 300.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub delta_t: Option<f64>, // fixed time step (s); absent or 0 -> adaptive
    pub nu: f64, // adaptive step stability constant
    pub seed: u64, // deterministic seed to make runs reproducible
    pub brownian: bool, // thermal displacement in Drift
    pub recombination: bool, // bulk recombination each step
    pub out_of_bounds_grace_steps: Option<u32>, // drop uncollected out-of-box carriers after this many drifts
    pub max_steps: Option<u64>, // stop early after this many steps
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            delta_t: None,
            nu: 0.03,
            seed: 42,
            brownian: true,
            recombination: true,
            out_of_bounds_grace_steps: None,
            max_steps: None,
        }
    }
}

/// Initial state for one carrier given inline
#[derive(Deserialize, Debug, Clone)]
pub struct CarrierConfig {
    pub charge_sign: i8, // -1 electron, +1 hole
    pub x: [f64; 3], // um
    #[serde(default)]
    pub v: [f64; 3], // um/s
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub events: Option<String>, // CSV detector events (flagParticle,x,y,z)
    pub norm_factor: [f64; 3], // event coordinates are divided by this
    pub continue_from: Option<String>, // snapshot file to resume from
    pub carriers: Vec<CarrierConfig>, // inline carriers
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            events: None,
            norm_factor: [1.0, 1.0, 1.0],
            continue_from: None,
            carriers: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String, // where log files go
    pub carrier_log: CarrierLogConfig,
    pub log_every: u64, // record every n-th step
    pub event_log: Option<String>, // file name for collected/lost/recombined lines
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".into(),
            carrier_log: CarrierLogConfig::None,
            log_every: 1,
            event_log: None,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub engine: EngineConfig, // model, algorithm, Barnes–Hut and threads
    pub device: DeviceConfig, // boundary box and bias
    pub material: MaterialConfig, // substrate
    pub parameters: ParametersConfig, // time step, seed, physics switches
    pub input: InputConfig, // initial carriers
    pub output: OutputConfig, // logs
}

impl ScenarioConfig {
    /// Parse a scenario from YAML
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}
