use cdsim::{bench_kick_curve, run, Recorder, Scenario, ScenarioConfig};
use cdsim::{AlgorithmConfig, CarrierLogConfig, ForceModelConfig};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(about = "Charge carrier drift simulation")]
struct Args {
    /// Scenario YAML; relative names are also looked up under scenarios/
    #[arg(short, long, default_value = "default.yaml")]
    file: String,

    /// Worker threads
    #[arg(short, long)]
    processes: Option<usize>,

    /// Lattice temperature (K)
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Fixed time step (s); 0 selects the adaptive step
    #[arg(short = 'e', long)]
    delta_t: Option<f64>,

    /// oneshot, sdkd or skdk
    #[arg(short, long)]
    algorithm: Option<String>,

    /// direct or octree
    #[arg(short, long)]
    model: Option<String>,

    /// Substrate doping (cm^-3)
    #[arg(short = 'o', long)]
    doping: Option<f64>,

    /// Carrier log format: none, delimited, table or snapshot
    #[arg(short = 'l', long)]
    carrier_log: Option<String>,

    /// Resume from this snapshot file
    #[arg(short = 'c', long)]
    continue_from: Option<String>,

    /// CSV event file with the initial carriers
    #[arg(short = 'i', long)]
    input: Option<String>,

    #[arg(long)]
    seed: Option<u64>,

    /// Time direct vs octree Kicks and exit
    #[arg(long)]
    bench: bool,

    #[arg(short, long)]
    verbose: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<(ScenarioConfig, PathBuf)> {
    let local = PathBuf::from(file_name);
    let config_path = if local.is_absolute() || local.exists() {
        local
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };

    let file = File::open(&config_path).with_context(|| format!("opening scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg =
        ScenarioConfig::from_reader(reader).with_context(|| format!("parsing scenario {}", config_path.display()))?;

    let base_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((scenario_cfg, base_dir))
}

/// Parse a YAML enum name the same way the scenario file does
fn parse_choice<T: serde::de::DeserializeOwned>(flag: &str, value: &str) -> Result<T> {
    serde_yaml::from_str(value).with_context(|| format!("invalid value '{value}' for {flag}"))
}

/// Paths given on the command line are relative to the working directory,
/// not to the scenario file
fn from_cwd(path: &str) -> Result<String> {
    let abs = std::path::absolute(path).with_context(|| format!("resolving {path}"))?;
    Ok(abs.to_string_lossy().into_owned())
}

fn apply_overrides(cfg: &mut ScenarioConfig, args: &Args) -> Result<()> {
    if let Some(p) = args.processes {
        cfg.engine.processes = Some(p);
    }
    if let Some(t) = args.temperature {
        cfg.material.temperature = t;
    }
    if let Some(dt) = args.delta_t {
        cfg.parameters.delta_t = Some(dt);
    }
    if let Some(a) = &args.algorithm {
        cfg.engine.algorithm = parse_choice::<AlgorithmConfig>("--algorithm", a)?;
    }
    if let Some(m) = &args.model {
        cfg.engine.model = parse_choice::<ForceModelConfig>("--model", m)?;
    }
    if let Some(d) = args.doping {
        cfg.material.doping = d;
    }
    if let Some(l) = &args.carrier_log {
        cfg.output.carrier_log = parse_choice::<CarrierLogConfig>("--carrier-log", l)?;
    }
    if let Some(c) = &args.continue_from {
        cfg.input.continue_from = Some(from_cwd(c)?);
    }
    if let Some(i) = &args.input {
        cfg.input.events = Some(from_cwd(i)?);
    }
    if let Some(s) = args.seed {
        cfg.parameters.seed = s;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.bench {
        bench_kick_curve()?;
        return Ok(());
    }

    let (mut scenario_cfg, base_dir) = load_scenario_from_yaml(&args.file)?;
    apply_overrides(&mut scenario_cfg, &args)?;

    let output_cfg = scenario_cfg.output.clone();
    let mut scenario = Scenario::build_scenario(scenario_cfg, &base_dir).context("building scenario")?;

    let stem = Path::new(&args.file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cdsim");
    let mut recorder = Recorder::from_config(&output_cfg, &base_dir, stem).context("opening output sinks")?;

    let status = run(&mut scenario, &mut recorder).context("simulation failed")?;
    info!("finished\n{status}");

    Ok(())
}
