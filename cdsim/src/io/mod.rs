//! Collaborators around the engine: initial carrier loaders, carrier
//! trajectory sinks, continuation snapshots and the event log.

pub mod event_log;
pub mod loader;
pub mod sinks;
pub mod snapshot;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::configuration::config::{CarrierLogConfig, OutputConfig};
use crate::error::Result;
use crate::simulation::population::{Population, Removal};

pub use event_log::EventLog;
pub use sinks::{DelimitedSink, TableSink};
pub use snapshot::SnapshotSink;

/// Receives the live carriers after each recorded step
pub trait CarrierSink {
    fn record(&mut self, elapsed: f64, step: u64, population: &Population) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Receives one call per carrier taken out of the population
pub trait EventSink {
    fn removed(&mut self, elapsed: f64, removal: &Removal) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CarrierSink for NullSink {
    fn record(&mut self, _elapsed: f64, _step: u64, _population: &Population) -> Result<()> {
        Ok(())
    }
}

impl EventSink for NullSink {
    fn removed(&mut self, _elapsed: f64, _removal: &Removal) -> Result<()> {
        Ok(())
    }
}

/// Carrier sink plus event sink, with a recording stride
pub struct Recorder {
    carriers: Box<dyn CarrierSink>,
    events: Box<dyn EventSink>,
    log_every: u64,
}

impl Recorder {
    pub fn new(carriers: Box<dyn CarrierSink>, events: Box<dyn EventSink>, log_every: u64) -> Self {
        Self {
            carriers,
            events,
            log_every: log_every.max(1),
        }
    }

    /// Records nothing
    pub fn null() -> Self {
        Self::new(Box::new(NullSink), Box::new(NullSink), 1)
    }

    /// Open the sinks named in `cfg` under `cfg.directory` (relative to `base_dir`).
    /// File names start with `stem`.
    pub fn from_config(cfg: &OutputConfig, base_dir: &Path, stem: &str) -> Result<Self> {
        let dir = base_dir.join(&cfg.directory);
        if cfg.carrier_log != CarrierLogConfig::None || cfg.event_log.is_some() {
            fs::create_dir_all(&dir)?;
        }

        let carriers: Box<dyn CarrierSink> = match cfg.carrier_log {
            CarrierLogConfig::None => Box::new(NullSink),
            CarrierLogConfig::Delimited => {
                let file = File::create(dir.join(format!("{stem}_carriers.csv")))?;
                Box::new(DelimitedSink::new(BufWriter::new(file)))
            }
            CarrierLogConfig::Table => {
                let file = File::create(dir.join(format!("{stem}_carriers.txt")))?;
                Box::new(TableSink::new(BufWriter::new(file)))
            }
            CarrierLogConfig::Snapshot => {
                let file = File::create(dir.join(format!("{stem}_carriers.snap")))?;
                Box::new(SnapshotSink::new(BufWriter::new(file)))
            }
        };

        let events: Box<dyn EventSink> = match &cfg.event_log {
            Some(name) => Box::new(EventLog::create(&dir.join(name))?),
            None => Box::new(NullSink),
        };

        Ok(Self::new(carriers, events, cfg.log_every))
    }

    /// Forward a frame when `force` is set or `step` falls on the stride
    pub fn record(&mut self, elapsed: f64, step: u64, population: &Population, force: bool) -> Result<()> {
        if force || step % self.log_every == 0 {
            self.carriers.record(elapsed, step, population)?;
        }
        Ok(())
    }

    pub fn removed(&mut self, elapsed: f64, removal: &Removal) -> Result<()> {
        self.events.removed(elapsed, removal)
    }

    pub fn finish(&mut self) -> Result<()> {
        self.carriers.finish()?;
        self.events.finish()
    }
}
