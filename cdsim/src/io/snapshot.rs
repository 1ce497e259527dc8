//! Binary carrier snapshots keyed by elapsed simulation time.
//!
//! A snapshot file is a plain concatenation of bincode-encoded
//! [`SnapshotFrame`]s, one per recorded step. Continuation runs resume from
//! the latest frame that still holds carriers.

use std::fs;
use std::io::Write;
use std::path::Path;

use bincode::{Decode, Encode};
use log::debug;

use crate::error::{Result, SimError};
use crate::io::CarrierSink;
use crate::simulation::material::Material;
use crate::simulation::population::Population;
use crate::simulation::states::{Carrier, NVec3};

#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct CarrierRecord {
    pub index: u64,
    pub charge: f64, // C
    pub mass: f64, // kg
    pub x: [f64; 3], // um
    pub v: [f64; 3], // um/s
    pub f: [f64; 3], // N
}

impl From<&Carrier> for CarrierRecord {
    fn from(c: &Carrier) -> Self {
        Self {
            index: c.index as u64,
            charge: c.charge(),
            mass: c.mass,
            x: c.x.into(),
            v: c.v.into(),
            f: c.f.into(),
        }
    }
}

impl CarrierRecord {
    pub fn to_carrier(&self) -> Carrier {
        let mut c = Carrier::new(self.index as usize, self.charge, NVec3::from(self.x), NVec3::from(self.v), self.mass);
        c.f = NVec3::from(self.f);
        c
    }
}

#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct SnapshotFrame {
    pub elapsed: f64, // simulated time (s)
    pub step: u64,
    pub carriers: Vec<CarrierRecord>,
}

impl SnapshotFrame {
    pub fn capture(elapsed: f64, step: u64, population: &Population) -> Self {
        Self {
            elapsed,
            step,
            carriers: population.iter().map(CarrierRecord::from).collect(),
        }
    }
}

/// State to resume from
#[derive(Debug, Clone)]
pub struct Continuation {
    pub elapsed: f64,
    pub step: u64,
    pub carriers: Vec<Carrier>,
}

/// Appends one frame per recorded step
pub struct SnapshotSink<W: Write> {
    out: W,
}

impl<W: Write> SnapshotSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CarrierSink for SnapshotSink<W> {
    fn record(&mut self, elapsed: f64, step: u64, population: &Population) -> Result<()> {
        let frame = SnapshotFrame::capture(elapsed, step, population);
        bincode::encode_into_std_write(&frame, &mut self.out, bincode::config::standard())
            .map_err(|e| SimError::Snapshot(e.to_string()))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Decode every frame in `bytes`
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<SnapshotFrame>> {
    let config = bincode::config::standard();
    let mut frames = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let (frame, read): (SnapshotFrame, usize) = bincode::decode_from_slice(&bytes[offset..], config)
            .map_err(|e| SimError::Snapshot(format!("frame {} at byte {offset}: {e}", frames.len())))?;
        offset += read;
        frames.push(frame);
    }

    Ok(frames)
}

/// Latest non-empty frame of `frames`, by elapsed time
pub fn latest_frame(frames: &[SnapshotFrame]) -> Option<&SnapshotFrame> {
    frames
        .iter()
        .filter(|f| !f.carriers.is_empty())
        .max_by(|a, b| a.elapsed.total_cmp(&b.elapsed))
}

/// Load the latest non-empty frame of a snapshot file.
///
/// Masses are reassigned from `material` by charge sign, since a resumed
/// run may use a different temperature.
pub fn load_latest(path: &Path, material: &Material, temperature: f64) -> Result<Continuation> {
    let bytes = fs::read(path)?;
    let frames = decode_frames(&bytes)?;
    debug!("{} holds {} frames", path.display(), frames.len());

    let frame = latest_frame(&frames).ok_or(SimError::EmptyPopulation)?;

    let carriers = frame
        .carriers
        .iter()
        .map(|r| {
            let mut c = r.to_carrier();
            c.mass = material.mass_for_charge(c.charge(), temperature);
            c
        })
        .collect();

    Ok(Continuation {
        elapsed: frame.elapsed,
        step: frame.step,
        carriers,
    })
}
