//! Initial carriers from detector event CSV.
//!
//! The header must name `flagParticle`, `x`, `y` and `z`; other columns
//! are ignored. Every row flagged `1` deposits an electron-hole pair: the
//! electron at `(x, y, z) / norm_factor` and the hole at the same point
//! nudged by a small relative jitter so the two never coincide exactly.
//! Other flags are skipped with a warning.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::warn;
use rand::Rng;
use serde::Deserialize;

use crate::error::{Result, SimError};
use crate::simulation::constants::{PAIR_JITTER_MAX, PAIR_JITTER_MIN, Q_E, Q_H};
use crate::simulation::material::Material;
use crate::simulation::states::{Carrier, NVec3};

/// Particle flag that produces a pair
pub const FLAG_PAIR: i64 = 1;

const REQUIRED_COLUMNS: [&str; 4] = ["flagParticle", "x", "y", "z"];

#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(rename = "flagParticle")]
    flag: i64,
    x: f64,
    y: f64,
    z: f64,
}

pub fn load_events<R: Rng>(
    path: &Path,
    norm_factor: NVec3,
    material: &Material,
    temperature: f64,
    rng: &mut R,
) -> Result<Vec<Carrier>> {
    let file = File::open(path)?;
    parse_events(file, norm_factor, material, temperature, rng)
}

pub fn parse_events<S: Read, R: Rng>(
    source: S,
    norm_factor: NVec3,
    material: &Material,
    temperature: f64,
    rng: &mut R,
) -> Result<Vec<Carrier>> {
    let electron_mass = material.electron_mass(temperature);
    let hole_mass = material.hole_mass(temperature);

    let mut reader = ReaderBuilder::new().trim(Trim::All).flexible(true).from_reader(source);

    let headers = reader.headers()?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(name) = REQUIRED_COLUMNS.iter().find(|name| !headers.iter().any(|h| h == **name)) {
        return Err(SimError::Csv {
            line: 1,
            message: format!("missing column '{name}'"),
        });
    }

    let mut carriers = Vec::new();
    for row in reader.deserialize() {
        let row: EventRow = row?;
        if row.flag != FLAG_PAIR {
            warn!("Neglecting unknown particle: flag {} is not known", row.flag);
            continue;
        }

        let pos = NVec3::new(row.x, row.y, row.z).component_div(&norm_factor);

        let index = carriers.len();
        carriers.push(Carrier::new(index, Q_E, pos, NVec3::zeros(), electron_mass));

        let jitter = NVec3::from_fn(|k, _| pos[k] * rng.random_range(PAIR_JITTER_MIN..PAIR_JITTER_MAX));
        carriers.push(Carrier::new(index + 1, Q_H, pos + jitter, NVec3::zeros(), hole_mass));
    }

    Ok(carriers)
}
