//! Text carrier logs: CSV and fixed-width table.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::io::CarrierSink;
use crate::simulation::population::Population;
use crate::simulation::states::Carrier;

pub const CSV_HEADER: &str = "time,step,index,type,x,y,z,vx,vy,vz,fx,fy,fz,mass";

/// One delimited record; field order matches [`CSV_HEADER`]
#[derive(Debug, Serialize)]
struct CarrierRow {
    time: f64,
    step: u64,
    index: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    fx: f64,
    fy: f64,
    fz: f64,
    mass: f64,
}

impl CarrierRow {
    fn new(elapsed: f64, step: u64, c: &Carrier) -> Self {
        Self {
            time: elapsed,
            step,
            index: c.index,
            kind: c.carrier_type().name(),
            x: c.x.x,
            y: c.x.y,
            z: c.x.z,
            vx: c.v.x,
            vy: c.v.y,
            vz: c.v.z,
            fx: c.f.x,
            fy: c.f.y,
            fz: c.f.z,
            mass: c.mass,
        }
    }
}

/// One CSV row per carrier per recorded step; the header is written
/// with the first row
pub struct DelimitedSink<W: Write> {
    out: csv::Writer<W>,
}

impl<W: Write> DelimitedSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: csv::Writer::from_writer(out) }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out.into_inner().map_err(|e| e.into_error().into())
    }
}

impl<W: Write> CarrierSink for DelimitedSink<W> {
    fn record(&mut self, elapsed: f64, step: u64, population: &Population) -> Result<()> {
        for c in population.iter() {
            self.out.serialize(CarrierRow::new(elapsed, step, c))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Fixed-width columns with a banner per step
pub struct TableSink<W: Write> {
    out: W,
}

impl<W: Write> TableSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn row(&mut self, c: &Carrier) -> Result<()> {
        writeln!(
            self.out,
            "{:>8} {:>9} {:>14.6} {:>14.6} {:>14.6} {:>14.6e} {:>14.6e} {:>14.6e}",
            c.index, c.carrier_type(), c.x.x, c.x.y, c.x.z, c.v.x, c.v.y, c.v.z,
        )?;
        Ok(())
    }
}

impl<W: Write> CarrierSink for TableSink<W> {
    fn record(&mut self, elapsed: f64, step: u64, population: &Population) -> Result<()> {
        writeln!(self.out, "*** Step [{step}] t = {elapsed:e} s, {} carriers ***", population.len())?;
        writeln!(
            self.out,
            "{:>8} {:>9} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
            "index", "type", "x (um)", "y (um)", "z (um)", "vx (um/s)", "vy (um/s)", "vz (um/s)",
        )?;
        for c in population.iter() {
            self.row(c)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
