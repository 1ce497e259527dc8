//! Append-only log of collected, lost and recombined carriers.
//!
//! ```text
//! [1.25e-10] [4]Electron (12.5, -3.25, 0)
//! ** LOST ** [3e-10] [9]Hole (10001.2, 4.5, 210.7)
//! ** Recombination ** [4.5e-10] [17]Hole (1.5, 2.5, 100)
//! ```

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::io::EventSink;
use crate::simulation::population::{Removal, RemovalReason};

pub struct EventLog<W: Write> {
    out: W,
}

impl EventLog<BufWriter<std::fs::File>> {
    /// Open `path` for appending
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EventLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// One event line without the trailing newline
pub fn format_event(elapsed: f64, removal: &Removal) -> String {
    let c = &removal.carrier;
    let prefix = match removal.reason {
        RemovalReason::Collected => "",
        RemovalReason::Lost | RemovalReason::Numerical => "** LOST ** ",
        RemovalReason::Recombined => "** Recombination ** ",
    };
    format!("{prefix}[{elapsed:e}] {} ({}, {}, {})", c.id(), c.x.x, c.x.y, c.x.z)
}

impl<W: Write> EventSink for EventLog<W> {
    fn removed(&mut self, elapsed: f64, removal: &Removal) -> Result<()> {
        writeln!(self.out, "{}", format_event(elapsed, removal))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
