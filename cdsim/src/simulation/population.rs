//! Live carrier population.
//!
//! Carriers are keyed by index in a `BTreeMap`, so iteration order is the
//! stable index order the parallel regions partition over. Removals are
//! queued with a reason while workers run and excised afterwards in one
//! single-threaded pass.

use std::collections::BTreeMap;
use std::fmt;

use crate::simulation::states::{Carrier, CarrierType};

/// Why a carrier left the population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Collected, // crossed an electrode plane
    Lost, // left the volume elsewhere
    Numerical, // position became NaN
    Recombined, // bulk recombination
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemovalReason::Collected => "collected",
            RemovalReason::Lost => "lost",
            RemovalReason::Numerical => "lost (numerical)",
            RemovalReason::Recombined => "recombined",
        };
        f.write_str(s)
    }
}

/// A carrier taken out of the population, with its final state
#[derive(Debug, Clone)]
pub struct Removal {
    pub carrier: Carrier,
    pub reason: RemovalReason,
}

#[derive(Debug, Default, Clone)]
pub struct Population {
    carriers: BTreeMap<usize, Carrier>,
    pending: BTreeMap<usize, RemovalReason>, // marked this step, not yet excised
    num_elec: usize,
    num_hole: usize,
    collected: usize,
    lost: usize,
    recombined: usize,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_carriers<I: IntoIterator<Item = Carrier>>(carriers: I) -> Self {
        let mut pop = Self::new();
        for c in carriers {
            pop.insert(c);
        }
        pop
    }

    /// Insert or replace by index, keeping the type counters in sync
    pub fn insert(&mut self, carrier: Carrier) -> Option<Carrier> {
        self.count(carrier.carrier_type(), true);
        let old = self.carriers.insert(carrier.index, carrier);
        if let Some(prev) = &old {
            self.count(prev.carrier_type(), false);
        }
        old
    }

    /// Excise by index. Only call outside of parallel regions.
    pub fn remove_carr(&mut self, index: usize) -> Option<Carrier> {
        let removed = self.carriers.remove(&index)?;
        self.count(removed.carrier_type(), false);
        self.pending.remove(&index);
        Some(removed)
    }

    pub fn search(&self, index: usize) -> Option<&Carrier> {
        self.carriers.get(&index)
    }

    pub fn search_mut(&mut self, index: usize) -> Option<&mut Carrier> {
        self.carriers.get_mut(&index)
    }

    /// Queue `index` for removal. The first reason recorded wins.
    pub fn mark_for_removal(&mut self, index: usize, reason: RemovalReason) {
        if self.carriers.contains_key(&index) {
            self.pending.entry(index).or_insert(reason);
        }
    }

    pub fn pending_removals(&self) -> usize {
        self.pending.len()
    }

    /// Drain the removal queue, update the outcome counters and return
    /// what was removed in index order
    pub fn apply_removals(&mut self) -> Vec<Removal> {
        let pending = std::mem::take(&mut self.pending);
        let mut removed = Vec::with_capacity(pending.len());

        for (index, reason) in pending {
            let Some(carrier) = self.remove_carr(index) else { continue };
            match reason {
                RemovalReason::Collected => self.collected += 1,
                RemovalReason::Lost | RemovalReason::Numerical => self.lost += 1,
                RemovalReason::Recombined => self.recombined += 1,
            }
            removed.push(Removal { carrier, reason });
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    pub fn num_electrons(&self) -> usize {
        self.num_elec
    }

    pub fn num_holes(&self) -> usize {
        self.num_hole
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn lost(&self) -> usize {
        self.lost
    }

    pub fn recombined(&self) -> usize {
        self.recombined
    }

    /// Carriers in index order
    pub fn iter(&self) -> impl Iterator<Item = &Carrier> {
        self.carriers.values()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.carriers.keys().copied()
    }

    /// Mutable handles in index order, one per carrier; the partitioning
    /// unit for parallel regions
    pub fn handles_mut(&mut self) -> Vec<&mut Carrier> {
        self.carriers.values_mut().collect()
    }

    /// Owned copy of the carriers in index order (read-only frame for workers)
    pub fn snapshot(&self) -> Vec<Carrier> {
        self.carriers.values().cloned().collect()
    }

    fn count(&mut self, kind: CarrierType, add: bool) {
        let counter = match kind {
            CarrierType::Electron => &mut self.num_elec,
            CarrierType::Hole => &mut self.num_hole,
        };
        if add {
            *counter += 1;
        } else {
            *counter = counter.saturating_sub(1);
        }
    }
}
