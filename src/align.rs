//! Pairing of simulation sub-events with generator truth entries.
//!
//! Each simulation shard covers `ENTRIES_PER_SHARD` consecutive events. The
//! primary sub-event at local offset `i` of shard `n` corresponds to truth
//! entry `n · ENTRIES_PER_SHARD + i + 1`; the `+1` accounts for the one-based
//! event numbering of the generator output. The index is re-derived for every
//! shard; no state carries across shard boundaries.
//!
//! Alignment stops at the first truth index past the end of the truth store, so
//! a shard at the tail of a dataset may be only partially aligned.

use crate::store::{SimRecord, SimStore, TruthRecord, TruthStore};

/// Number of events per simulation shard.
pub const ENTRIES_PER_SHARD: usize = 100;

/// Truth-store index of the simulation entry at `local_offset` in `shard`.
pub fn truth_index(shard: usize, local_offset: usize) -> usize {
    shard * ENTRIES_PER_SHARD + local_offset + 1
}

/// One aligned truth/simulation event.
#[derive(Debug, Clone, Copy)]
pub struct EventPair<'a> {
    pub truth_index: usize,
    /// Offset of the simulation entry within its shard.
    pub local_offset: usize,
    pub truth: &'a TruthRecord,
    pub sim: &'a SimRecord,
}

/// Stateless aligner; see the module docs for the pairing rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAligner;

impl RecordAligner {
    pub fn align<'a>(
        &self,
        shard: usize,
        truth: &'a TruthStore,
        sim: &'a SimStore,
    ) -> Alignment<'a> {
        Alignment {
            shard,
            truth,
            sim: sim.records(),
            next: 0,
            exhausted: false,
        }
    }
}

/// Iterator of [`EventPair`]s for one shard, in increasing local offset.
pub struct Alignment<'a> {
    shard: usize,
    truth: &'a TruthStore,
    sim: &'a [SimRecord],
    next: usize,
    exhausted: bool,
}

impl<'a> Alignment<'a> {
    /// Primary sub-events in the shard, aligned or not.
    pub fn primary_entries(&self) -> usize {
        self.sim.iter().filter(|r| r.is_primary()).count()
    }

    /// True once the truth store ran out before the shard did.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<'a> Iterator for Alignment<'a> {
    type Item = EventPair<'a>;

    fn next(&mut self) -> Option<EventPair<'a>> {
        if self.exhausted {
            return None;
        }
        while self.next < self.sim.len() {
            let offset = self.next;
            self.next += 1;
            let sim = &self.sim[offset];
            if !sim.is_primary() {
                continue;
            }
            let index = truth_index(self.shard, offset);
            let Some(truth) = self.truth.get(index) else {
                self.exhausted = true;
                return None;
            };
            return Some(EventPair {
                truth_index: index,
                local_offset: offset,
                truth,
                sim,
            });
        }
        None
    }
}
