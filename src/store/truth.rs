use std::path::{Path, PathBuf};

use tracing::debug;

use super::{StoreError, Table};
use crate::particle::TruthParticle;

/// Generator truth table.
pub const TRUTH_TABLE: &str = "T";

const EVT_NUM: &str = "EvtNum";
const STDHEP_N: &str = "StdHepN";
const STDHEP_PDG: &str = "StdHepPdg";
const STDHEP_STATUS: &str = "StdHepStatus";
const STDHEP_P4: &str = "StdHepP4";
const STDHEP_X4: &str = "StdHepX4";

/// One generator event.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthRecord {
    pub event_number: i64,
    pub particles: Vec<TruthParticle>,
    /// Particle count declared by the generator, before any truncation.
    pub declared_particles: usize,
}

impl TruthRecord {
    pub fn is_truncated(&self) -> bool {
        self.particles.len() < self.declared_particles
    }

    pub fn final_state(&self) -> impl Iterator<Item = &TruthParticle> {
        self.particles.iter().filter(|p| p.is_final_state())
    }
}

/// All events of one truth store, held in memory.
#[derive(Debug, Clone)]
pub struct TruthStore {
    pub path: PathBuf,
    records: Vec<TruthRecord>,
}

impl TruthStore {
    /// Open a truth store directory.
    ///
    /// `max_particles` is a soft limit on the particles kept per event: longer
    /// records are truncated and flagged with [`TruthRecord::is_truncated`].
    pub fn open<P: AsRef<Path>>(dir: P, max_particles: Option<usize>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let table = Table::read(dir, TRUTH_TABLE)?;

        let c_evt = table.require(EVT_NUM)?;
        let c_n = table.require(STDHEP_N)?;
        let c_pdg = table.require(STDHEP_PDG)?;
        let c_status = table.require(STDHEP_STATUS)?;
        let c_p4 = table.require(STDHEP_P4)?;
        let c_x4 = table.require(STDHEP_X4)?;

        let mut records = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let event_number: i64 = table.scalar(row, c_evt)?;
            let n: usize = table.scalar(row, c_n)?;
            let pdgs: Vec<i32> = table.list(row, c_pdg)?;
            let status: Vec<i32> = table.list(row, c_status)?;
            let p4: Vec<f64> = table.list(row, c_p4)?;
            let x4: Vec<f64> = table.list(row, c_x4)?;
            table.check_len(row, c_pdg, pdgs.len(), n)?;
            table.check_len(row, c_status, status.len(), n)?;
            table.check_len(row, c_p4, p4.len(), 4 * n)?;
            table.check_len(row, c_x4, x4.len(), 4 * n)?;

            let keep = max_particles.map_or(n, |m| n.min(m));
            let particles = (0..keep)
                .map(|k| TruthParticle {
                    pdg: pdgs[k],
                    status: status[k],
                    p4: [p4[4 * k], p4[4 * k + 1], p4[4 * k + 2], p4[4 * k + 3]],
                    x4: [x4[4 * k], x4[4 * k + 1], x4[4 * k + 2], x4[4 * k + 3]],
                })
                .collect();
            records.push(TruthRecord {
                event_number,
                particles,
                declared_particles: n,
            });
        }
        debug!("Opened truth store {:?}: {} entries", dir, records.len());
        Ok(TruthStore {
            path: dir.to_path_buf(),
            records,
        })
    }

    /// In-memory store, e.g. for records produced by another reader.
    pub fn from_records(records: Vec<TruthRecord>) -> Self {
        TruthStore {
            path: PathBuf::new(),
            records,
        }
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TruthRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[TruthRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "EvtNum,StdHepN,StdHepPdg,StdHepStatus,StdHepP4,StdHepX4\n";

    fn write_truth(dir: &Path, rows: &[&str]) {
        let mut body = HEADER.to_string();
        for r in rows {
            body.push_str(r);
            body.push('\n');
        }
        std::fs::write(dir.join("T.csv"), body).unwrap();
    }

    #[test]
    fn test_open_truth_store() {
        let tmp = tempfile::tempdir().unwrap();
        write_truth(
            tmp.path(),
            &[
                "0,0,,,,",
                "1,2,14;11,0;1,0;0;1;1;0;0;0.1;0.105,0;0;0;0;10;20;30;0",
            ],
        );
        let store = TruthStore::open(tmp.path(), None).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get(0).unwrap().particles.is_empty());
        let rec = store.get(1).unwrap();
        assert_eq!(rec.event_number, 1);
        assert_eq!(rec.particles.len(), 2);
        assert_eq!(rec.particles[1].pdg, 11);
        assert_eq!(rec.particles[1].p4, [0.0, 0.0, 0.1, 0.105]);
        assert_eq!(rec.particles[1].x4, [10.0, 20.0, 30.0, 0.0]);
        let final_state: Vec<_> = rec.final_state().collect();
        assert_eq!(final_state.len(), 1);
        assert_eq!(final_state[0].pdg, 11);
    }

    #[test]
    fn test_soft_particle_limit() {
        let tmp = tempfile::tempdir().unwrap();
        write_truth(
            tmp.path(),
            &["5,3,11;13;22,1;1;1,0;0;0;1;0;0;0;1;0;0;0;1,0;0;0;0;0;0;0;0;0;0;0;0"],
        );
        let store = TruthStore::open(tmp.path(), Some(2)).unwrap();
        let rec = store.get(0).unwrap();
        assert_eq!(rec.particles.len(), 2);
        assert_eq!(rec.declared_particles, 3);
        assert!(rec.is_truncated());

        let store = TruthStore::open(tmp.path(), None).unwrap();
        assert!(!store.get(0).unwrap().is_truncated());
    }

    #[test]
    fn test_inconsistent_lengths_are_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        write_truth(tmp.path(), &["1,2,11,1;1,0;0;0;1;0;0;0;1,0;0;0;0;0;0;0;0"]);
        let err = TruthStore::open(tmp.path(), None).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_missing_column() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("T.csv"), "EvtNum,StdHepN\n1,0\n").unwrap();
        let err = TruthStore::open(tmp.path(), None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingColumn {
                column: "StdHepPdg",
                ..
            }
        ));
    }
}
