use std::path::{Path, PathBuf};

use tracing::debug;

use super::{StoreError, Table};
use crate::particle::SimParticle;
use crate::Vector3;

/// Detector simulation table, one row per sub-event.
pub const SIM_TABLE: &str = "output";

const EVID: &str = "evid";
const SUBEV: &str = "subev";
const MC_PARTICLE_COUNT: &str = "mcparticlecount";
const MC_PDG: &str = "mcpdg";
const MC_X: &str = "mcx";
const MC_Y: &str = "mcy";
const MC_Z: &str = "mcz";
const SCINT_PHOTONS: &str = "scintPhotons";
const CHER_PHOTONS: &str = "cherPhotons";
const REM_PHOTONS: &str = "remPhotons";
const MC_PDGS: &str = "mcpdgs";
const MC_XS: &str = "mcxs";
const MC_YS: &str = "mcys";
const MC_ZS: &str = "mczs";
const MC_US: &str = "mcus";
const MC_VS: &str = "mcvs";
const MC_WS: &str = "mcws";
const MC_TS: &str = "mcts";
const MC_KES: &str = "mckes";
const MC_PMT_ID: &str = "mcPMTID";
const MC_PMT_NPE: &str = "mcPMTNPE";

/// Photon counts by production process for one sub-event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhotonCounts {
    pub scintillation: f64,
    pub cherenkov: f64,
    pub reemitted: f64,
}

impl PhotonCounts {
    pub fn total(&self) -> f64 {
        self.scintillation + self.cherenkov + self.reemitted
    }
}

/// Which optional column groups a simulation store provides.
///
/// A feature whose columns are missing is skipped. Capabilities of consecutive
/// shards are intersected so a feature lost once stays off for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimCapabilities {
    /// `mckes`
    pub kinetic_energies: bool,
    /// `mcpdgs`
    pub species: bool,
    /// `mcxs`, `mcys`, `mczs`
    pub positions: bool,
    /// `mcus`, `mcvs`, `mcws`
    pub directions: bool,
    /// `mcx`, `mcy`, `mcz`
    pub primary_vertex: bool,
    /// `scintPhotons`, `cherPhotons`, `remPhotons`
    pub photons: bool,
    /// `mcPMTNPE`
    pub photoelectrons: bool,
    /// `mcPMTID`, `mcPMTNPE`
    pub sensor_hits: bool,
}

impl SimCapabilities {
    pub const ALL: SimCapabilities = SimCapabilities {
        kinetic_energies: true,
        species: true,
        positions: true,
        directions: true,
        primary_vertex: true,
        photons: true,
        photoelectrons: true,
        sensor_hits: true,
    };

    fn from_table(t: &Table) -> Self {
        let has = |cols: &[&str]| cols.iter().all(|c| t.column(c).is_some());
        SimCapabilities {
            kinetic_energies: has(&[MC_KES]),
            species: has(&[MC_PDGS]),
            positions: has(&[MC_XS, MC_YS, MC_ZS]),
            directions: has(&[MC_US, MC_VS, MC_WS]),
            primary_vertex: has(&[MC_X, MC_Y, MC_Z]),
            photons: has(&[SCINT_PHOTONS, CHER_PHOTONS, REM_PHOTONS]),
            photoelectrons: has(&[MC_PMT_NPE]),
            sensor_hits: has(&[MC_PMT_ID, MC_PMT_NPE]),
        }
    }

    pub fn intersect(&self, other: &SimCapabilities) -> SimCapabilities {
        SimCapabilities {
            kinetic_energies: self.kinetic_energies && other.kinetic_energies,
            species: self.species && other.species,
            positions: self.positions && other.positions,
            directions: self.directions && other.directions,
            primary_vertex: self.primary_vertex && other.primary_vertex,
            photons: self.photons && other.photons,
            photoelectrons: self.photoelectrons && other.photoelectrons,
            sensor_hits: self.sensor_hits && other.sensor_hits,
        }
    }

    /// Names of the features this set lacks.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.kinetic_energies, "kinetic energies"),
            (self.species, "particle species"),
            (self.positions, "particle positions"),
            (self.directions, "particle directions"),
            (self.primary_vertex, "primary vertex"),
            (self.photons, "photon counts"),
            (self.photoelectrons, "photoelectron counts"),
            (self.sensor_hits, "per-sensor hits"),
        ]
        .into_iter()
        .filter_map(|(present, name)| (!present).then_some(name))
        .collect()
    }
}

/// One simulated sub-event. List fields from absent columns are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimRecord {
    pub event_id: i64,
    pub sub_event: i64,
    pub particle_count: Option<i64>,
    pub primary_pdg: Option<i32>,
    /// Primary vertex in mm.
    pub vertex: Option<Vector3>,
    pub photons: Option<PhotonCounts>,
    pub pdgs: Vec<i32>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub zs: Vec<f64>,
    pub us: Vec<f64>,
    pub vs: Vec<f64>,
    pub ws: Vec<f64>,
    pub ts: Vec<f64>,
    pub kes: Vec<f64>,
    pub mc_pmt_id: Vec<i32>,
    pub mc_pmt_npe: Vec<u32>,
}

impl SimRecord {
    /// Primary sub-events carry index 0.
    pub fn is_primary(&self) -> bool {
        self.sub_event == 0
    }

    /// Particle list assembled from the per-particle columns. Missing
    /// components default to zero, missing KE to NaN.
    pub fn particles(&self) -> Vec<SimParticle> {
        let n = self.kes.len().max(self.pdgs.len());
        let at = |v: &[f64], i: usize, default: f64| v.get(i).copied().unwrap_or(default);
        (0..n)
            .map(|i| SimParticle {
                pdg: self.pdgs.get(i).copied().unwrap_or(0),
                position: Vector3::new(at(&self.xs, i, 0.0), at(&self.ys, i, 0.0), at(&self.zs, i, 0.0)),
                direction: Vector3::new(at(&self.us, i, 0.0), at(&self.vs, i, 0.0), at(&self.ws, i, 0.0)),
                time: at(&self.ts, i, 0.0),
                ke_mev: at(&self.kes, i, f64::NAN),
            })
            .collect()
    }

    /// Position (mm) and time (ns) of the first listed particle, if the
    /// per-particle position columns are filled.
    pub fn first_particle_position(&self) -> Option<(Vector3, f64)> {
        let (x, y, z) = (self.xs.first()?, self.ys.first()?, self.zs.first()?);
        Some((Vector3::new(*x, *y, *z), self.ts.first().copied().unwrap_or(0.0)))
    }

    /// Sum of true photoelectrons over all sensors.
    pub fn total_photoelectrons(&self) -> f64 {
        self.mc_pmt_npe.iter().map(|&n| n as f64).sum()
    }
}

/// All sub-events of one simulation store, held in memory.
#[derive(Debug, Clone)]
pub struct SimStore {
    pub path: PathBuf,
    records: Vec<SimRecord>,
    capabilities: SimCapabilities,
}

impl SimStore {
    /// Open a simulation store directory. Only `evid` and `subev` are mandatory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let t = Table::read(dir, SIM_TABLE)?;

        let c_evid = t.require(EVID)?;
        let c_subev = t.require(SUBEV)?;
        let col = |name: &str| t.column(name);
        let capabilities = SimCapabilities::from_table(&t);

        let mut records = Vec::with_capacity(t.len());
        for row in 0..t.len() {
            let vec3 = |a: &str, b: &str, c: &str| -> Result<Option<Vector3>, StoreError> {
                Ok(match (
                    t.opt_scalar::<f64>(row, col(a))?,
                    t.opt_scalar::<f64>(row, col(b))?,
                    t.opt_scalar::<f64>(row, col(c))?,
                ) {
                    (Some(x), Some(y), Some(z)) => Some(Vector3::new(x, y, z)),
                    _ => None,
                })
            };
            let photons = match (
                t.opt_scalar::<f64>(row, col(SCINT_PHOTONS))?,
                t.opt_scalar::<f64>(row, col(CHER_PHOTONS))?,
                t.opt_scalar::<f64>(row, col(REM_PHOTONS))?,
            ) {
                (Some(scintillation), Some(cherenkov), Some(reemitted)) => Some(PhotonCounts {
                    scintillation,
                    cherenkov,
                    reemitted,
                }),
                _ => None,
            };

            let rec = SimRecord {
                event_id: t.scalar(row, c_evid)?,
                sub_event: t.scalar(row, c_subev)?,
                particle_count: t.opt_scalar(row, col(MC_PARTICLE_COUNT))?,
                primary_pdg: t.opt_scalar(row, col(MC_PDG))?,
                vertex: vec3(MC_X, MC_Y, MC_Z)?,
                photons,
                pdgs: t.opt_list(row, col(MC_PDGS))?,
                xs: t.opt_list(row, col(MC_XS))?,
                ys: t.opt_list(row, col(MC_YS))?,
                zs: t.opt_list(row, col(MC_ZS))?,
                us: t.opt_list(row, col(MC_US))?,
                vs: t.opt_list(row, col(MC_VS))?,
                ws: t.opt_list(row, col(MC_WS))?,
                ts: t.opt_list(row, col(MC_TS))?,
                kes: t.opt_list(row, col(MC_KES))?,
                mc_pmt_id: t.opt_list(row, col(MC_PMT_ID))?,
                mc_pmt_npe: t.opt_list(row, col(MC_PMT_NPE))?,
            };
            records.push(rec);
        }
        debug!(
            "Opened simulation store {:?}: {} entries, missing features: {:?}",
            dir,
            records.len(),
            capabilities.missing()
        );
        Ok(SimStore {
            path: dir.to_path_buf(),
            records,
            capabilities,
        })
    }

    /// In-memory store with explicitly declared capabilities.
    pub fn from_records(records: Vec<SimRecord>, capabilities: SimCapabilities) -> Self {
        SimStore {
            path: PathBuf::new(),
            records,
            capabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SimRecord] {
        &self.records
    }

    /// Number of primary (sub-event 0) entries.
    pub fn primary_entries(&self) -> usize {
        self.records.iter().filter(|r| r.is_primary()).count()
    }

    pub fn capabilities(&self) -> SimCapabilities {
        self.capabilities
    }

    /// Directory holding this store's tables.
    pub fn dir(&self) -> &Path {
        &self.path
    }
}
