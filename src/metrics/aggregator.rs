use rkyv::{Archive, Deserialize, Serialize};

use super::binning::{BucketSpec, Metric, BUCKET_SPECS};
use crate::histogram::{Histogram1D, Histogram2D, HistogramError};
use crate::kinematics::Angles;
use crate::particle::{LightYieldClass, Species, SpeciesCounts};
use crate::store::PhotonCounts;
use crate::Vector3;

/// One named accumulator.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum Bucket {
    OneD(Histogram1D),
    TwoD(Histogram2D),
}

impl Bucket {
    pub fn name(&self) -> &str {
        match self {
            Bucket::OneD(h) => &h.name,
            Bucket::TwoD(h) => &h.name,
        }
    }

    pub fn entries(&self) -> u64 {
        match self {
            Bucket::OneD(h) => h.entries(),
            Bucket::TwoD(h) => h.entries(),
        }
    }

    pub fn as_1d(&self) -> Option<&Histogram1D> {
        match self {
            Bucket::OneD(h) => Some(h),
            Bucket::TwoD(_) => None,
        }
    }

    pub fn as_2d(&self) -> Option<&Histogram2D> {
        match self {
            Bucket::TwoD(h) => Some(h),
            Bucket::OneD(_) => None,
        }
    }

    /// Add the contents of `other`. Both must share binning and dimensionality.
    pub fn add(&mut self, other: &Bucket) -> Result<(), HistogramError> {
        match (self, other) {
            (Bucket::OneD(a), Bucket::OneD(b)) => a.add(b),
            (Bucket::TwoD(a), Bucket::TwoD(b)) => a.add(b),
            (a, b) => Err(HistogramError::BinningMismatch {
                name: a.name().to_string(),
                other: b.name().to_string(),
            }),
        }
    }

    /// Empty bucket with the binning of `spec`.
    pub fn empty(spec: &BucketSpec, name: impl Into<String>) -> Bucket {
        match spec.y {
            None => Bucket::OneD(Histogram1D::new(name, spec.x)),
            Some(y) => Bucket::TwoD(Histogram2D::new(name, spec.x, y)),
        }
    }

    /// Same bucket with its contents renamed, e.g. for a merged report.
    pub fn renamed(&self, name: impl Into<String>) -> Bucket {
        let mut b = self.clone();
        match &mut b {
            Bucket::OneD(h) => h.name = name.into(),
            Bucket::TwoD(h) => h.name = name.into(),
        }
        b
    }
}

/// Which stream a marginal distribution describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Generator truth (`_input` buckets).
    Truth,
    /// Detector simulation.
    Sim,
}

/// Fresh, empty buckets for one category, in [`BUCKET_SPECS`] order.
pub fn category_buckets(category: u32) -> Vec<Bucket> {
    BUCKET_SPECS
        .iter()
        .map(|spec| Bucket::empty(spec, spec.name_for(category)))
        .collect()
}

/// Per-category set of histogram buckets.
///
/// Categories are numbered `1..=n_categories`. Every `fill_*` call with a
/// category outside that range is a no-op.
#[derive(Debug, Clone)]
pub struct MetricAggregator {
    categories: Vec<Vec<Bucket>>,
}

impl MetricAggregator {
    pub fn new(n_categories: u32) -> Self {
        MetricAggregator {
            categories: (1..=n_categories).map(category_buckets).collect(),
        }
    }

    pub fn n_categories(&self) -> u32 {
        self.categories.len() as u32
    }

    fn index(&self, category: u32) -> Option<usize> {
        if category >= 1 && category as usize <= self.categories.len() {
            Some(category as usize - 1)
        } else {
            None
        }
    }

    /// All buckets of one category.
    pub fn buckets(&self, category: u32) -> Option<&[Bucket]> {
        self.index(category).map(|i| self.categories[i].as_slice())
    }

    pub fn bucket(&self, category: u32, metric: Metric) -> Option<&Bucket> {
        self.buckets(category).map(|b| &b[metric as usize])
    }

    pub fn histogram_1d(&self, category: u32, metric: Metric) -> Option<&Histogram1D> {
        self.bucket(category, metric).and_then(Bucket::as_1d)
    }

    pub fn histogram_2d(&self, category: u32, metric: Metric) -> Option<&Histogram2D> {
        self.bucket(category, metric).and_then(Bucket::as_2d)
    }

    /// Merge partial buckets (e.g. from another worker) into this aggregator.
    pub fn merge(&mut self, other: &MetricAggregator) -> Result<(), HistogramError> {
        for (mine, theirs) in self.categories.iter_mut().zip(&other.categories) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                a.add(b)?;
            }
        }
        Ok(())
    }

    fn fill1(&mut self, category: u32, metric: Metric, x: f64) {
        let Some(i) = self.index(category) else {
            return;
        };
        if let Bucket::OneD(h) = &mut self.categories[i][metric as usize] {
            h.fill(x);
        }
    }

    fn fill2(&mut self, category: u32, metric: Metric, x: f64, y: f64) {
        let Some(i) = self.index(category) else {
            return;
        };
        if let Bucket::TwoD(h) = &mut self.categories[i][metric as usize] {
            h.fill(x, y);
        }
    }

    // ── Energy comparison ──────────────────────────────────────────────────

    /// One matched truth/sim particle pair (MeV).
    pub fn fill_single_energies(&mut self, category: u32, truth_ke: f64, sim_ke: f64) {
        self.fill2(category, Metric::SingleEnergies, truth_ke, sim_ke);
    }

    /// Event-total kinetic energy on both sides (MeV).
    pub fn fill_total_energy(&mut self, category: u32, truth_total: f64, sim_total: f64) {
        self.fill2(category, Metric::TotalEnergy, truth_total, sim_total);
    }

    /// Truth minus sim event-total kinetic energy (MeV).
    pub fn fill_ediff(&mut self, category: u32, diff: f64) {
        self.fill1(category, Metric::Ediff, diff);
    }

    // ── Optical response ───────────────────────────────────────────────────

    pub fn fill_photons_vs_ke(&mut self, category: u32, ke: f64, photons: &PhotonCounts) {
        self.fill2(category, Metric::PhotonsVsKe, ke, photons.total());
        self.fill2(category, Metric::ScintPhotonsVsKe, ke, photons.scintillation);
        self.fill2(category, Metric::CherenkovPhotonsVsKe, ke, photons.cherenkov);
        self.fill2(category, Metric::RemPhotonsVsKe, ke, photons.reemitted);
    }

    pub fn fill_pes_vs_ke(&mut self, category: u32, ke: f64, pes: f64) {
        self.fill2(category, Metric::PesVsKe, ke, pes);
    }

    // ── Marginals ──────────────────────────────────────────────────────────

    /// Vertex position in mm.
    pub fn fill_positions(&mut self, category: u32, side: Side, pos: &Vector3) {
        use Metric::*;
        let [x, y, z, r, xy, xz, yz] = match side {
            Side::Sim => [PosX, PosY, PosZ, PosR, PosXY, PosXZ, PosYZ],
            Side::Truth => [
                PosXInput, PosYInput, PosZInput, PosRInput, PosXYInput, PosXZInput, PosYZInput,
            ],
        };
        self.fill1(category, x, pos.x);
        self.fill1(category, y, pos.y);
        self.fill1(category, z, pos.z);
        self.fill1(category, r, pos.norm());
        self.fill2(category, xy, pos.x, pos.y);
        self.fill2(category, xz, pos.x, pos.z);
        self.fill2(category, yz, pos.y, pos.z);
    }

    /// Unit direction `(u, v, w)`.
    pub fn fill_directions(&mut self, category: u32, side: Side, dir: &Vector3) {
        let [u, v, w] = match side {
            Side::Sim => [Metric::DirU, Metric::DirV, Metric::DirW],
            Side::Truth => [Metric::DirUInput, Metric::DirVInput, Metric::DirWInput],
        };
        self.fill1(category, u, dir.x);
        self.fill1(category, v, dir.y);
        self.fill1(category, w, dir.z);
    }

    pub fn fill_species(&mut self, category: u32, side: Side, pdg: i32) {
        let metric = match side {
            Side::Sim => Metric::Pdg,
            Side::Truth => Metric::PdgInput,
        };
        self.fill1(category, metric, pdg as f64);
    }

    pub fn fill_multiplicities(&mut self, category: u32, counts: &SpeciesCounts) {
        self.fill1(category, Metric::MultElectrons, counts.electrons as f64);
        self.fill1(category, Metric::MultMuons, counts.muons as f64);
        self.fill1(category, Metric::MultPions, counts.pions as f64);
        self.fill1(category, Metric::MultProtons, counts.protons as f64);
        self.fill1(category, Metric::MultNeutrons, counts.neutrons as f64);
        self.fill1(category, Metric::MultOther, counts.other as f64);
    }

    pub fn fill_particle_counts(
        &mut self,
        category: u32,
        n_input: usize,
        n_output: usize,
        n_matched: usize,
    ) {
        self.fill1(category, Metric::NParticlesInput, n_input as f64);
        self.fill1(category, Metric::NParticlesOutput, n_output as f64);
        self.fill1(category, Metric::NParticlesMatched, n_matched as f64);
    }

    /// Angular distributions of one particle, overall and for its species.
    pub fn fill_angles(&mut self, category: u32, species: Species, dir: &Vector3, ke: f64) {
        let a = Angles::from_direction(dir);
        self.fill1(category, Metric::Theta, a.theta);
        self.fill1(category, Metric::Phi, a.phi);
        self.fill1(category, Metric::CosTheta, a.cos_theta);
        self.fill2(category, Metric::ThetaPhi, a.theta, a.phi);
        self.fill2(category, Metric::ThetaVsEnergy, ke, a.theta);
        self.fill2(category, Metric::PhiVsEnergy, ke, a.phi);
        let per_species = match species {
            Species::Electron => Some(Metric::ThetaElectrons),
            Species::Muon => Some(Metric::ThetaMuons),
            Species::Pion => Some(Metric::ThetaPions),
            Species::Proton => Some(Metric::ThetaProtons),
            _ => None,
        };
        if let Some(metric) = per_species {
            self.fill1(category, metric, a.theta);
        }
    }

    // ── Light yield and resolutions ────────────────────────────────────────

    /// Photoelectrons per MeV of simulated kinetic energy. Ignored when `ke <= 0`.
    pub fn fill_light_yield(&mut self, category: u32, ke: f64, pes: f64, class: LightYieldClass) {
        if ke.is_nan() || ke <= 0.0 {
            return;
        }
        let pe_per_mev = pes / ke;
        self.fill2(category, Metric::PePerMevVsEnergy, ke, pe_per_mev);
        let metric = match class {
            LightYieldClass::Electron => Metric::PePerMevElectrons,
            LightYieldClass::Muon => Metric::PePerMevMuons,
            LightYieldClass::Hadron => Metric::PePerMevHadrons,
        };
        self.fill1(category, metric, pe_per_mev);
    }

    /// Relative difference `(E_truth − E_sim) / E_truth`. Ignored when `E_truth <= 0`.
    pub fn fill_energy_resolution(&mut self, category: u32, e_truth: f64, e_sim: f64) {
        if e_truth.is_nan() || e_truth <= 0.0 {
            return;
        }
        let rel = (e_truth - e_sim) / e_truth;
        self.fill2(category, Metric::EnergyResolutionVsE, e_truth, rel);
        self.fill1(category, Metric::EnergyResolution, rel);
    }

    /// Truth minus sim vertex in mm.
    pub fn fill_position_resolution(&mut self, category: u32, delta: &Vector3) {
        self.fill1(category, Metric::PosResX, delta.x);
        self.fill1(category, Metric::PosResY, delta.y);
        self.fill1(category, Metric::PosResZ, delta.z);
        self.fill1(category, Metric::PosResR, delta.norm());
    }
}
