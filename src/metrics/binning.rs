//! Published binning of every accumulator bucket.
//!
//! Downstream plotting relies on these names, ranges and bin counts. Changing a
//! row breaks compatibility with previously written reports.

use std::f64::consts::PI;

use crate::histogram::Axis;

/// Every metric tracked per category. The discriminant indexes [`BUCKET_SPECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    SingleEnergies,
    TotalEnergy,
    Ediff,
    PhotonsVsKe,
    ScintPhotonsVsKe,
    CherenkovPhotonsVsKe,
    RemPhotonsVsKe,
    PesVsKe,
    PosX,
    PosY,
    PosZ,
    PosR,
    PosXY,
    PosXZ,
    PosYZ,
    PosXInput,
    PosYInput,
    PosZInput,
    PosRInput,
    PosXYInput,
    PosXZInput,
    PosYZInput,
    DirU,
    DirV,
    DirW,
    DirUInput,
    DirVInput,
    DirWInput,
    Pdg,
    PdgInput,
    MultElectrons,
    MultMuons,
    MultPions,
    MultProtons,
    MultNeutrons,
    MultOther,
    NParticlesInput,
    NParticlesOutput,
    NParticlesMatched,
    Theta,
    Phi,
    CosTheta,
    ThetaElectrons,
    ThetaMuons,
    ThetaPions,
    ThetaProtons,
    ThetaPhi,
    ThetaVsEnergy,
    PhiVsEnergy,
    PePerMevVsEnergy,
    PePerMevElectrons,
    PePerMevMuons,
    PePerMevHadrons,
    EnergyResolutionVsE,
    EnergyResolution,
    PosResX,
    PosResY,
    PosResZ,
    PosResR,
}

impl Metric {
    pub const COUNT: usize = Metric::PosResR as usize + 1;

    pub fn spec(self) -> &'static BucketSpec {
        &BUCKET_SPECS[self as usize]
    }
}

/// Name, title and binning of one bucket. `y` is `None` for 1D buckets.
#[derive(Debug, Clone, Copy)]
pub struct BucketSpec {
    pub metric: Metric,
    pub name: &'static str,
    /// `"title;x label;y label"`.
    pub title: &'static str,
    pub x: Axis,
    pub y: Option<Axis>,
}

impl BucketSpec {
    /// Persisted name of this bucket for a category, e.g. `h1d_Ediff_02`.
    pub fn name_for(&self, category: u32) -> String {
        format!("{}_{:02}", self.name, category)
    }

    pub fn is_2d(&self) -> bool {
        self.y.is_some()
    }
}

const KE: Axis = Axis::new(1000, 0.0, 10000.0);
const KE_COARSE: Axis = Axis::new(100, 0.0, 10000.0);
const PHOTONS: Axis = Axis::new(5000, 0.0, 5e7);
const POS: Axis = Axis::new(500, -50000.0, 50000.0);
const POS_R: Axis = Axis::new(500, 0.0, 60000.0);
const POS_PLANE: Axis = Axis::new(200, -50000.0, 50000.0);
const DIR: Axis = Axis::new(200, -1.0, 1.0);
const PDG: Axis = Axis::new(6000, -3000.0, 3000.0);
const MULT: Axis = Axis::new(50, 0.0, 50.0);
const THETA: Axis = Axis::new(180, 0.0, PI);
const PHI: Axis = Axis::new(360, -PI, PI);
const LIGHT_YIELD: Axis = Axis::new(200, 0.0, 10.0);
const RESOLUTION: Axis = Axis::new(200, -1.0, 1.0);
const POS_RES: Axis = Axis::new(200, -1000.0, 1000.0);

const fn h1(metric: Metric, name: &'static str, title: &'static str, x: Axis) -> BucketSpec {
    BucketSpec { metric, name, title, x, y: None }
}

const fn h2(
    metric: Metric,
    name: &'static str,
    title: &'static str,
    x: Axis,
    y: Axis,
) -> BucketSpec {
    BucketSpec { metric, name, title, x, y: Some(y) }
}

use Metric::*;

pub static BUCKET_SPECS: [BucketSpec; Metric::COUNT] = [
    // Energy comparison
    h2(SingleEnergies, "h2d_ioSingleEnergies", "Single Particle KE;GENIE KE [MeV];RATPAC KE [MeV]", KE, KE),
    h2(TotalEnergy, "h2d_ioTotalEnergy", "Total KE;GENIE Total KE [MeV];RATPAC Total KE [MeV]", KE, KE),
    h1(Ediff, "h1d_Ediff", "Energy difference;(E_in - E_out) [MeV];Entries", Axis::new(1000, -2.0, 2.0)),
    // Optical response
    h2(PhotonsVsKe, "h2d_oPhotonsVsKE", "Total Photons vs KE;KE [MeV];Photons", KE_COARSE, PHOTONS),
    h2(ScintPhotonsVsKe, "h2d_oScintPhotonsVsKE", "Scintillation Photons vs KE;KE [MeV];Scint Photons", KE_COARSE, PHOTONS),
    h2(CherenkovPhotonsVsKe, "h2d_oCherenkovPhotonsVsKE", "Cherenkov Photons vs KE;KE [MeV];Cherenkov Photons", KE_COARSE, PHOTONS),
    h2(RemPhotonsVsKe, "h2d_oRemPhotonsVsKE", "Reemitted Photons vs KE;KE [MeV];Reemitted Photons", KE_COARSE, Axis::new(100, 0.0, 100.0)),
    h2(PesVsKe, "h2d_oPEsVsKE", "PEs vs KE;KE [MeV];PEs", Axis::new(100, 0.0, 100000.0), Axis::new(1000, 0.0, 10000.0)),
    // Simulated vertex
    h1(PosX, "h1d_posX", "Vertex X;x [mm];Entries", POS),
    h1(PosY, "h1d_posY", "Vertex Y;y [mm];Entries", POS),
    h1(PosZ, "h1d_posZ", "Vertex Z;z [mm];Entries", POS),
    h1(PosR, "h1d_posR", "Vertex R;r [mm];Entries", POS_R),
    h2(PosXY, "h2d_posXY", "Vertex XY;x [mm];y [mm]", POS_PLANE, POS_PLANE),
    h2(PosXZ, "h2d_posXZ", "Vertex XZ;x [mm];z [mm]", POS_PLANE, POS_PLANE),
    h2(PosYZ, "h2d_posYZ", "Vertex YZ;y [mm];z [mm]", POS_PLANE, POS_PLANE),
    // Generator vertex
    h1(PosXInput, "h1d_posX_input", "Input Vertex X;x [mm];Entries", POS),
    h1(PosYInput, "h1d_posY_input", "Input Vertex Y;y [mm];Entries", POS),
    h1(PosZInput, "h1d_posZ_input", "Input Vertex Z;z [mm];Entries", POS),
    h1(PosRInput, "h1d_posR_input", "Input Vertex R;r [mm];Entries", POS_R),
    h2(PosXYInput, "h2d_posXY_input", "Input Vertex XY;x [mm];y [mm]", POS_PLANE, POS_PLANE),
    h2(PosXZInput, "h2d_posXZ_input", "Input Vertex XZ;x [mm];z [mm]", POS_PLANE, POS_PLANE),
    h2(PosYZInput, "h2d_posYZ_input", "Input Vertex YZ;y [mm];z [mm]", POS_PLANE, POS_PLANE),
    // Directions
    h1(DirU, "h1d_dirU", "Direction U;u;Entries", DIR),
    h1(DirV, "h1d_dirV", "Direction V;v;Entries", DIR),
    h1(DirW, "h1d_dirW", "Direction W;w;Entries", DIR),
    h1(DirUInput, "h1d_dirU_input", "Input Direction U;u;Entries", DIR),
    h1(DirVInput, "h1d_dirV_input", "Input Direction V;v;Entries", DIR),
    h1(DirWInput, "h1d_dirW_input", "Input Direction W;w;Entries", DIR),
    // Species
    h1(Pdg, "h1d_particle_pdg", "Particle PDG;PDG code;Entries", PDG),
    h1(PdgInput, "h1d_particle_pdg_input", "Input Particle PDG;PDG code;Entries", PDG),
    h1(MultElectrons, "h1d_mult_electrons", "Electron Multiplicity;N;Entries", MULT),
    h1(MultMuons, "h1d_mult_muons", "Muon Multiplicity;N;Entries", MULT),
    h1(MultPions, "h1d_mult_pions", "Pion Multiplicity;N;Entries", MULT),
    h1(MultProtons, "h1d_mult_protons", "Proton Multiplicity;N;Entries", MULT),
    h1(MultNeutrons, "h1d_mult_neutrons", "Neutron Multiplicity;N;Entries", MULT),
    h1(MultOther, "h1d_mult_other", "Other Multiplicity;N;Entries", MULT),
    h1(NParticlesInput, "h1d_nParticles_input", "Input Particle Multiplicity;N_particles;Entries", MULT),
    h1(NParticlesOutput, "h1d_nParticles_output", "Output Particle Multiplicity;N_particles;Entries", MULT),
    h1(NParticlesMatched, "h1d_nParticles_matched", "Matched Particles;N_matched;Entries", MULT),
    // Angles
    h1(Theta, "h1d_theta", "Polar Angle;theta [rad];Entries", THETA),
    h1(Phi, "h1d_phi", "Azimuthal Angle;phi [rad];Entries", PHI),
    h1(CosTheta, "h1d_costheta", "cos(theta);cos(theta);Entries", DIR),
    h1(ThetaElectrons, "h1d_theta_electrons", "Polar Angle Electrons;theta [rad];Entries", THETA),
    h1(ThetaMuons, "h1d_theta_muons", "Polar Angle Muons;theta [rad];Entries", THETA),
    h1(ThetaPions, "h1d_theta_pions", "Polar Angle Pions;theta [rad];Entries", THETA),
    h1(ThetaProtons, "h1d_theta_protons", "Polar Angle Protons;theta [rad];Entries", THETA),
    h2(ThetaPhi, "h2d_theta_phi", "Theta vs Phi;theta [rad];phi [rad]", THETA, PHI),
    h2(ThetaVsEnergy, "h2d_theta_vs_energy", "Theta vs KE;KE [MeV];theta [rad]", KE_COARSE, THETA),
    h2(PhiVsEnergy, "h2d_phi_vs_energy", "Phi vs KE;KE [MeV];phi [rad]", KE_COARSE, PHI),
    // Light yield
    h2(PePerMevVsEnergy, "h2d_PEperMeV_vs_Energy", "Light Yield vs Energy;Total KE [MeV];PE/MeV", KE_COARSE, LIGHT_YIELD),
    h1(PePerMevElectrons, "h1d_PEperMeV_electrons", "Light Yield for Electrons;PE/MeV;Entries", LIGHT_YIELD),
    h1(PePerMevMuons, "h1d_PEperMeV_muons", "Light Yield for Muons;PE/MeV;Entries", LIGHT_YIELD),
    h1(PePerMevHadrons, "h1d_PEperMeV_hadrons", "Light Yield for Hadrons;PE/MeV;Entries", LIGHT_YIELD),
    // Resolutions
    h2(EnergyResolutionVsE, "h2d_EnergyResolution_vs_E", "Energy Resolution vs Energy;E_true [MeV];(E_in - E_out)/E_in", KE_COARSE, RESOLUTION),
    h1(EnergyResolution, "h1d_EnergyResolution", "Energy Resolution;(E_in - E_out)/E_in;Entries", RESOLUTION),
    h1(PosResX, "h1d_posResX", "X Position Resolution;dX [mm];Entries", POS_RES),
    h1(PosResY, "h1d_posResY", "Y Position Resolution;dY [mm];Entries", POS_RES),
    h1(PosResZ, "h1d_posResZ", "Z Position Resolution;dZ [mm];Entries", POS_RES),
    h1(PosResR, "h1d_posResR", "Radial Position Resolution;dR [mm];Entries", Axis::new(200, 0.0, 2000.0)),
];

/// Look up a bucket spec by its base name (without category suffix).
pub fn spec_by_name(name: &str) -> Option<&'static BucketSpec> {
    BUCKET_SPECS.iter().find(|s| s.name == name)
}
