//! Particle records from the generator (truth) and the detector simulation,
//! plus the PDG-code helpers used to classify them.

use crate::Vector3;

/// Generator status code of a particle present at the end of the primary interaction.
pub const FINAL_STATE: i32 = 1;

/// A generator-level particle.
///
/// Four-momentum is `(px, py, pz, E)` in GeV; four-position is `(x, y, z, t)`
/// as written by the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthParticle {
    pub pdg: i32,
    pub status: i32,
    pub p4: [f64; 4],
    pub x4: [f64; 4],
}

impl TruthParticle {
    pub fn is_final_state(&self) -> bool {
        self.status == FINAL_STATE
    }

    pub fn momentum(&self) -> Vector3 {
        Vector3::new(self.p4[0], self.p4[1], self.p4[2])
    }

    pub fn energy(&self) -> f64 {
        self.p4[3]
    }

    pub fn position(&self) -> Vector3 {
        Vector3::new(self.x4[0], self.x4[1], self.x4[2])
    }
}

/// A particle as recorded by the detector simulation. Kinetic energy is in MeV,
/// positions in mm, direction is a unit vector `(u, v, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParticle {
    pub pdg: i32,
    pub position: Vector3,
    pub direction: Vector3,
    pub time: f64,
    pub ke_mev: f64,
}

// ── Species classification ──────────────────────────────────────────────────

/// Coarse particle species used for multiplicity and angular breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Electron,
    Muon,
    Pion,
    Proton,
    Neutron,
    Neutrino,
    Other,
}

impl Species {
    pub fn from_pdg(pdg: i32) -> Self {
        match pdg.abs() {
            11 => Species::Electron,
            13 => Species::Muon,
            111 | 211 => Species::Pion,
            2212 => Species::Proton,
            2112 => Species::Neutron,
            12 | 14 | 16 => Species::Neutrino,
            _ => Species::Other,
        }
    }
}

/// Whether a PDG code is any (anti)neutrino flavor.
pub fn is_neutrino(pdg: i32) -> bool {
    matches!(pdg.abs(), 12 | 14 | 16)
}

/// Classes used to split the light-yield distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightYieldClass {
    Electron,
    Muon,
    Hadron,
}

impl LightYieldClass {
    pub fn from_pdg(pdg: i32) -> Self {
        match pdg.abs() {
            11 => LightYieldClass::Electron,
            13 => LightYieldClass::Muon,
            _ => LightYieldClass::Hadron,
        }
    }
}

/// Per-event multiplicity of each species.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeciesCounts {
    pub electrons: u32,
    pub muons: u32,
    pub pions: u32,
    pub protons: u32,
    pub neutrons: u32,
    pub other: u32,
}

impl SpeciesCounts {
    /// Tally species over a list of PDG codes. Neutrinos are counted as "other".
    pub fn from_pdgs<I: IntoIterator<Item = i32>>(pdgs: I) -> Self {
        let mut counts = Self::default();
        for pdg in pdgs {
            match Species::from_pdg(pdg) {
                Species::Electron => counts.electrons += 1,
                Species::Muon => counts.muons += 1,
                Species::Pion => counts.pions += 1,
                Species::Proton => counts.protons += 1,
                Species::Neutron => counts.neutrons += 1,
                Species::Neutrino | Species::Other => counts.other += 1,
            }
        }
        counts
    }
}

/// Human-readable name for the PDG codes that show up in neutrino interactions.
pub fn pdg_name(pdg: i32) -> &'static str {
    match pdg {
        11 => "e-",
        -11 => "e+",
        12 => "nu_e",
        -12 => "nu_e_bar",
        13 => "mu-",
        -13 => "mu+",
        14 => "nu_mu",
        -14 => "nu_mu_bar",
        15 => "tau-",
        -15 => "tau+",
        16 => "nu_tau",
        -16 => "nu_tau_bar",
        22 => "gamma",
        111 => "pi0",
        211 => "pi+",
        -211 => "pi-",
        130 => "K0_L",
        310 => "K0_S",
        311 => "K0",
        321 => "K+",
        -321 => "K-",
        2112 => "neutron",
        -2112 => "antineutron",
        2212 => "proton",
        -2212 => "antiproton",
        3122 => "Lambda0",
        3222 => "Sigma+",
        3212 => "Sigma0",
        3112 => "Sigma-",
        1000010020 => "deuteron",
        1000020040 => "alpha",
        _ => "unknown",
    }
}
