//! Kinematic quantities derived from raw generator four-vectors.
//!
//! The generator provides total energy and momentum in GeV. Kinetic energy is
//! recovered through the invariant mass:
//!
//! 1. `m = sqrt(E² − |p|²)`
//! 2. `KE = (E − m) · 1000` (GeV → MeV)
//!
//! A four-vector with `E² < |p|²` has no real rest mass. Rather than letting the
//! resulting NaN flow into the histograms, [`kinetic_energy_mev`] reports it as
//! [`InvalidKinematics`] and the caller drops the particle and counts it.

use thiserror::Error;

use crate::Vector3;

const GEV_TO_MEV: f64 = 1000.0;

/// Reasons a generator four-momentum cannot yield a kinetic energy.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidKinematics {
    #[error("non-finite four-momentum component")]
    NonFinite,
    #[error("negative total energy E = {energy} GeV")]
    NegativeEnergy { energy: f64 },
    #[error("space-like four-momentum: E² = {e2:.6e} < |p|² = {p2:.6e}")]
    SpaceLike { e2: f64, p2: f64 },
}

/// Kinetic energy in MeV from `(px, py, pz, E)` in GeV.
pub fn kinetic_energy_mev(p4: [f64; 4]) -> Result<f64, InvalidKinematics> {
    let [px, py, pz, e] = p4;
    if !p4.iter().all(|v| v.is_finite()) {
        return Err(InvalidKinematics::NonFinite);
    }
    if e < 0.0 {
        return Err(InvalidKinematics::NegativeEnergy { energy: e });
    }
    let p2 = px * px + py * py + pz * pz;
    let e2 = e * e;
    if e2 < p2 {
        return Err(InvalidKinematics::SpaceLike { e2, p2 });
    }
    let mass = (e2 - p2).sqrt();
    // E ≥ m holds analytically; clamp away rounding noise for massless particles.
    Ok(((e - mass) * GEV_TO_MEV).max(0.0))
}

/// Unit direction of a momentum vector, or `None` if it has no length.
pub fn direction(momentum: &Vector3) -> Option<Vector3> {
    let norm = momentum.norm();
    if norm > 0.0 && norm.is_finite() {
        Some(momentum / norm)
    } else {
        None
    }
}

/// Spherical angles of a unit direction `(u, v, w)`, with the polar axis along +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angles {
    /// Polar angle in `[0, π]`.
    pub theta: f64,
    /// Azimuth in `[-π, π]`.
    pub phi: f64,
    pub cos_theta: f64,
}

impl Angles {
    pub fn from_direction(dir: &Vector3) -> Self {
        let w = dir.z.clamp(-1.0, 1.0);
        Angles {
            theta: w.acos(),
            phi: dir.y.atan2(dir.x),
            cos_theta: w,
        }
    }
}
