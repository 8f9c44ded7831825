//! Sample categories: the neutrino flavor of each production dataset.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid category '{0}': expected 1-4 or one of nue, numu, anue, anumu")]
pub struct InvalidCategory(pub String);

/// Flavor of the primary neutrino in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    Nue = 1,
    Numu = 2,
    Anue = 3,
    Anumu = 4,
}

impl Flavor {
    pub const ALL: [Flavor; 4] = [Flavor::Nue, Flavor::Numu, Flavor::Anue, Flavor::Anumu];

    /// Number of categories, i.e. the highest valid id.
    pub const COUNT: u32 = 4;

    pub fn from_id(id: u32) -> Result<Self, InvalidCategory> {
        match id {
            1 => Ok(Flavor::Nue),
            2 => Ok(Flavor::Numu),
            3 => Ok(Flavor::Anue),
            4 => Ok(Flavor::Anumu),
            _ => Err(InvalidCategory(id.to_string())),
        }
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    /// Dataset label used in paths and report names.
    pub fn label(self) -> &'static str {
        match self {
            Flavor::Nue => "nue",
            Flavor::Numu => "numu",
            Flavor::Anue => "anue",
            Flavor::Anumu => "anumu",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Flavor {
    type Err = InvalidCategory;

    /// Accepts either the numeric id or the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u32>() {
            return Flavor::from_id(id);
        }
        Flavor::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}
