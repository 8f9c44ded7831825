//! Run configuration.

use std::path::PathBuf;

use rkyv::{Archive, Deserialize, Serialize};

/// Event selection cuts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuts {
    /// Drop final-state neutrinos from the truth energy sum.
    pub nu_final: bool,
    /// Skip events whose simulated vertex is within `distance_cut_mm` of a wall.
    /// Needs loaded sensor geometry.
    pub to_wall: bool,
    /// Keep events whose total energies disagree beyond `e_tolerance` out of the
    /// energy-resolution distributions.
    pub e_match: bool,
    /// Relative tolerance on the truth vs sim total kinetic energy.
    pub e_tolerance: f64,
    /// Minimum distance from the vertex to any wall, in mm.
    pub distance_cut_mm: f64,
}

impl Default for Cuts {
    fn default() -> Self {
        Self {
            nu_final: true,
            to_wall: true,
            e_match: true,
            e_tolerance: 0.001,
            distance_cut_mm: 50.0,
        }
    }
}

/// Configuration of one validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Verbose per-event diagnostics.
    pub debug: bool,
    /// Render an image for every aligned event.
    pub event_display: bool,
    pub cuts: Cuts,
    /// Truth/sim vertices further apart than this (mm, per axis) count as a mismatch.
    pub vertex_tolerance_mm: f64,
    /// Soft limit on truth particles kept per event. `None` keeps all.
    pub max_truth_particles: Option<usize>,
    /// Multiplies geometry-table coordinates to get metres.
    pub sensor_length_scale: f64,
    /// Directory for event display images.
    pub plot_dir: PathBuf,
    /// Leading particles listed in an event display.
    pub max_listed_particles: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            debug: false,
            event_display: false,
            cuts: Cuts::default(),
            vertex_tolerance_mm: 1e-3,
            max_truth_particles: Some(100),
            sensor_length_scale: 1e-3,
            plot_dir: PathBuf::from("Plots"),
            max_listed_particles: 4,
        }
    }
}

impl ValidationConfig {
    pub fn run_parameters(&self) -> RunParameters {
        RunParameters {
            mode_debug: self.debug,
            mode_event_display: self.event_display,
            cut_nu_final: self.cuts.nu_final,
            cut_e_match: self.cuts.e_match,
            cut_to_wall: self.cuts.to_wall,
            e_tolerance: self.cuts.e_tolerance,
            distance_to_wall: self.cuts.distance_cut_mm,
        }
    }
}

/// Configuration provenance stored with every report.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct RunParameters {
    pub mode_debug: bool,
    pub mode_event_display: bool,
    pub cut_nu_final: bool,
    pub cut_e_match: bool,
    pub cut_to_wall: bool,
    pub e_tolerance: f64,
    pub distance_to_wall: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ValidationConfig::default();
        assert!(!cfg.debug);
        assert!(!cfg.event_display);
        assert!(cfg.cuts.nu_final && cfg.cuts.to_wall && cfg.cuts.e_match);
        assert_eq!(cfg.cuts.e_tolerance, 0.001);
        assert_eq!(cfg.cuts.distance_cut_mm, 50.0);
        assert_eq!(cfg.max_truth_particles, Some(100));
        assert_eq!(cfg.max_listed_particles, 4);
    }

    #[test]
    fn test_run_parameters_mirror_config() {
        let cfg = ValidationConfig {
            debug: true,
            cuts: Cuts {
                e_match: false,
                distance_cut_mm: 75.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let p = cfg.run_parameters();
        assert!(p.mode_debug);
        assert!(!p.mode_event_display);
        assert!(!p.cut_e_match);
        assert!(p.cut_nu_final);
        assert_eq!(p.distance_to_wall, 75.0);
    }
}
