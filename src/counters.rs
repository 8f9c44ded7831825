//! Anomaly counters accumulated over a validation run.

use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

/// Increment-only counters. A fresh value is created for every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct ValidationCounters {
    /// Truth stores that do not exist or cannot be opened.
    pub truth_unreadable: u64,
    /// Simulation stores that do not exist or cannot be opened.
    pub sim_unreadable: u64,
    /// Truth stores missing a mandatory table or column, or with malformed cells.
    pub truth_corrupt: u64,
    /// Simulation stores missing a mandatory table or column, or with malformed cells.
    pub sim_corrupt: u64,
    /// Shards where both stores opened.
    pub valid_shards: u64,
    /// Shards where fewer primary entries were aligned than the simulation held.
    pub entries_mismatch: u64,
    /// Aligned event pairs processed.
    pub total_events: u64,
    /// Events whose truth and sim KE lists differ in length.
    pub ke_count_mismatch: u64,
    /// Events whose truth and sim vertices differ beyond tolerance.
    pub vertex_mismatch: u64,
    /// Truth particles dropped for an unphysical four-momentum.
    pub invalid_kinematics: u64,
    /// Events with a neutrino among the truth final-state particles.
    pub final_state_neutrino: u64,
    /// Events whose simulated vertex lies within the wall distance cut.
    pub near_wall: u64,
    /// Events whose total energies differ beyond the energy tolerance.
    pub energy_mismatch: u64,
    /// Events where the energy difference is not finite.
    pub diff_invalid: u64,
    /// Events where the energy difference falls outside the `h1d_Ediff` range.
    pub diff_out_range: u64,
    /// Events where the energy difference exceeds five times that range.
    pub diff_out_5x_range: u64,
    /// Events with an energy difference between 1 and 10 MeV.
    pub diff_1_10_mev: u64,
    /// Truth records cut down to the configured particle limit.
    pub truncated_truth: u64,
    /// Event displays written.
    pub displays_rendered: u64,
}

impl ValidationCounters {
    /// Add another set of counters into this one.
    pub fn absorb(&mut self, other: &ValidationCounters) {
        self.truth_unreadable += other.truth_unreadable;
        self.sim_unreadable += other.sim_unreadable;
        self.truth_corrupt += other.truth_corrupt;
        self.sim_corrupt += other.sim_corrupt;
        self.valid_shards += other.valid_shards;
        self.entries_mismatch += other.entries_mismatch;
        self.total_events += other.total_events;
        self.ke_count_mismatch += other.ke_count_mismatch;
        self.vertex_mismatch += other.vertex_mismatch;
        self.invalid_kinematics += other.invalid_kinematics;
        self.final_state_neutrino += other.final_state_neutrino;
        self.near_wall += other.near_wall;
        self.energy_mismatch += other.energy_mismatch;
        self.diff_invalid += other.diff_invalid;
        self.diff_out_range += other.diff_out_range;
        self.diff_out_5x_range += other.diff_out_5x_range;
        self.diff_1_10_mev += other.diff_1_10_mev;
        self.truncated_truth += other.truncated_truth;
        self.displays_rendered += other.displays_rendered;
    }

    /// Formatted end-of-run report for a category label.
    pub fn summary<'a>(&'a self, label: &'a str) -> Summary<'a> {
        Summary {
            counters: self,
            label,
        }
    }
}

/// Display adapter produced by [`ValidationCounters::summary`].
pub struct Summary<'a> {
    counters: &'a ValidationCounters,
    label: &'a str,
}

fn line(f: &mut fmt::Formatter<'_>, label: &str, value: u64) -> fmt::Result {
    writeln!(f, " - {label} = {value}")
}

fn line_with_percent(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: u64,
    total: u64,
) -> fmt::Result {
    write!(f, " - {label} = {value}")?;
    if total > 0 {
        let percent = 100.0 * value as f64 / total as f64;
        write!(f, " over {total} total events ({percent:.2}%)")?;
    }
    writeln!(f)
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.counters;
        let total = c.total_events;
        writeln!(f, "   Summary {}:", self.label)?;
        line(
            f,
            "Number of non-existing or corrupted input (genie) files",
            c.truth_unreadable + c.truth_corrupt,
        )?;
        line(
            f,
            "Number of non-existing or corrupted output (Ratpac) files",
            c.sim_unreadable + c.sim_corrupt,
        )?;
        line(f, "Number of I/O file pairs with number of entry mismatch", c.entries_mismatch)?;
        line_with_percent(
            f,
            "Number of primary events with true KE entries number mismatch",
            c.ke_count_mismatch,
            total,
        )?;
        line(f, "Number of events with I/O vtx position mismatch", c.vertex_mismatch)?;
        line(f, "Number of particles with invalid kinematics", c.invalid_kinematics)?;
        line_with_percent(
            f,
            "Number of events with a neutrino in the final state",
            c.final_state_neutrino,
            total,
        )?;
        line_with_percent(f, "Number of events close to a wall", c.near_wall, total)?;
        line_with_percent(
            f,
            "Number of events with I/O energy mismatch",
            c.energy_mismatch,
            total,
        )?;
        line_with_percent(f, "Number of events with invalid energy difference", c.diff_invalid, total)?;
        line_with_percent(
            f,
            "Number of events with energy difference out of range",
            c.diff_out_range,
            total,
        )?;
        line_with_percent(
            f,
            "Number of events with energy difference out of 5x range",
            c.diff_out_5x_range,
            total,
        )?;
        line_with_percent(
            f,
            "Number of events with energy difference in [1, 10) MeV",
            c.diff_1_10_mev,
            total,
        )?;
        line(f, "Number of truncated truth records", c.truncated_truth)?;
        line(f, "Number of event displays", c.displays_rendered)?;
        line(f, "Number of primary events analyzed", total)?;
        line(f, "Number of I/O file pairs analyzed", c.valid_shards)
    }
}
