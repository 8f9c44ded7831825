//! Persisted run artifacts.
//!
//! A [`CategoryReport`] holds everything one validation run produced for a
//! category: its counters, its buckets and the configuration it ran with.
//! Reports of different categories are combined by [`MergedReport::combine`],
//! which sums every bucket into a `<name>_combined` bucket.

use std::path::Path;

use chrono::NaiveDateTime;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::{info, warn};

use crate::category::Flavor;
use crate::config::RunParameters;
use crate::counters::ValidationCounters;
use crate::metrics::{Bucket, Metric, BUCKET_SPECS};

/// Suffix of buckets summed over categories.
pub const COMBINED_SUFFIX: &str = "combined";

/// Artifact file name for a category label and run start time.
pub fn artifact_name(label: &str, started: &NaiveDateTime) -> String {
    format!("validate_{}_{}.rkyv", label, started.format("%Y%m%d_%H%M%S"))
}

/// Output of one validation run.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: u32,
    pub label: String,
    /// Run start, `YYYYMMDD_HHMMSS`.
    pub started: String,
    pub parameters: RunParameters,
    pub counters: ValidationCounters,
    /// One bucket per [`BUCKET_SPECS`] row, in table order.
    pub buckets: Vec<Bucket>,
}

impl CategoryReport {
    pub fn bucket(&self, metric: Metric) -> Option<&Bucket> {
        self.buckets.get(metric as usize)
    }

    pub fn bucket_by_name(&self, name: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.name() == name)
    }
}

/// Categories summed into one set of buckets.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct MergedReport {
    /// Labels of the reports that went in, in input order.
    pub labels: Vec<String>,
    pub counters: ValidationCounters,
    pub buckets: Vec<Bucket>,
}

impl MergedReport {
    /// Sum the buckets and counters of `reports`.
    ///
    /// Every report must carry the full bucket table with identical binning.
    /// Categories absent from the input are reported with a warning.
    pub fn combine(reports: &[CategoryReport]) -> anyhow::Result<Self> {
        let Some(first) = reports.first() else {
            anyhow::bail!("no reports to combine");
        };
        for r in reports {
            if r.buckets.len() != BUCKET_SPECS.len() {
                anyhow::bail!(
                    "report '{}' holds {} buckets, expected {}",
                    r.label,
                    r.buckets.len(),
                    BUCKET_SPECS.len()
                );
            }
            if r.parameters != first.parameters {
                warn!(
                    "Report '{}' was produced with different run parameters than '{}'",
                    r.label, first.label
                );
            }
        }
        for flavor in Flavor::ALL {
            if !reports.iter().any(|r| r.category == flavor.id()) {
                warn!("No report for category {} ({})", flavor.id(), flavor);
            }
        }

        let mut buckets: Vec<Bucket> = BUCKET_SPECS
            .iter()
            .zip(&first.buckets)
            .map(|(spec, b)| b.renamed(format!("{}_{}", spec.name, COMBINED_SUFFIX)))
            .collect();
        let mut counters = first.counters;
        for r in &reports[1..] {
            for (acc, b) in buckets.iter_mut().zip(&r.buckets) {
                acc.add(b)?;
            }
            counters.absorb(&r.counters);
        }

        Ok(MergedReport {
            labels: reports.iter().map(|r| r.label.clone()).collect(),
            counters,
            buckets,
        })
    }

    pub fn bucket(&self, metric: Metric) -> Option<&Bucket> {
        self.buckets.get(metric as usize)
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl CategoryReport {
    /// Serialize the report to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Save the report to a file using rkyv.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path, &bytes)?;
        info!("Saved report to {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    /// Load a report from an rkyv file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let report = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))?;
        info!(
            "Loaded report '{}': {} buckets, {} events",
            report.label,
            report.buckets.len(),
            report.counters.total_events
        );
        Ok(report)
    }
}

impl MergedReport {
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path, &bytes)?;
        info!("Saved merged report to {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))
    }
}
