//! Store paths for the shards of one production dataset.
//!
//! Layout under the data root:
//!
//! ```text
//! <root>/Ratpac_production/<tag>/INPUT/<label>/genie_<n>
//! <root>/Ratpac_production/<tag>/OUTPUT/<label>/theia_<label>_<first:06>_<last:06>
//! ```
//!
//! where shard `n` covers events `n·100+1 ..= (n+1)·100`.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::align::ENTRIES_PER_SHARD;

/// Environment variable naming the data root.
pub const DATA_PATH_VAR: &str = "THEIA_DATA_PATH";
/// Environment variable naming the production tag.
pub const PRODUCTION_TAG_VAR: &str = "THEIA_PRODUCTION_TAG";

const PRODUCTION_DIR: &str = "Ratpac_production";

/// Resolves the truth and simulation store directories of a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLocator {
    truth_root: PathBuf,
    sim_root: PathBuf,
    label: String,
}

impl ShardLocator {
    /// Locator over explicit per-category truth and simulation roots.
    pub fn new(truth_root: impl Into<PathBuf>, sim_root: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        ShardLocator {
            truth_root: truth_root.into(),
            sim_root: sim_root.into(),
            label: label.into(),
        }
    }

    /// Locator for the standard production layout.
    pub fn for_production(data_path: &Path, tag: &str, label: &str) -> Self {
        let base = data_path.join(PRODUCTION_DIR).join(tag);
        ShardLocator::new(
            base.join("INPUT").join(label),
            base.join("OUTPUT").join(label),
            label,
        )
    }

    /// Locator from `THEIA_DATA_PATH` and `THEIA_PRODUCTION_TAG`. Both must be set.
    pub fn from_env(label: &str) -> anyhow::Result<Self> {
        let data_path = std::env::var(DATA_PATH_VAR)
            .with_context(|| format!("{DATA_PATH_VAR} is not set"))?;
        let tag = std::env::var(PRODUCTION_TAG_VAR)
            .with_context(|| format!("{PRODUCTION_TAG_VAR} is not set"))?;
        Ok(ShardLocator::for_production(Path::new(&data_path), &tag, label))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// First and last event number covered by a shard.
    pub fn event_range(shard: usize) -> RangeInclusive<usize> {
        shard * ENTRIES_PER_SHARD + 1..=(shard + 1) * ENTRIES_PER_SHARD
    }

    pub fn truth_dir(&self, shard: usize) -> PathBuf {
        self.truth_root.join(format!("genie_{shard}"))
    }

    pub fn sim_dir(&self, shard: usize) -> PathBuf {
        let range = Self::event_range(shard);
        self.sim_root.join(format!(
            "theia_{}_{:06}_{:06}",
            self.label,
            range.start(),
            range.end()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_range() {
        assert_eq!(ShardLocator::event_range(0), 1..=100);
        assert_eq!(ShardLocator::event_range(4), 401..=500);
    }

    #[test]
    fn test_production_layout() {
        let loc = ShardLocator::for_production(Path::new("/data"), "v1", "numu");
        assert_eq!(
            loc.truth_dir(3),
            PathBuf::from("/data/Ratpac_production/v1/INPUT/numu/genie_3")
        );
        assert_eq!(
            loc.sim_dir(3),
            PathBuf::from("/data/Ratpac_production/v1/OUTPUT/numu/theia_numu_000301_000400")
        );
        assert_eq!(loc.label(), "numu");
    }

    #[test]
    fn test_explicit_roots() {
        let loc = ShardLocator::new("/t", "/s", "nue");
        assert_eq!(loc.truth_dir(0), PathBuf::from("/t/genie_0"));
        assert_eq!(loc.sim_dir(0), PathBuf::from("/s/theia_nue_000001_000100"));
    }
}
