//! # simval
//!
//! Event-by-event **validation of a detector simulation** against the generator
//! truth it was produced from.
//!
//! Each simulated event is paired with the generator event it came from, the
//! kinematics of both sides are compared, and the comparison is reduced into a
//! fixed table of binned distributions per sample category, together with a set
//! of anomaly counters. Optionally every event is drawn as a photoelectron map on
//! the six faces of the detector.
//!
//! ## Features
//!
//! - **Deterministic alignment**: simulation shards of 100 events are paired
//!   with the truth store by index, no lookup tables
//! - **Fixed binning table**: every distribution's name, range and bin count is
//!   part of [`BUCKET_SPECS`]
//! - **Never aborts on bad data**: unreadable shards, malformed rows and
//!   unphysical four-momenta are counted and skipped
//! - **Mergeable**: histograms of identical binning add, so per-category reports
//!   combine into `_combined` buckets
//! - **Zero-copy reports**: artifacts serialize with [rkyv](https://docs.rs/rkyv)
//!
//! ## Example
//!
//! ```no_run
//! use simval::{Flavor, ShardLocator, ValidationConfig, ValidationRun};
//!
//! let locator = ShardLocator::from_env("nue").unwrap();
//! let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
//! run.process_shards(&locator, 0..10);
//!
//! let report = run.finish();
//! println!("{}", report.counters.summary(&report.label));
//! report.save_to_file("validate_nue.rkyv").unwrap();
//! ```
//!
//! ## Pipeline
//!
//! 1. **Open** the truth and simulation stores of a shard ([`store`])
//! 2. **Align** primary simulation entries with truth entries ([`align`])
//! 3. **Reconstruct** kinetic energies and directions from four-vectors
//!    ([`kinematics`])
//! 4. **Accumulate** comparison metrics and counters ([`metrics`], [`counters`])
//! 5. **Display** the event on the detector faces ([`geometry`], [`display`])
//! 6. **Report** and merge across categories ([`report`])
//!

pub mod align;
pub mod category;
pub mod config;
pub mod counters;
pub mod display;
pub mod geometry;
pub mod histogram;
pub mod kinematics;
pub mod locator;
pub mod metrics;
pub mod particle;
pub mod processor;
pub mod report;
pub mod store;

pub use align::{EventPair, RecordAligner, ENTRIES_PER_SHARD};
pub use category::Flavor;
pub use config::{Cuts, RunParameters, ValidationConfig};
pub use counters::ValidationCounters;
#[cfg(feature = "render")]
pub use display::EventRenderer;
pub use display::EventDisplay;
pub use geometry::{Face, FaceMap, GeometryClassifier};
pub use histogram::{Axis, Histogram1D, Histogram2D};
pub use locator::ShardLocator;
pub use metrics::{Bucket, Metric, MetricAggregator, BUCKET_SPECS};
pub use processor::{ShardStatus, ValidationRun};
pub use report::{CategoryReport, MergedReport};
pub use store::{SimStore, StoreError, TruthStore};

// Positions are in mm, except sensor geometry which is held in metres.
pub type Vector3 = nalgebra::Vector3<f64>;
