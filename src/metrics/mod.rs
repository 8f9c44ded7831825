//! Per-category metric buckets.
//!
//! Each sample category owns one copy of every bucket listed in
//! [`BUCKET_SPECS`]. The [`MetricAggregator`] exposes one `fill_*` operation per
//! metric family; filling is associative and commutative, so partial
//! aggregators can be combined with [`MetricAggregator::merge`].

pub mod binning;
mod aggregator;

pub use aggregator::{category_buckets, Bucket, MetricAggregator, Side};
pub use binning::{spec_by_name, BucketSpec, Metric, BUCKET_SPECS};
