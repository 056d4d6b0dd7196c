//! Multi-level geographic rollup of ZIP records.
//!
//! Records are bucketed per tier ([`bucket`]), each bucket becomes one
//! published feature with summary statistics and a synthetic six-month
//! trend ([`synthesize`]), and [`run`] writes one FeatureCollection per tier
//! plus a manifest.

pub mod bucket;
pub mod run;
pub mod synthesize;
pub mod types;
pub mod utility;

pub use bucket::{AggregationResult, Bucket, aggregate};
pub use run::{LevelOutput, RunOptions, RunReport, build_level, run, run_from_files};
pub use synthesize::{AggregatedFeature, PaddingPolicy, synthesize};
