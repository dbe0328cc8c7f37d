//! `recordmerge-resolve`: entity resolution engine for flat contact records.
//!
//! Pure engine crate: receives pre-loaded records, returns the deduplicated
//! collection plus groups and an audit trail. The CSV helpers in [`ingest`]
//! work on in-memory text; no filesystem access.

pub mod classify;
pub mod cluster;
pub mod completeness;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod similarity;

pub use cluster::{AllPairs, CandidateGenerator, NamePrefixBlocking};
pub use config::{DedupConfig, Strategy};
pub use engine::{run, run_cross, run_cross_with, run_with};
pub use error::{DedupError, GroupError};
pub use model::{DedupResult, Field, Record};
