//! Georeferencing service library.
//!
//! This module exposes the pipeline stages and I/O collaborators used by the
//! `georef-tiler` binary so they can be tested without a network.

pub mod config;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod workdir;

pub use config::{Args, Job, OutputConfig};
pub use fetch::{Fetcher, Source};
pub use pipeline::{georeference, run, Georeferenced, RunSummary};
pub use workdir::WorkDir;
