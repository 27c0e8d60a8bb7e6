//! shapetally-io: Side effects around the pure pipeline.
//!
//! Reads configuration from the environment, writes the annotated
//! artifact to disk, and talks to the optional description service.
//! [`ShapeService`] ties these to `shapetally-pipeline` and
//! `shapetally-export` for one request at a time.

pub mod config;
pub mod describe;
pub mod service;
pub mod sink;

pub use config::{ConfigError, DescriptionConfig, ServiceConfig};
pub use describe::{ChatDescriber, DescriptionError, Describer};
pub use service::{AnalysisReport, ServiceError, ShapeService};
pub use sink::{ArtifactSink, DirectorySink};
