use thiserror::Error;

use super::config::ConfigError;
use crate::core::geometry::GeometryError;
use crate::core::io::FileError;
use crate::core::io::json::JsonError;
use crate::core::models::columns::ConfigurationError;
use crate::core::models::segment::Segment;
use crate::core::topology::TopologyError;

/// Failures specific to replaying recorded sheet histories onto a monolayer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReplayError {
    #[error("Sheet history contains no frames")]
    EmptyHistory,

    #[error("Apical history has {apical} frames but basal history has {basal}")]
    FrameCountMismatch { apical: usize, basal: usize },

    #[error("Frame {frame} is stamped {apical} in the apical history but {basal} in the basal one")]
    TimestampMismatch { frame: usize, apical: f64, basal: f64 },

    #[error("No apical monolayer edge traces back to sheet edge {edge} at time {time}")]
    MissingEdge { time: f64, edge: usize },

    #[error("Recorded {segment} frame at time {time} has no vertex {vertex}")]
    MissingVertex {
        time: f64,
        segment: Segment,
        vertex: usize,
    },

    #[error("After replaying time {time} the monolayer has {actual} {what}, the recorded frame has {expected}")]
    FrameMismatch {
        time: f64,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid model configuration: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },

    #[error("Geometry update failed: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Topology operation failed: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Replay failed: {source}")]
    Replay {
        #[from]
        source: ReplayError,
    },

    #[error("Invalid parameters: {source}")]
    Parameters {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load configuration: {source}")]
    File {
        #[from]
        source: FileError,
    },

    #[error("Failed to read or write mesh data: {source}")]
    Json {
        #[from]
        source: JsonError,
    },
}
