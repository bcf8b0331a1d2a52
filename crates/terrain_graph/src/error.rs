//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! map dimension problems, graph wiring failures, node evaluation failures, cancellation of
//! background work, invalid configuration, IO, and generic errors.
use thiserror::Error;

use crate::graph::{NodeId, PortType};
use crate::maps::MapSize;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: MapSize, found: MapSize },

    #[error("invalid map dimension {width}x{height}")]
    InvalidDimension { width: usize, height: usize },

    #[error("map of {expected} cells was given {found} values")]
    LengthMismatch { expected: usize, found: usize },

    #[error("type mismatch: slot expects {expected}, source produces {found}")]
    TypeMismatch { expected: PortType, found: PortType },

    #[error("connecting {from} -> {to} would create a cycle")]
    CycleRejected { from: NodeId, to: NodeId },

    #[error("evaluation of node {node} failed: {reason}")]
    EvaluationFailed { node: NodeId, reason: String },

    #[error("computation cancelled")]
    Cancelled,

    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {node} has no input slot {port}")]
    InvalidPort { node: NodeId, port: usize },

    #[error("required input '{name}' is not connected")]
    MissingInput { name: String },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("degenerate input: {0}")]
    Degenerate(String),

    #[error("missing texture '{id}'")]
    MissingTexture { id: String },

    #[error("graph has no output node")]
    NoOutputNode,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
