//! # Engine Error Types
//!
//! Everything the host-facing engine can report.

use nanoscribe_hardware::HardwareError;
use nanoscribe_slicing::SliceError;
use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid filter input (the host's InvalidArgument).
    #[error(transparent)]
    Slice(#[from] SliceError),

    /// Invalid coordinator setting.
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading configuration or spawning a stress worker failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
