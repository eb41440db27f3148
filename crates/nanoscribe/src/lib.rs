//! # NANOSCRIBE Engine
//!
//! Host-facing facade for the lithography control engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  HOST CONTROL LAYER                     │
//! │   count_overlaps_*            run_*_stress              │
//! └────────────┬──────────────────────────┬─────────────────┘
//!              │                          │
//! ┌────────────▼───────────┐  ┌───────────▼─────────────────┐
//! │  nanoscribe_slicing    │  │  nanoscribe_hardware        │
//! │  OverlapFilter         │  │  HardwareCoordinator        │
//! │  scalar / batched      │  │  laser + stage lock pair    │
//! └────────────────────────┘  └───────────┬─────────────────┘
//!                                         │
//!                             ┌───────────▼─────────────────┐
//!                             │  StressHarness (watchdog)   │
//!                             └─────────────────────────────┘
//! ```
//!
//! Libraries here only emit `tracing` events. Installing a subscriber is the
//! binary's job.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod error;
pub mod watchdog;

pub use config::{EngineConfig, FilterConfig, StressConfig};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use watchdog::{StressHarness, StressOutcome, TrialReport, WorkerPlan};

pub use nanoscribe_hardware::{AcquisitionProtocol, HardwareCoordinator, LockOrder};
pub use nanoscribe_slicing::{BatchWidth, BoundColumns, FilterKernel, LayerSpec, OverlapFilter};
