//! Scheduler module.
//!
//! This module contains the discrete-event machinery: the ordered event
//! queue, the timed environment that owns agents and topology, and the
//! topology mutator used between recalibration steps.

pub mod environment;
pub mod error;
pub mod mutator;
pub mod queue;

pub use environment::{
    EnvironmentConfig, SchedulerState, SimulationStats, TimedEnvironment, DEFAULT_MAX_EVENTS,
};
pub use error::ProtocolError;
pub use queue::EventQueue;
