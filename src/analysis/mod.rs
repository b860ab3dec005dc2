//! Scenario analysis for flocksim runs.
//!
//! This module holds the report types produced by the orchestrator and
//! renders them as JSON or human-readable text.

pub mod report;
pub mod types;

pub use report::{generate_json_report, generate_text_report, print_summary, render_text_report};
pub use types::*;
