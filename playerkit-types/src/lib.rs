//! Shared DTOs for the playerkit workspace.
//!
//! # Design constraints
//! - Reports are serialized to disk; prefer adding optional fields over changing semantics.
//! - Nothing here performs I/O.

pub mod dependency;
pub mod params;
pub mod platform;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const PLAYERKIT_REPORT_V1: &str = "playerkit.report.v1";
}
