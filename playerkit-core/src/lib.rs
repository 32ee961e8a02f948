//! Embeddable core library for playerkit.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into an editor plugin or other host process.
//!
//! # Port traits
//!
//! Side effects go through the traits in [`ports`]:
//! - [`WritePort`](ports::WritePort) writes generated and mutated files
//! - [`PackageInstaller`](ports::PackageInstaller) runs npm or CocoaPods
//! - [`TemplateRenderer`](ports::TemplateRenderer) fills bundled templates
//!
//! The [`adapters`] module provides default filesystem and process backed
//! implementations plus in-memory ones for tests.
//!
//! # Entry point
//!
//! - [`run_integration`](pipeline::run_integration) drives one run and returns the report

pub mod adapters;
pub mod ledger;
pub mod paths;
pub mod pipeline;
pub mod ports;
pub mod settings;
pub mod templates;

// Re-export so embedders don't need playerkit-edit directly.
pub use playerkit_edit::{IntegrationError, IntegrationResult};
