//! Format adapters for playerkit.
//!
//! Responsibilities:
//! - Parse each build descriptor format far enough to find stable anchors.
//! - Apply idempotent mutations as text splices, preserving untouched bytes.
//! - Write descriptors back atomically and render unified diff previews.

pub mod android_manifest;
pub mod descriptor;
pub mod error;
pub mod gradle;
pub mod installer;
pub mod markup;
pub mod package_json;
pub mod pbxproj;
pub mod podfile;
pub mod splice;

pub use error::{IntegrationError, IntegrationResult};

use camino::Utf8Path;
use playerkit_types::dependency::DependencyReference;

/// A text descriptor that declares library dependencies inline.
pub trait DependencyDescriptor {
    fn path(&self) -> &Utf8Path;

    /// Current text, including any mutations made so far.
    fn as_text(&self) -> &str;

    /// Presence by the format's identity rule, ignoring versions.
    fn has_dependency(&self, dep: &DependencyReference) -> bool;

    /// Append a declaration unless one is present. Returns true on change.
    fn ensure_dependency(&mut self, dep: &DependencyReference) -> IntegrationResult<bool>;
}
