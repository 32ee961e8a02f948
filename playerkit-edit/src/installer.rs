//! Package installation capability.
//!
//! Installing a package is the one step that leaves the process. Callers
//! receive it as a trait object so runs can be tested without npm or
//! CocoaPods on the machine.

use crate::error::IntegrationResult;
use camino::Utf8Path;
use playerkit_types::dependency::DependencyReference;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    CocoaPods,
}

impl Ecosystem {
    /// Command line an operator would run to perform the install by hand.
    pub fn install_command(self, dep: &DependencyReference) -> Vec<String> {
        match self {
            Ecosystem::Npm => vec![
                "npm".to_string(),
                "install".to_string(),
                dep.identifier.clone(),
            ],
            // Pods are declared in the Podfile; install resolves all of them.
            Ecosystem::CocoaPods => vec!["pod".to_string(), "install".to_string()],
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ecosystem::Npm => "npm",
            Ecosystem::CocoaPods => "cocoapods",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The package manager ran and succeeded.
    Installed,
    /// Nothing ran; the operator has to run `command`.
    Deferred { command: String },
}

pub trait PackageInstaller {
    /// Make `dep` present in the project at `project_root`. Blocks until the
    /// package manager exits.
    fn ensure_package_present(
        &self,
        ecosystem: Ecosystem,
        project_root: &Utf8Path,
        dep: &DependencyReference,
    ) -> IntegrationResult<InstallOutcome>;
}
