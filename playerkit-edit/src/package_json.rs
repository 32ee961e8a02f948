//! Web `package.json`.
//!
//! The manifest is read, never written: additions go through the package
//! manager so the lockfile stays consistent with it.

use crate::error::{IntegrationError, IntegrationResult};
use crate::installer::{Ecosystem, InstallOutcome, PackageInstaller};
use camino::{Utf8Path, Utf8PathBuf};
use playerkit_types::dependency::DependencyReference;
use playerkit_types::report::DependencyStatus;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PackageManifest {
    path: Utf8PathBuf,
    value: Value,
}

impl PackageManifest {
    pub fn parse(path: impl Into<Utf8PathBuf>, text: &str) -> IntegrationResult<Self> {
        let path = path.into();
        let value: Value = serde_json::from_str(text)
            .map_err(|e| IntegrationError::descriptor_parse(&path, e.to_string()))?;
        if !value.is_object() {
            return Err(IntegrationError::descriptor_parse(
                &path,
                "top-level value is not an object",
            ));
        }
        if let Some(deps) = value.get("dependencies")
            && !deps.is_object()
        {
            return Err(IntegrationError::descriptor_parse(
                &path,
                "`dependencies` is not an object",
            ));
        }
        Ok(Self { path, value })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// True if `dependencies` has a key equal to the package name.
    pub fn has_dependency(&self, dep: &DependencyReference) -> bool {
        self.value
            .get("dependencies")
            .and_then(Value::as_object)
            .is_some_and(|deps| deps.contains_key(&dep.identifier))
    }

    /// Ask `installer` to add `dep` unless it is already declared.
    pub fn ensure_dependency(
        &self,
        installer: &dyn PackageInstaller,
        project_root: &Utf8Path,
        dep: &DependencyReference,
    ) -> IntegrationResult<DependencyStatus> {
        if self.has_dependency(dep) {
            debug!(package = %dep.identifier, "already declared");
            return Ok(DependencyStatus::AlreadyPresent);
        }
        info!(package = %dep.identifier, "installing");
        match installer.ensure_package_present(Ecosystem::Npm, project_root, dep)? {
            InstallOutcome::Installed => Ok(DependencyStatus::Installed),
            InstallOutcome::Deferred { .. } => Ok(DependencyStatus::Deferred),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording(RefCell<Vec<(Ecosystem, String)>>);

    impl PackageInstaller for Recording {
        fn ensure_package_present(
            &self,
            ecosystem: Ecosystem,
            _project_root: &Utf8Path,
            dep: &DependencyReference,
        ) -> IntegrationResult<InstallOutcome> {
            self.0.borrow_mut().push((ecosystem, dep.identifier.clone()));
            Ok(InstallOutcome::Installed)
        }
    }

    #[test]
    fn declared_package_skips_installer() {
        let manifest =
            PackageManifest::parse("package.json", r#"{"dependencies":{"video.js":"^7.11.4"}}"#)
                .unwrap();
        let installer = Recording::default();
        let status = manifest
            .ensure_dependency(
                &installer,
                Utf8Path::new("."),
                &DependencyReference::new("video.js"),
            )
            .unwrap();
        assert_eq!(status, DependencyStatus::AlreadyPresent);
        assert!(installer.0.borrow().is_empty());
    }

    #[test]
    fn dev_dependency_does_not_count() {
        let manifest =
            PackageManifest::parse("package.json", r#"{"devDependencies":{"video.js":"7"}}"#)
                .unwrap();
        let installer = Recording::default();
        let status = manifest
            .ensure_dependency(
                &installer,
                Utf8Path::new("."),
                &DependencyReference::new("video.js"),
            )
            .unwrap();
        assert_eq!(status, DependencyStatus::Installed);
        assert_eq!(
            installer.0.borrow().as_slice(),
            &[(Ecosystem::Npm, "video.js".to_string())]
        );
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = PackageManifest::parse("package.json", "{ name: x }").unwrap_err();
        assert_eq!(err.kind(), "descriptor_parse");
        let err = PackageManifest::parse("package.json", "[]").unwrap_err();
        assert_eq!(err.kind(), "descriptor_parse");
    }
}
