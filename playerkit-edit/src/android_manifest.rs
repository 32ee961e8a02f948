//! `AndroidManifest.xml`: only the application package is read.

use crate::error::{IntegrationError, IntegrationResult};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::sync::LazyLock;

static MANIFEST_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<manifest\b([^>]*)>").expect("valid regex"));
static PACKAGE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)package\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static JAVA_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidManifest {
    path: Utf8PathBuf,
    package: String,
}

impl AndroidManifest {
    /// Extract the `package` attribute of the root `<manifest>` element.
    ///
    /// A file without a `<manifest>` element is malformed; a manifest
    /// without a usable package leaves the source directory undeterminable.
    pub fn parse(path: impl Into<Utf8PathBuf>, text: &str) -> IntegrationResult<Self> {
        let path = path.into();
        let attrs = MANIFEST_TAG
            .captures(text)
            .and_then(|c| c.get(1))
            .ok_or_else(|| IntegrationError::descriptor_parse(&path, "no <manifest> element"))?
            .as_str();

        let package = PACKAGE_ATTR
            .captures(attrs)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .ok_or_else(|| {
                IntegrationError::project_structure(&path, "<manifest> has no `package` attribute")
            })?;

        if !JAVA_PACKAGE.is_match(&package) {
            return Err(IntegrationError::project_structure(
                &path,
                format!("`{package}` is not a valid application package"),
            ));
        }

        Ok(Self { path, package })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Package as a relative directory: `com.example.app` -> `com/example/app`.
    pub fn package_dir(&self) -> Utf8PathBuf {
        self.package.split('.').collect()
    }
}
