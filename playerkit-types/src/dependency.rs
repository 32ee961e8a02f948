use serde::{Deserialize, Serialize};
use std::fmt;

/// A single external library coordinate to be ensured present in a build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyReference {
    /// Identity used for presence checks (`group:artifact`, pod name, npm package, ...).
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Minimum platform version the dependency requires (CocoaPods `platform :ios`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
}

impl DependencyReference {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: None,
            platform_version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_platform_version(mut self, platform_version: impl Into<String>) -> Self {
        self.platform_version = Some(platform_version.into());
        self
    }

    /// `identifier:version` when a version is pinned, otherwise the bare identifier.
    pub fn coordinate(&self) -> String {
        match &self.version {
            Some(v) => format!("{}:{}", self.identifier, v),
            None => self.identifier.clone(),
        }
    }
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coordinate())
    }
}

/// Where new content attaches relative to an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Before,
    After,
    Append,
}

/// Attachment point for an insertion inside a build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertionPoint {
    /// Name of an existing container: a project group path, an element name, ...
    pub anchor: String,
    pub position: Position,
}

impl InsertionPoint {
    pub fn append_to(anchor: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
            position: Position::Append,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_includes_version_only_when_pinned() {
        let bare = DependencyReference::new("AmazonIVSPlayer");
        assert_eq!(bare.coordinate(), "AmazonIVSPlayer");

        let pinned = DependencyReference::new("com.google.android.exoplayer:exoplayer")
            .with_version("2.13.2");
        assert_eq!(
            pinned.coordinate(),
            "com.google.android.exoplayer:exoplayer:2.13.2"
        );
    }

    #[test]
    fn optional_fields_are_skipped_when_absent() {
        let json = serde_json::to_value(DependencyReference::new("video.js")).unwrap();
        assert_eq!(json, serde_json::json!({ "identifier": "video.js" }));
    }
}
