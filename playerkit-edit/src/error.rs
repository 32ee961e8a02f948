//! Error taxonomy for playerkit-edit.
//!
//! Every variant is terminal for an integration run: nothing is retried and
//! nothing already written is rolled back. The operator fixes the project and
//! re-runs the whole integration.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    /// A required directory, file or derived value (e.g. the Android package)
    /// cannot be determined from the project layout.
    #[error("project structure: {message} ({path})")]
    ProjectStructure { path: Utf8PathBuf, message: String },

    /// The insertion anchor is missing or ambiguous.
    #[error("anchor not found in {path}: {message}")]
    AnchorNotFound { path: Utf8PathBuf, message: String },

    /// An on-disk build descriptor is not valid for its expected format.
    #[error("cannot parse {path}: {message}")]
    DescriptorParse { path: Utf8PathBuf, message: String },

    /// An external package installer failed or could not be started.
    #[error("`{command}` failed: {message}")]
    ExternalProcess { command: String, message: String },

    /// Plain filesystem failure while reading or writing a file.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntegrationError {
    pub fn project_structure(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        IntegrationError::ProjectStructure {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn anchor_not_found(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        IntegrationError::AnchorNotFound {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn descriptor_parse(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        IntegrationError::DescriptorParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        IntegrationError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short stable token for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IntegrationError::ProjectStructure { .. } => "project_structure",
            IntegrationError::AnchorNotFound { .. } => "anchor_not_found",
            IntegrationError::DescriptorParse { .. } => "descriptor_parse",
            IntegrationError::ExternalProcess { .. } => "external_process",
            IntegrationError::Io { .. } => "io",
        }
    }
}

/// Result type alias using IntegrationError.
pub type IntegrationResult<T> = Result<T, IntegrationError>;

#[cfg(test)]
mod tests {
    use super::IntegrationError;

    #[test]
    fn display_includes_path_and_message() {
        let err = IntegrationError::anchor_not_found("App.xcodeproj/project.pbxproj", "no group");
        let text = err.to_string();
        assert!(text.contains("anchor not found"));
        assert!(text.contains("App.xcodeproj/project.pbxproj"));
        assert!(text.contains("no group"));
    }

    #[test]
    fn kind_tokens_are_stable() {
        let err = IntegrationError::ExternalProcess {
            command: "npm install video.js".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(err.kind(), "external_process");
        assert!(err.to_string().contains("npm install video.js"));

        let err = IntegrationError::io(
            "x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), "io");
    }
}
