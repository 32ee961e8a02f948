//! Port traits abstracting all I/O away from the orchestrator.

use crate::templates::Template;
use camino::Utf8Path;
use playerkit_edit::IntegrationResult;
use playerkit_types::params::IntegrationParameters;

pub use playerkit_edit::installer::{Ecosystem, InstallOutcome, PackageInstaller};

/// File-system write operations.
pub trait WritePort {
    /// Replace `path` with `contents`, creating parent directories.
    fn write_file(&self, path: &Utf8Path, contents: &str) -> IntegrationResult<()>;
}

/// Fills named parameters into a template. No control flow.
pub trait TemplateRenderer {
    fn render(
        &self,
        template: &Template,
        params: &IntegrationParameters,
    ) -> Result<String, TemplateError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template `{template}` references unknown parameter `{name}`")]
    UnknownParameter { template: String, name: String },
}
