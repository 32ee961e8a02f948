//! Clap-free settings for an integration run.

use camino::Utf8PathBuf;
use playerkit_types::platform::{PlatformKind, ServiceDescriptor, WebFramework};

/// Web project shape; ignored for native platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSettings {
    pub framework: WebFramework,
    pub source_dir: String,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            framework: WebFramework::None,
            source_dir: "src".to_string(),
        }
    }
}

/// Settings for the integration pipeline.
#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub project_root: Utf8PathBuf,
    pub platform: PlatformKind,

    /// iOS project name; discovered from the single `*.xcodeproj` when unset.
    pub project_name: Option<String>,
    pub web: WebSettings,
    pub service: ServiceDescriptor,

    // Behaviour
    pub dry_run: bool,
    pub install_enabled: bool,
}

impl IntegrationSettings {
    pub fn new(
        project_root: Utf8PathBuf,
        platform: PlatformKind,
        service: ServiceDescriptor,
    ) -> Self {
        Self {
            project_root,
            platform,
            project_name: None,
            web: WebSettings::default(),
            service,
            dry_run: false,
            install_enabled: true,
        }
    }
}
