//! Configuration file loading for playerkit.
//!
//! Discovers and loads `playerkit.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use playerkit_core::settings::{IntegrationSettings, WebSettings};
use playerkit_types::platform::{PlatformKind, ServiceDescriptor, ServiceType, WebFramework};
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "playerkit.toml";

/// Top-level configuration from playerkit.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerkitConfig {
    pub project: ProjectConfig,
    pub web: WebConfig,
    pub service: ServiceConfig,
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// `ios`, `android` or `web`.
    pub platform: Option<String>,

    /// iOS project name (the `<name>.xcodeproj` bundle).
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub framework: Option<String>,

    /// Source directory relative to the project root.
    pub source_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub endpoint: Option<String>,
    pub channel_latency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Run npm / pod install after declaring a dependency.
    pub enabled: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Discover the playerkit.toml config file.
///
/// Returns `None` if no config file is found.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a playerkit.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<PlayerkitConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<PlayerkitConfig> {
    let config: PlayerkitConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<PlayerkitConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(PlayerkitConfig::default()),
    }
}

/// Values given on the command line. `None` defers to the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub platform: Option<String>,
    pub name: Option<String>,
    pub framework: Option<String>,
    pub source_dir: Option<String>,
    pub service_type: Option<String>,
    pub endpoint: Option<String>,
    pub channel_latency: Option<String>,
    pub dry_run: bool,
    pub no_install: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: PlayerkitConfig,
}

impl ConfigMerger {
    pub fn new(config: PlayerkitConfig) -> Self {
        Self { config }
    }

    /// Resolve the settings of one run.
    ///
    /// CLI values win over the file. Platform, service type and endpoint
    /// are required from one of the two.
    pub fn merge(
        self,
        project_root: &Utf8Path,
        cli: &CliOverrides,
    ) -> anyhow::Result<IntegrationSettings> {
        let PlayerkitConfig {
            project,
            web,
            service,
            install,
        } = self.config;

        let platform: PlatformKind =
            parse_required("platform", cli.platform.clone().or(project.platform))?;
        let service_type: ServiceType = parse_required(
            "service type",
            cli.service_type.clone().or(service.service_type),
        )?;
        let endpoint = cli
            .endpoint
            .clone()
            .or(service.endpoint)
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("missing service endpoint (--endpoint or [service] endpoint)")
            })?;

        let mut web_settings = WebSettings::default();
        if let Some(framework) = cli.framework.clone().or(web.framework) {
            web_settings.framework =
                WebFramework::from_str(&framework).map_err(anyhow::Error::msg)?;
        }
        if let Some(dir) = cli.source_dir.clone().or(web.source_dir) {
            web_settings.source_dir = dir;
        }

        let mut settings = IntegrationSettings::new(
            project_root.to_path_buf(),
            platform,
            ServiceDescriptor {
                service_type,
                output_endpoint: endpoint,
                channel_latency: cli.channel_latency.clone().or(service.channel_latency),
            },
        );
        settings.project_name = cli.name.clone().or(project.name);
        settings.web = web_settings;
        settings.dry_run = cli.dry_run;
        // CLI flag disables; it cannot re-enable what the file turned off.
        settings.install_enabled = install.enabled && !cli.no_install;
        Ok(settings)
    }
}

fn parse_required<T>(what: &str, value: Option<String>) -> anyhow::Result<T>
where
    T: FromStr<Err = String>,
{
    let value = value.ok_or_else(|| anyhow::anyhow!("missing {what}"))?;
    T::from_str(&value).map_err(anyhow::Error::msg)
}
