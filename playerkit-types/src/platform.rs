use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target ecosystem for one integration run.
///
/// Resolved once at the start of a run and never re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum PlatformTarget {
    Ios {
        /// Display name of the host app; names the `.xcodeproj`, the source
        /// folder and the anchor group.
        project_name: String,
    },
    Android,
    Web {
        framework: WebFramework,
        /// Source directory relative to the project root (e.g. `src`).
        source_dir: String,
    },
}

impl PlatformTarget {
    pub fn kind(&self) -> PlatformKind {
        match self {
            PlatformTarget::Ios { .. } => PlatformKind::Ios,
            PlatformTarget::Android => PlatformKind::Android,
            PlatformTarget::Web { .. } => PlatformKind::Web,
        }
    }
}

/// Payload-free platform selector, as given on the command line or in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Ios,
    Android,
    Web,
}

impl PlatformKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Ios => "ios",
            PlatformKind::Android => "android",
            PlatformKind::Web => "web",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(PlatformKind::Ios),
            "android" => Ok(PlatformKind::Android),
            "web" | "javascript" => Ok(PlatformKind::Web),
            other => Err(format!("unknown platform '{other}' (expected ios, android or web)")),
        }
    }
}

/// Web UI framework of the host project.
///
/// `Other` keeps the raw name: unrecognized frameworks fall back to the
/// generic destination instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebFramework {
    Angular,
    Vue,
    Ember,
    None,
    Other(String),
}

impl WebFramework {
    pub fn name(&self) -> &str {
        match self {
            WebFramework::Angular => "angular",
            WebFramework::Vue => "vue",
            WebFramework::Ember => "ember",
            WebFramework::None => "none",
            WebFramework::Other(name) => name.as_str(),
        }
    }

    /// File extension of the generated component.
    pub fn component_extension(&self) -> &'static str {
        match self {
            WebFramework::Angular => "ts",
            WebFramework::Vue => "vue",
            WebFramework::Ember => "js",
            WebFramework::None => "js",
            WebFramework::Other(name) if name.eq_ignore_ascii_case("react") => "jsx",
            WebFramework::Other(_) => "js",
        }
    }
}

impl fmt::Display for WebFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WebFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Ok(match name.as_str() {
            "" => return Err("web framework must not be empty".to_string()),
            "angular" => WebFramework::Angular,
            "vue" => WebFramework::Vue,
            "ember" => WebFramework::Ember,
            "none" => WebFramework::None,
            _ => WebFramework::Other(name),
        })
    }
}

/// Kind of streaming service the player is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    /// Managed low-latency live channel (IVS).
    #[serde(alias = "ivs")]
    LowLatencyStream,
    /// Any other HLS/DASH endpoint.
    GenericStream,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::LowLatencyStream => "low-latency-stream",
            ServiceType::GenericStream => "generic-stream",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low-latency-stream" | "ivs" => Ok(ServiceType::LowLatencyStream),
            "generic-stream" => Ok(ServiceType::GenericStream),
            other => Err(format!(
                "unknown service type '{other}' (expected low-latency-stream or generic-stream)"
            )),
        }
    }
}

/// The provisioned service the player plays from. Read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service_type: ServiceType,
    pub output_endpoint: String,

    /// Latency mode of a low-latency channel (e.g. `LOW`, `NORMAL`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_latency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_framework_parses_known_and_unknown_names() {
        assert_eq!("Angular".parse::<WebFramework>().unwrap(), WebFramework::Angular);
        assert_eq!("none".parse::<WebFramework>().unwrap(), WebFramework::None);
        assert_eq!(
            "react".parse::<WebFramework>().unwrap(),
            WebFramework::Other("react".to_string())
        );
        assert!("  ".parse::<WebFramework>().is_err());
    }

    #[test]
    fn component_extension_per_framework() {
        assert_eq!(WebFramework::Angular.component_extension(), "ts");
        assert_eq!(WebFramework::Vue.component_extension(), "vue");
        assert_eq!(WebFramework::Ember.component_extension(), "js");
        assert_eq!(WebFramework::Other("react".into()).component_extension(), "jsx");
        assert_eq!(WebFramework::Other("svelte".into()).component_extension(), "js");
    }

    #[test]
    fn service_type_accepts_ivs_alias() {
        assert_eq!(
            "ivs".parse::<ServiceType>().unwrap(),
            ServiceType::LowLatencyStream
        );
        let parsed: ServiceType = serde_json::from_str("\"ivs\"").unwrap();
        assert_eq!(parsed, ServiceType::LowLatencyStream);
        assert!("vod".parse::<ServiceType>().is_err());
    }

    #[test]
    fn platform_kind_round_trips_through_display() {
        for kind in [PlatformKind::Ios, PlatformKind::Android, PlatformKind::Web] {
            assert_eq!(kind.to_string().parse::<PlatformKind>().unwrap(), kind);
        }
    }
}
