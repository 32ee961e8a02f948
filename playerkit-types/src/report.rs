use crate::dependency::DependencyReference;
use crate::platform::{PlatformTarget, ServiceDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationReport {
    pub schema: String,
    pub run_id: Uuid,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub platform: PlatformTarget,
    pub service: ServiceDescriptor,

    /// True when nothing was written to disk.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub files: Vec<FileChange>,

    #[serde(default)]
    pub dependencies: Vec<DependencyOutcome>,

    /// Manual steps the operator still has to perform.
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,

    /// Usage snippet for the generated component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<Snippet>,
}

impl IntegrationReport {
    pub fn new(tool: ToolInfo, platform: PlatformTarget, service: ServiceDescriptor) -> Self {
        Self {
            schema: crate::schema::PLAYERKIT_REPORT_V1.to_string(),
            run_id: Uuid::new_v4(),
            tool,
            run: RunInfo {
                started_at: Utc::now(),
                ended_at: None,
            },
            platform,
            service,
            dry_run: false,
            files: vec![],
            dependencies: vec![],
            follow_ups: vec![],
            snippet: None,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut s = ReportSummary::default();
        for f in &self.files {
            match f.action {
                FileAction::Created => s.created += 1,
                FileAction::Modified => s.modified += 1,
                FileAction::Unchanged => s.unchanged += 1,
            }
        }
        for d in &self.dependencies {
            if d.status != DependencyStatus::AlreadyPresent {
                s.dependencies_added += 1;
            }
        }
        s
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Created,
    Modified,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    /// Rendered UI component or activity.
    Component,
    /// Layout, stylesheet or stub source copied alongside the component.
    Support,
    /// Pre-existing build descriptor mutated in place.
    Descriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub role: FileRole,
    pub action: FileAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    AlreadyPresent,
    /// Declaration appended to the descriptor.
    Added,
    /// Installed through the package manager.
    Installed,
    /// Installation left to the operator (installs disabled or dry run).
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyOutcome {
    /// Descriptor the dependency belongs to.
    pub descriptor: String,
    pub dependency: DependencyReference,
    pub status: DependencyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub message: String,

    /// Literal code or command to copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FollowUp {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: u64,
    pub modified: u64,
    pub unchanged: u64,
    pub dependencies_added: u64,
}
