//! Rendering helpers for human-readable integration reports.

use playerkit_types::platform::PlatformTarget;
use playerkit_types::report::{DependencyStatus, FileAction, FileRole, IntegrationReport};

pub fn render_report_md(report: &IntegrationReport) -> String {
    let summary = report.summary();
    let mut out = String::new();
    out.push_str("# playerkit integration\n\n");
    out.push_str(&format!("- Platform: `{}`\n", platform_label(&report.platform)));
    out.push_str(&format!("- Service: `{}`\n", report.service.service_type));
    out.push_str(&format!("- Endpoint: {}\n", report.service.output_endpoint));
    if report.dry_run {
        out.push_str("- Dry run: nothing was written\n");
    }
    out.push_str(&format!(
        "- Files: {} created, {} modified, {} unchanged\n",
        summary.created, summary.modified, summary.unchanged
    ));
    out.push_str(&format!(
        "- Dependencies added: {}\n\n",
        summary.dependencies_added
    ));

    out.push_str("## Files\n\n");
    if report.files.is_empty() {
        out.push_str("_No files touched._\n");
    }
    for f in &report.files {
        let before = f.sha256_before.as_deref().map(short).unwrap_or("-");
        let after = f.sha256_after.as_deref().map(short).unwrap_or("-");
        out.push_str(&format!(
            "- `{}` {} ({}) {} → {}\n",
            f.path,
            action_label(f.action),
            role_label(f.role),
            before,
            after
        ));
    }

    if !report.dependencies.is_empty() {
        out.push_str("\n## Dependencies\n\n");
        for d in &report.dependencies {
            out.push_str(&format!(
                "- `{}` in `{}`: {}\n",
                d.dependency.coordinate(),
                d.descriptor,
                status_label(d.status)
            ));
        }
    }

    if !report.follow_ups.is_empty() {
        out.push_str("\n## Next steps\n\n");
        for f in &report.follow_ups {
            out.push_str(&format!("- {}\n", f.message));
            if let Some(detail) = &f.detail {
                out.push_str(&format!("\n  ```\n  {}\n  ```\n", detail));
            }
        }
    }

    if let Some(snippet) = &report.snippet {
        out.push_str(&format!("\n## Usage\n\n{}\n\n```\n", snippet.heading));
        out.push_str(snippet.body.trim_end());
        out.push_str("\n```\n");
    }

    out
}

/// Plain text for the terminal: one line per file, then next steps and the snippet.
pub fn render_report_text(report: &IntegrationReport) -> String {
    let mut out = String::new();
    let verb = if report.dry_run { "would be " } else { "" };
    for f in &report.files {
        if f.action == FileAction::Unchanged {
            continue;
        }
        out.push_str(&format!("{}{}: {}\n", verb, action_label(f.action), f.path));
    }
    for d in &report.dependencies {
        out.push_str(&format!(
            "{}: {} ({})\n",
            status_label(d.status),
            d.dependency.identifier,
            d.descriptor
        ));
    }
    let summary = report.summary();
    if summary.created + summary.modified == 0 && summary.dependencies_added == 0 {
        out.push_str("already integrated; nothing to do\n");
    }

    for f in &report.follow_ups {
        out.push_str(&format!("\n{}\n", f.message));
        if let Some(detail) = &f.detail {
            out.push_str(&format!("  {}\n", detail));
        }
    }
    if let Some(snippet) = &report.snippet {
        out.push_str(&format!("\n{}\n{}", snippet.heading, snippet.body));
        if !snippet.body.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

fn platform_label(p: &PlatformTarget) -> String {
    match p {
        PlatformTarget::Ios { project_name } => format!("ios ({project_name})"),
        PlatformTarget::Android => "android".to_string(),
        PlatformTarget::Web { framework, .. } => format!("web ({framework})"),
    }
}

fn short(sha: &str) -> &str {
    &sha[..sha.len().min(12)]
}

fn action_label(a: FileAction) -> &'static str {
    match a {
        FileAction::Created => "created",
        FileAction::Modified => "modified",
        FileAction::Unchanged => "unchanged",
    }
}

fn role_label(r: FileRole) -> &'static str {
    match r {
        FileRole::Component => "component",
        FileRole::Support => "support",
        FileRole::Descriptor => "descriptor",
    }
}

fn status_label(s: DependencyStatus) -> &'static str {
    match s {
        DependencyStatus::AlreadyPresent => "already present",
        DependencyStatus::Added => "added",
        DependencyStatus::Installed => "installed",
        DependencyStatus::Deferred => "install deferred",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playerkit_types::dependency::DependencyReference;
    use playerkit_types::platform::{ServiceDescriptor, ServiceType};
    use playerkit_types::report::{
        DependencyOutcome, FileChange, FollowUp, Snippet, ToolInfo,
    };
    use pretty_assertions::assert_eq;

    fn report() -> IntegrationReport {
        let mut r = IntegrationReport::new(
            ToolInfo {
                name: "playerkit".into(),
                version: None,
            },
            PlatformTarget::Android,
            ServiceDescriptor {
                service_type: ServiceType::GenericStream,
                output_endpoint: "https://cdn.example/live.m3u8".into(),
                channel_latency: None,
            },
        );
        r.files = vec![
            FileChange {
                path: "app/build.gradle".into(),
                role: FileRole::Descriptor,
                action: FileAction::Modified,
                sha256_before: Some("a".repeat(64)),
                sha256_after: Some("b".repeat(64)),
            },
            FileChange {
                path: "app/src/main/res/layout/activity_video_player.xml".into(),
                role: FileRole::Support,
                action: FileAction::Unchanged,
                sha256_before: Some("c".repeat(64)),
                sha256_after: Some("c".repeat(64)),
            },
        ];
        r.dependencies = vec![DependencyOutcome {
            descriptor: "app/build.gradle".into(),
            dependency: DependencyReference::new("com.google.android.exoplayer:exoplayer")
                .with_version("2.13.2"),
            status: DependencyStatus::Added,
        }];
        r.follow_ups = vec![FollowUp::new("Reload gradle")];
        r.run.ended_at = Some(chrono::Utc::now());
        r
    }

    #[test]
    fn markdown_lists_files_dependencies_and_steps() {
        let md = render_report_md(&report());
        assert!(md.starts_with("# playerkit integration\n\n"));
        assert!(md.contains("- Platform: `android`\n"));
        assert!(md.contains("- Files: 0 created, 1 modified, 1 unchanged\n"));
        assert!(
            md.contains("- `app/build.gradle` modified (descriptor) aaaaaaaaaaaa → bbbbbbbbbbbb\n")
        );
        assert!(md.contains(
            "- `com.google.android.exoplayer:exoplayer:2.13.2` in `app/build.gradle`: added\n"
        ));
        assert!(md.contains("## Next steps\n\n- Reload gradle\n"));
        assert!(!md.contains("## Usage"));
    }

    #[test]
    fn text_skips_unchanged_files_and_marks_dry_runs() {
        let mut r = report();
        r.dry_run = true;
        r.snippet = Some(Snippet {
            heading: "Paste this:".into(),
            body: "<video></video>".into(),
        });
        let text = render_report_text(&r);
        assert_eq!(
            text,
            "would be modified: app/build.gradle\n\
             added: com.google.android.exoplayer:exoplayer (app/build.gradle)\n\
             \nReload gradle\n\
             \nPaste this:\n<video></video>\n"
        );
    }

    #[test]
    fn text_reports_nothing_to_do_on_rerun() {
        let mut r = report();
        r.files.retain(|f| f.action == FileAction::Unchanged);
        r.dependencies[0].status = DependencyStatus::AlreadyPresent;
        r.follow_ups.clear();
        assert_eq!(
            render_report_text(&r),
            "already present: com.google.android.exoplayer:exoplayer (app/build.gradle)\n\
             already integrated; nothing to do\n"
        );
    }
}
