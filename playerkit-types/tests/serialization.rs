use playerkit_types::dependency::DependencyReference;
use playerkit_types::platform::{PlatformTarget, ServiceDescriptor, ServiceType, WebFramework};
use playerkit_types::report::{
    DependencyOutcome, DependencyStatus, FileAction, FileChange, FileRole, IntegrationReport,
    ToolInfo,
};
use pretty_assertions::assert_eq;

fn tool() -> ToolInfo {
    ToolInfo {
        name: "playerkit".to_string(),
        version: Some("0.0.0".to_string()),
    }
}

fn service() -> ServiceDescriptor {
    ServiceDescriptor {
        service_type: ServiceType::GenericStream,
        output_endpoint: "https://cdn.example/stream.m3u8".to_string(),
        channel_latency: None,
    }
}

#[test]
fn report_new_sets_schema_and_empty_collections() {
    let report = IntegrationReport::new(tool(), PlatformTarget::Android, service());
    assert_eq!(report.schema, playerkit_types::schema::PLAYERKIT_REPORT_V1);
    assert!(report.files.is_empty());
    assert!(report.follow_ups.is_empty());
    assert!(report.run.ended_at.is_none());
    assert!(!report.dry_run);
}

#[test]
fn platform_target_serializes_with_tag() {
    let web = PlatformTarget::Web {
        framework: WebFramework::Vue,
        source_dir: "src".to_string(),
    };
    let json = serde_json::to_value(&web).unwrap();
    assert_eq!(json["platform"], "web");
    assert_eq!(json["framework"], "vue");
    assert_eq!(json["source_dir"], "src");

    let ios = serde_json::json!({ "platform": "ios", "project_name": "App" });
    let parsed: PlatformTarget = serde_json::from_value(ios).unwrap();
    assert_eq!(
        parsed,
        PlatformTarget::Ios {
            project_name: "App".to_string()
        }
    );
}

#[test]
fn service_type_uses_kebab_case() {
    let json = serde_json::to_value(service()).unwrap();
    assert_eq!(json["service_type"], "generic-stream");
    assert!(json.get("channel_latency").is_none());
}

#[test]
fn report_round_trips_through_json() {
    let mut report = IntegrationReport::new(tool(), PlatformTarget::Android, service());
    report.files.push(FileChange {
        path: "app/build.gradle".to_string(),
        role: FileRole::Descriptor,
        action: FileAction::Modified,
        sha256_before: Some("aa".to_string()),
        sha256_after: Some("bb".to_string()),
    });
    report.dependencies.push(DependencyOutcome {
        descriptor: "app/build.gradle".to_string(),
        dependency: DependencyReference::new("com.google.android.exoplayer:exoplayer")
            .with_version("2.13.2"),
        status: DependencyStatus::Added,
    });

    let json = serde_json::to_string_pretty(&report).unwrap();
    let back: IntegrationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.run_id, report.run_id);
    assert_eq!(back.files.len(), 1);
    assert_eq!(back.files[0].action, FileAction::Modified);
    assert_eq!(back.dependencies[0].status, DependencyStatus::Added);
}

#[test]
fn summary_counts_actions_and_new_dependencies() {
    let mut report = IntegrationReport::new(tool(), PlatformTarget::Android, service());
    for (path, action) in [
        ("a", FileAction::Created),
        ("b", FileAction::Created),
        ("c", FileAction::Modified),
        ("d", FileAction::Unchanged),
    ] {
        report.files.push(FileChange {
            path: path.to_string(),
            role: FileRole::Component,
            action,
            sha256_before: None,
            sha256_after: None,
        });
    }
    report.dependencies.push(DependencyOutcome {
        descriptor: "package.json".to_string(),
        dependency: DependencyReference::new("video.js"),
        status: DependencyStatus::AlreadyPresent,
    });

    let s = report.summary();
    assert_eq!(s.created, 2);
    assert_eq!(s.modified, 1);
    assert_eq!(s.unchanged, 1);
    assert_eq!(s.dependencies_added, 0);
}
