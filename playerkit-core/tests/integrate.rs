//! End-to-end runs of the integration pipeline against fixture projects.

use camino::{Utf8Path, Utf8PathBuf};
use playerkit_core::adapters::{FsWritePort, MemoryWritePort, PlaceholderRenderer};
use playerkit_core::pipeline::{IVS_SCRIPT_SIGNATURE, Ports, Stage, ToolError, run_integration};
use playerkit_core::ports::{Ecosystem, InstallOutcome, PackageInstaller};
use playerkit_core::settings::{IntegrationSettings, WebSettings};
use playerkit_core::{IntegrationError, IntegrationResult};
use playerkit_types::dependency::DependencyReference;
use playerkit_types::platform::{PlatformKind, ServiceDescriptor, ServiceType, WebFramework};
use playerkit_types::report::{DependencyStatus, FileAction, IntegrationReport, ToolInfo};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::fs;
use tempfile::TempDir;

const ENDPOINT: &str = "https://abc.us-west-2.playback.live-video.net/api/video/v1/channel.m3u8";

#[derive(Default)]
struct RecordingInstaller {
    calls: RefCell<Vec<(Ecosystem, String)>>,
}

impl RecordingInstaller {
    fn calls(&self) -> Vec<(Ecosystem, String)> {
        self.calls.borrow().clone()
    }
}

impl PackageInstaller for RecordingInstaller {
    /// Records the call. For CocoaPods it also leaves the lockfiles a real
    /// `pod install` would.
    fn ensure_package_present(
        &self,
        ecosystem: Ecosystem,
        project_root: &Utf8Path,
        dep: &DependencyReference,
    ) -> IntegrationResult<InstallOutcome> {
        self.calls
            .borrow_mut()
            .push((ecosystem, dep.identifier.clone()));
        if ecosystem == Ecosystem::CocoaPods {
            let lock = format!(
                "PODS:\n  - {} (1.0.0)\n\nCOCOAPODS: 1.10.1\n",
                dep.identifier
            );
            fs::write(project_root.join("Podfile.lock"), &lock).unwrap();
            fs::create_dir_all(project_root.join("Pods")).unwrap();
            fs::write(project_root.join("Pods/Manifest.lock"), &lock).unwrap();
        }
        Ok(InstallOutcome::Installed)
    }
}

struct FailingInstaller;

impl PackageInstaller for FailingInstaller {
    fn ensure_package_present(
        &self,
        ecosystem: Ecosystem,
        _project_root: &Utf8Path,
        dep: &DependencyReference,
    ) -> IntegrationResult<InstallOutcome> {
        Err(IntegrationError::ExternalProcess {
            command: ecosystem.install_command(dep).join(" "),
            message: "CDN timeout".to_string(),
        })
    }
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: "playerkit".to_string(),
        version: Some("0.0.0-test".to_string()),
    }
}

fn service(service_type: ServiceType) -> ServiceDescriptor {
    ServiceDescriptor {
        service_type,
        output_endpoint: ENDPOINT.to_string(),
        channel_latency: Some("LOW".to_string()),
    }
}

fn copy_dir(from: &Utf8Path, to: &Utf8Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().into_string().unwrap();
        let src = from.join(&name);
        let dst = to.join(&name);
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&src, &dst);
        } else {
            fs::copy(&src, &dst).unwrap();
        }
    }
}

/// Copy `tests/fixtures/<name>` into a fresh temp dir.
fn fixture(name: &str) -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("project")).unwrap();
    let source = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../tests/fixtures")
        .join(name);
    copy_dir(&source, &root);
    (temp, root)
}

fn empty_web_project(dirs: &[&str]) -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    for dir in dirs {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    fs::write(
        root.join("package.json"),
        "{\n  \"name\": \"app\",\n  \"dependencies\": {}\n}\n",
    )
    .unwrap();
    (temp, root)
}

fn run(
    settings: &IntegrationSettings,
    installer: &dyn PackageInstaller,
) -> Result<IntegrationReport, ToolError> {
    let ports = Ports {
        writer: &FsWritePort,
        installer,
        renderer: &PlaceholderRenderer,
    };
    run_integration(settings, &ports, tool()).map(|o| o.report)
}

fn read(path: Utf8PathBuf) -> String {
    fs::read_to_string(path).unwrap()
}

fn web_settings(
    root: &Utf8Path,
    framework: WebFramework,
    service_type: ServiceType,
) -> IntegrationSettings {
    let mut settings =
        IntegrationSettings::new(root.to_path_buf(), PlatformKind::Web, service(service_type));
    settings.web = WebSettings {
        framework,
        source_dir: "src".to_string(),
    };
    settings
}

fn assert_all_unchanged(report: &IntegrationReport) {
    for file in &report.files {
        assert_eq!(
            file.action,
            FileAction::Unchanged,
            "{} changed on rerun",
            file.path
        );
    }
}

#[test]
fn android_adds_exoplayer_once_and_creates_activity() {
    let (_temp, root) = fixture("android");
    let settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Android,
        service(ServiceType::GenericStream),
    );
    let installer = RecordingInstaller::default();

    let report = run(&settings, &installer).unwrap();

    let gradle = read(root.join("app/build.gradle"));
    assert_eq!(
        gradle
            .matches("implementation 'com.google.android.exoplayer:exoplayer:2.13.2'")
            .count(),
        1
    );
    assert!(gradle.contains("// implementation 'com.google.android.exoplayer:exoplayer:2.11.0'"));

    let activity = read(root.join("app/src/main/java/com/example/app/VideoPlayerActivity.kt"));
    assert!(activity.starts_with("package com.example.app\n"));
    assert!(activity.contains(ENDPOINT));
    assert!(root.join("app/src/main/res/layout/activity_video_player.xml").is_file());

    assert_eq!(report.dependencies.len(), 1);
    assert_eq!(report.dependencies[0].status, DependencyStatus::Added);
    assert_eq!(report.dependencies[0].descriptor, "app/build.gradle");
    assert!(installer.calls().is_empty());
    assert!(
        report
            .follow_ups
            .iter()
            .any(|f| f.message.contains("reload your gradle"))
    );

    let rerun = run(&settings, &installer).unwrap();
    assert_all_unchanged(&rerun);
    assert_eq!(
        rerun.dependencies[0].status,
        DependencyStatus::AlreadyPresent
    );
    assert_eq!(read(root.join("app/build.gradle")), gradle);
}

#[test]
fn android_rejects_gradle_without_dependencies_block_before_writing() {
    let (_temp, root) = fixture("android");
    fs::write(root.join("app/build.gradle"), "android {\n}\n").unwrap();
    let settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Android,
        service(ServiceType::GenericStream),
    );

    let err = run(&settings, &RecordingInstaller::default()).unwrap_err();
    match &err {
        ToolError::Integration { stage, source } => {
            assert_eq!(*stage, Stage::ResolvingParameters);
            assert_eq!(source.kind(), "descriptor_parse");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert!(
        !root
            .join("app/src/main/java/com/example/app/VideoPlayerActivity.kt")
            .exists()
    );
}

#[test]
fn ios_generic_stream_adds_vlc_bridge_and_registers_files() {
    let (_temp, root) = fixture("ios");
    let settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Ios,
        service(ServiceType::GenericStream),
    );
    let installer = RecordingInstaller::default();

    let report = run(&settings, &installer).unwrap();

    for name in ["VideoPlayer.swift", "empty.cpp", "empty.hpp", "MyApp-Bridging-Header.h"] {
        assert!(root.join("MyApp").join(name).is_file(), "{name} missing");
    }
    let pbxproj = read(root.join("MyApp.xcodeproj/project.pbxproj"));
    for name in ["VideoPlayer.swift", "empty.cpp", "empty.hpp", "MyApp-Bridging-Header.h"] {
        assert!(pbxproj.contains(name), "{name} not registered");
    }
    assert_eq!(pbxproj.matches("SWIFT_OBJC_BRIDGING_HEADER").count(), 4);

    let podfile = read(root.join("Podfile"));
    assert!(podfile.contains("pod 'MobileVLCKit', '3.3.0'"));
    assert!(podfile.contains("platform :ios, '8.4'"));
    assert!(!podfile.contains("AmazonIVSPlayer"));
    assert_eq!(
        installer.calls(),
        vec![(Ecosystem::CocoaPods, "MobileVLCKit".to_string())]
    );
    assert_eq!(report.dependencies[0].status, DependencyStatus::Installed);
    assert!(report.snippet.is_some());

    let rerun = run(&settings, &installer).unwrap();
    assert_all_unchanged(&rerun);
    assert_eq!(
        rerun.dependencies[0].status,
        DependencyStatus::AlreadyPresent
    );
    assert_eq!(installer.calls().len(), 1);
    assert_eq!(read(root.join("MyApp.xcodeproj/project.pbxproj")), pbxproj);
}

#[test]
fn ios_low_latency_uses_ivs_pod_only() {
    let (_temp, root) = fixture("ios");
    let mut settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Ios,
        service(ServiceType::LowLatencyStream),
    );
    settings.project_name = Some("MyApp".to_string());

    run(&settings, &RecordingInstaller::default()).unwrap();

    let podfile = read(root.join("Podfile"));
    assert!(podfile.contains("pod 'AmazonIVSPlayer'"));
    assert!(!podfile.contains("MobileVLCKit"));
    assert!(!podfile.contains("platform :ios, '8.4'"));

    let pbxproj = read(root.join("MyApp.xcodeproj/project.pbxproj"));
    assert!(pbxproj.contains("VideoPlayer.swift"));
    assert!(!pbxproj.contains("empty.cpp"));
    assert!(!pbxproj.contains("SWIFT_OBJC_BRIDGING_HEADER"));
    assert!(!root.join("MyApp/MyApp-Bridging-Header.h").exists());

    let player = read(root.join("MyApp/VideoPlayer.swift"));
    assert!(player.contains("AmazonIVSPlayer"));
}

#[test]
fn ios_rerun_installs_pod_after_failed_install() {
    let (_temp, root) = fixture("ios");
    let settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Ios,
        service(ServiceType::GenericStream),
    );

    let err = run(&settings, &FailingInstaller).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("CDN timeout"));
    assert!(
        read(root.join("Podfile")).contains("pod 'MobileVLCKit', '3.3.0'")
    );

    let installer = RecordingInstaller::default();
    let rerun = run(&settings, &installer).unwrap();
    assert_all_unchanged(&rerun);
    assert_eq!(
        installer.calls(),
        vec![(Ecosystem::CocoaPods, "MobileVLCKit".to_string())]
    );
    assert_eq!(rerun.dependencies[0].status, DependencyStatus::Installed);

    let settled = run(&settings, &installer).unwrap();
    assert_eq!(
        settled.dependencies[0].status,
        DependencyStatus::AlreadyPresent
    );
    assert_eq!(installer.calls().len(), 1);
}

#[test]
fn ios_rerun_after_deferred_install_still_installs() {
    let (_temp, root) = fixture("ios");
    let mut settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Ios,
        service(ServiceType::LowLatencyStream),
    );
    settings.install_enabled = false;
    let installer = RecordingInstaller::default();

    let deferred = run(&settings, &installer).unwrap();
    assert_eq!(deferred.dependencies[0].status, DependencyStatus::Deferred);
    assert!(installer.calls().is_empty());

    settings.install_enabled = true;
    let rerun = run(&settings, &installer).unwrap();
    assert_eq!(rerun.dependencies[0].status, DependencyStatus::Installed);
    assert_eq!(
        installer.calls(),
        vec![(Ecosystem::CocoaPods, "AmazonIVSPlayer".to_string())]
    );
}

#[test]
fn ios_keeps_higher_deployment_target() {
    let (_temp, root) = fixture("ios");
    let podfile =
        read(root.join("Podfile")).replace("# platform :ios, '9.0'", "platform :ios, '14.0'");
    fs::write(root.join("Podfile"), &podfile).unwrap();
    let settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Ios,
        service(ServiceType::GenericStream),
    );

    run(&settings, &RecordingInstaller::default()).unwrap();

    let podfile = read(root.join("Podfile"));
    assert!(podfile.contains("platform :ios, '14.0'"));
    assert!(!podfile.contains("'8.4'"));
}

#[test]
fn ios_without_podfile_is_a_structure_error() {
    let (_temp, root) = fixture("ios");
    fs::remove_file(root.join("Podfile")).unwrap();
    let settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Ios,
        service(ServiceType::GenericStream),
    );

    let err = run(&settings, &RecordingInstaller::default()).unwrap_err();
    match err {
        ToolError::Integration {
            source: IntegrationError::ProjectStructure { message, .. },
            ..
        } => assert!(message.contains("pod init")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!root.join("MyApp/VideoPlayer.swift").exists());
}

#[test]
fn dry_run_reports_patch_without_writing() {
    let (_temp, root) = fixture("android");
    let mut settings = IntegrationSettings::new(
        root.clone(),
        PlatformKind::Android,
        service(ServiceType::GenericStream),
    );
    settings.dry_run = true;
    let before = read(root.join("app/build.gradle"));
    let writer = MemoryWritePort::new();
    let ports = Ports {
        writer: &writer,
        installer: &RecordingInstaller::default(),
        renderer: &PlaceholderRenderer,
    };

    let outcome = run_integration(&settings, &ports, tool()).unwrap();

    assert!(writer.paths().is_empty());
    assert_eq!(read(root.join("app/build.gradle")), before);
    assert!(outcome.report.dry_run);
    assert!(
        outcome
            .patch
            .contains("+    implementation 'com.google.android.exoplayer:exoplayer:2.13.2'")
    );
    assert!(outcome.patch.contains("VideoPlayerActivity.kt"));
    assert_eq!(outcome.report.summary().created, 2);
    assert_eq!(outcome.report.summary().modified, 1);
}

#[test]
fn web_react_low_latency_injects_script_and_installs_videojs() {
    let (_temp, root) = fixture("web/react");
    let settings = web_settings(
        &root,
        WebFramework::Other("react".to_string()),
        ServiceType::LowLatencyStream,
    );
    let installer = RecordingInstaller::default();

    let report = run(&settings, &installer).unwrap();

    let index = read(root.join("public/index.html"));
    assert_eq!(index.matches(IVS_SCRIPT_SIGNATURE).count(), 1);
    assert!(index.find(IVS_SCRIPT_SIGNATURE) < index.find("</body>"));

    let component = read(root.join("src/VideoPlayer.jsx"));
    assert!(component.contains(r#"techOrder: ["AmazonIVS"]"#));
    assert!(component.contains("window.registerIVSTech(videojs);"));
    assert!(component.contains(ENDPOINT));

    assert_eq!(
        installer.calls(),
        vec![(Ecosystem::Npm, "video.js".to_string())]
    );
    assert_eq!(report.dependencies[0].status, DependencyStatus::Installed);

    run(&settings, &installer).unwrap();
    assert_eq!(read(root.join("public/index.html")), index);
}

#[test]
fn web_angular_skips_present_dependency_and_ignores_commented_body() {
    let (_temp, root) = fixture("web/angular");
    let settings = web_settings(&root, WebFramework::Angular, ServiceType::LowLatencyStream);
    let installer = RecordingInstaller::default();

    let report = run(&settings, &installer).unwrap();

    assert!(root.join("src/app/video-player/video-player.component.ts").is_file());
    assert!(root.join("src/app/video-player/video-player.component.scss").is_file());
    let index = read(root.join("src/index.html"));
    assert!(index.find("<app-root>") < index.find(IVS_SCRIPT_SIGNATURE));

    assert!(installer.calls().is_empty());
    assert_eq!(
        report.dependencies[0].status,
        DependencyStatus::AlreadyPresent
    );
    assert!(
        report
            .follow_ups
            .iter()
            .any(|f| f.message.contains("angular module"))
    );
}

#[test]
fn web_frameworks_write_components_to_their_conventional_paths() {
    let cases = [
        (WebFramework::Vue, "src/components/VideoPlayer.vue"),
        (WebFramework::Ember, "src/app/components/video-player.js"),
        (
            WebFramework::Other("svelte".to_string()),
            "src/VideoPlayer.js",
        ),
    ];
    for (framework, expected) in cases {
        let (_temp, root) = empty_web_project(&["src"]);
        let settings = web_settings(&root, framework.clone(), ServiceType::GenericStream);

        let report = run(&settings, &RecordingInstaller::default()).unwrap();

        let component = read(root.join(expected));
        assert!(component.contains(r#"["html5"]"#), "{framework}");
        assert!(!component.contains("registerIVSTech"), "{framework}");
        assert!(report.snippet.is_some());
        if framework == WebFramework::Ember {
            assert!(
                report
                    .follow_ups
                    .iter()
                    .any(|f| f.detail.as_deref().is_some_and(|d| d.contains("video-js.css")))
            );
        }
    }
}

#[test]
fn web_without_framework_only_touches_markup() {
    let (_temp, root) = fixture("web/plain");
    let settings = web_settings(&root, WebFramework::None, ServiceType::LowLatencyStream);
    let installer = RecordingInstaller::default();

    let report = run(&settings, &installer).unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].path, "index.html");
    assert!(report.dependencies.is_empty());
    assert!(installer.calls().is_empty());
    let snippet = report.snippet.unwrap();
    assert!(snippet.heading.starts_with("Copy and paste"));
    assert!(read(root.join("index.html")).contains(IVS_SCRIPT_SIGNATURE));
}

#[test]
fn install_disabled_defers_with_command() {
    let (_temp, root) = empty_web_project(&["src"]);
    let mut settings = web_settings(&root, WebFramework::Vue, ServiceType::GenericStream);
    settings.install_enabled = false;
    let installer = RecordingInstaller::default();

    let report = run(&settings, &installer).unwrap();

    assert!(installer.calls().is_empty());
    assert_eq!(report.dependencies[0].status, DependencyStatus::Deferred);
    assert!(
        report
            .follow_ups
            .iter()
            .any(|f| f.detail.as_deref() == Some("npm install video.js"))
    );
}

#[test]
fn missing_project_root_fails_while_resolving() {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("absent")).unwrap();
    let settings = IntegrationSettings::new(
        root,
        PlatformKind::Android,
        service(ServiceType::GenericStream),
    );

    let err = run(&settings, &RecordingInstaller::default()).unwrap_err();
    assert!(matches!(
        err,
        ToolError::Integration {
            stage: Stage::ResolvingParameters,
            source: IntegrationError::ProjectStructure { .. },
        }
    ));
}
