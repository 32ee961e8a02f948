//! Integration pipeline, extracted from the CLI.
//!
//! A run is a linear state machine:
//! `ResolvingPlatform -> ResolvingParameters -> RenderingTemplates ->
//! WritingArtifacts -> MutatingDescriptors -> Reporting -> Done`.
//! Every failure is terminal. Writes made before a failure stay on disk.
//!
//! All descriptors a run needs are read and parsed while resolving
//! parameters, so a malformed sibling aborts the run before the first write.

use crate::adapters::ManualInstaller;
use crate::ledger::Ledger;
use crate::paths::{DescriptorPaths, PathResolver, PlatformPaths};
use crate::ports::{Ecosystem, InstallOutcome, PackageInstaller, TemplateRenderer, WritePort};
use crate::settings::IntegrationSettings;
use crate::templates::{self, Template};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use playerkit_edit::descriptor::{read_descriptor, read_optional};
use playerkit_edit::gradle::GradleBuildFile;
use playerkit_edit::markup::MarkupDocument;
use playerkit_edit::package_json::PackageManifest;
use playerkit_edit::pbxproj::{ArtifactKind, ProjectGraph};
use playerkit_edit::podfile::Podfile;
use playerkit_edit::{DependencyDescriptor, IntegrationError, IntegrationResult};
use playerkit_types::dependency::{DependencyReference, InsertionPoint};
use playerkit_types::params::{IntegrationParameters, ParamValue};
use playerkit_types::platform::{PlatformKind, PlatformTarget, ServiceType, WebFramework};
use playerkit_types::report::{
    DependencyOutcome, DependencyStatus, FileRole, FollowUp, IntegrationReport, Snippet, ToolInfo,
};
use std::fmt;
use tracing::{debug, info, info_span, span::EnteredSpan, warn};

pub const IVS_SCRIPT: &str =
    r#"<script src="https://player.live-video.net/1.3.1/amazon-ivs-videojs-tech.min.js"></script>"#;
pub const IVS_SCRIPT_SIGNATURE: &str = "amazon-ivs-videojs-tech.min.js";
pub const BRIDGING_HEADER_SETTING: &str = "SWIFT_OBJC_BRIDGING_HEADER";
pub const EMBER_CSS_IMPORT: &str = "app.import('node_modules/video.js/dist/video-js.css');";

/// Stages of one run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingPlatform,
    ResolvingParameters,
    RenderingTemplates,
    WritingArtifacts,
    MutatingDescriptors,
    Reporting,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ResolvingPlatform => "resolving platform",
            Stage::ResolvingParameters => "resolving parameters",
            Stage::RenderingTemplates => "rendering templates",
            Stage::WritingArtifacts => "writing artifacts",
            Stage::MutatingDescriptors => "mutating descriptors",
            Stage::Reporting => "reporting",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for pipeline results. Exit code 2 = integration error, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{stage}: {source}")]
    Integration {
        stage: Stage,
        #[source]
        source: IntegrationError,
    },
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Integration { .. } => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

fn at(stage: Stage) -> impl FnOnce(IntegrationError) -> ToolError {
    move |source| ToolError::Integration { stage, source }
}

fn enter(stage: Stage) -> EnteredSpan {
    let span = info_span!("stage", stage = stage.as_str()).entered();
    debug!("entering stage");
    span
}

/// I/O collaborators of a run.
pub struct Ports<'a> {
    pub writer: &'a dyn WritePort,
    pub installer: &'a dyn PackageInstaller,
    pub renderer: &'a dyn TemplateRenderer,
}

/// Outcome of `run_integration`.
#[derive(Debug)]
pub struct IntegrationOutcome {
    pub report: IntegrationReport,
    /// Unified diff of every generated and mutated file.
    pub patch: String,
}

/// Descriptors parsed before any write, owned by the run until write-back.
enum Loaded {
    Ios {
        graph: Loadable<ProjectGraph>,
        podfile: Loadable<Podfile>,
    },
    Android {
        gradle: Loadable<GradleBuildFile>,
    },
    Web {
        package: Option<PackageManifest>,
        markup: Option<Loadable<MarkupDocument>>,
    },
}

/// A parsed descriptor together with the text it was parsed from.
struct Loadable<T> {
    path: Utf8PathBuf,
    original: String,
    doc: T,
}

impl<T> Loadable<T> {
    fn load(
        path: &Utf8Path,
        parse: impl FnOnce(&Utf8Path, String) -> IntegrationResult<T>,
    ) -> IntegrationResult<Self> {
        let original = read_descriptor(path)?;
        let doc = parse(path, original.clone())?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
            doc,
        })
    }
}

/// A file produced from a template.
struct Artifact {
    path: Utf8PathBuf,
    role: FileRole,
    content: String,
    /// Registration in the native project graph, if any.
    register: Option<ArtifactKind>,
}

struct Rendered {
    artifacts: Vec<Artifact>,
    snippet: Option<Snippet>,
    follow_ups: Vec<FollowUp>,
}

/// Run one integration. Returns the report and the patch of all changes.
///
/// With `settings.dry_run` every read, parse and check happens, nothing is
/// written and no package manager runs.
pub fn run_integration(
    settings: &IntegrationSettings,
    ports: &Ports<'_>,
    tool: ToolInfo,
) -> Result<IntegrationOutcome, ToolError> {
    let root = settings.project_root.as_path();

    let platform = {
        let _stage = enter(Stage::ResolvingPlatform);
        resolve_platform(settings).map_err(at(Stage::ResolvingPlatform))?
    };
    info!(platform = platform.kind().as_str(), root = %root, "integrating video player");
    if let PlatformTarget::Web {
        framework: WebFramework::Other(name),
        ..
    } = &platform
        && !name.eq_ignore_ascii_case("react")
    {
        warn!(framework = %name, "unknown web framework; writing a generic component");
    }

    let (paths, mut loaded, params) = {
        let _stage = enter(Stage::ResolvingParameters);
        let paths =
            PathResolver::resolve(&platform, root).map_err(at(Stage::ResolvingParameters))?;
        let loaded = load_descriptors(&platform, settings, &paths)
            .map_err(at(Stage::ResolvingParameters))?;
        let params = build_parameters(&platform, settings, &paths);
        (paths, loaded, params)
    };

    let rendered = {
        let _stage = enter(Stage::RenderingTemplates);
        render(
            &platform,
            settings.service.service_type,
            &paths,
            &params,
            ports.renderer,
        )?
    };

    let mut report = IntegrationReport::new(tool, platform.clone(), settings.service.clone());
    report.dry_run = settings.dry_run;
    let mut ledger = Ledger::new(root, ports.writer, settings.dry_run);

    {
        let _stage = enter(Stage::WritingArtifacts);
        let mut graph = match (&mut loaded, &platform) {
            (Loaded::Ios { graph, .. }, PlatformTarget::Ios { project_name }) => Some((
                &mut graph.doc,
                InsertionPoint::append_to(project_name.as_str()),
            )),
            _ => None,
        };
        for artifact in &rendered.artifacts {
            let target = graph.as_mut().map(|(g, point)| (&mut **g, &*point));
            insert_source_artifact(&mut ledger, target, artifact)
                .map_err(at(Stage::WritingArtifacts))?;
        }
    }

    let manual = ManualInstaller;
    let installer: &dyn PackageInstaller = if settings.dry_run || !settings.install_enabled {
        &manual
    } else {
        ports.installer
    };

    let mut follow_ups = rendered.follow_ups;
    {
        let _stage = enter(Stage::MutatingDescriptors);
        let mut mutation = Mutation {
            root,
            ledger: &mut ledger,
            installer,
            dependencies: &mut report.dependencies,
            follow_ups: &mut follow_ups,
        };
        mutation
            .run(&platform, settings.service.service_type, loaded)
            .map_err(at(Stage::MutatingDescriptors))?;
    }

    let _stage = enter(Stage::Reporting);
    let patch = ledger.patch();
    report.files = ledger.into_files();
    report.follow_ups = follow_ups;
    report.snippet = rendered.snippet;
    report.run.ended_at = Some(Utc::now());
    debug!(stage = Stage::Done.as_str(), "run complete");

    Ok(IntegrationOutcome { report, patch })
}

fn resolve_platform(settings: &IntegrationSettings) -> IntegrationResult<PlatformTarget> {
    Ok(match settings.platform {
        PlatformKind::Ios => {
            let project_name = match &settings.project_name {
                Some(name) => name.clone(),
                None => PathResolver::discover_ios_project(&settings.project_root)?,
            };
            PlatformTarget::Ios { project_name }
        }
        PlatformKind::Android => PlatformTarget::Android,
        PlatformKind::Web => PlatformTarget::Web {
            framework: settings.web.framework.clone(),
            source_dir: settings.web.source_dir.clone(),
        },
    })
}

fn load_descriptors(
    platform: &PlatformTarget,
    settings: &IntegrationSettings,
    paths: &PlatformPaths,
) -> IntegrationResult<Loaded> {
    match (&paths.descriptors, platform) {
        (DescriptorPaths::Ios { pbxproj, podfile }, PlatformTarget::Ios { project_name }) => {
            let graph = Loadable::load(pbxproj, |p, text| ProjectGraph::parse(p, text))?;
            // Fail on a missing anchor now rather than after files were written.
            graph.doc.anchor_group(project_name)?;
            graph.doc.sources_phase(project_name)?;

            if !podfile.is_file() {
                return Err(IntegrationError::project_structure(
                    podfile,
                    "no Podfile; run `pod init` first",
                ));
            }
            let podfile =
                Loadable::load(podfile, |p, text| Podfile::parse(p, text, project_name))?;
            Ok(Loaded::Ios { graph, podfile })
        }
        (DescriptorPaths::Android { gradle, .. }, PlatformTarget::Android) => {
            let gradle = Loadable::load(gradle, |p, text| GradleBuildFile::parse(p, text))?;
            Ok(Loaded::Android { gradle })
        }
        (
            DescriptorPaths::Web {
                package_json,
                markup,
            },
            PlatformTarget::Web { framework, .. },
        ) => {
            let package = match framework {
                WebFramework::None => None,
                _ => Some(PackageManifest::parse(
                    package_json,
                    &read_descriptor(package_json)?,
                )?),
            };
            let markup = match settings.service.service_type {
                ServiceType::LowLatencyStream => {
                    let doc = Loadable::load(markup, |p, text| MarkupDocument::parse(p, text))?;
                    doc.doc.locate("body")?;
                    Some(doc)
                }
                ServiceType::GenericStream => None,
            };
            Ok(Loaded::Web { package, markup })
        }
        (descriptors, platform) => Err(IntegrationError::project_structure(
            &settings.project_root,
            format!(
                "descriptor layout {descriptors:?} does not match platform {}",
                platform.kind()
            ),
        )),
    }
}

fn build_parameters(
    platform: &PlatformTarget,
    settings: &IntegrationSettings,
    paths: &PlatformPaths,
) -> IntegrationParameters {
    let service = &settings.service;
    let mut params = IntegrationParameters::new();
    params
        .insert("src", ParamValue::Url(service.output_endpoint.clone()))
        .insert("creationDate", ParamValue::Date(Utc::now()))
        .set_str("serviceType", service.service_type.as_str());
    if service.service_type == ServiceType::LowLatencyStream
        && let Some(latency) = &service.channel_latency
    {
        params.set_str("channelLatency", latency.as_str());
    }

    match platform {
        PlatformTarget::Ios { project_name } => {
            params.set_str("projectName", project_name.as_str());
        }
        PlatformTarget::Android => {
            if let DescriptorPaths::Android { package, .. } = &paths.descriptors {
                params.set_str("packageName", package.as_str());
            }
        }
        PlatformTarget::Web { framework, .. } => {
            params.set_str("framework", framework.name());
            match service.service_type {
                ServiceType::LowLatencyStream => {
                    params
                        .set_str("techOrder", r#"["AmazonIVS"]"#)
                        .set_str("techSetup", "window.registerIVSTech(videojs);");
                }
                ServiceType::GenericStream => {
                    params
                        .set_str("techOrder", r#"["html5"]"#)
                        .set_str("techSetup", "// HLS and DASH play through the html5 tech.");
                }
            }
        }
    }
    params
}

fn render(
    platform: &PlatformTarget,
    service: ServiceType,
    paths: &PlatformPaths,
    params: &IntegrationParameters,
    renderer: &dyn TemplateRenderer,
) -> Result<Rendered, ToolError> {
    let fill = |t: &Template| -> Result<String, ToolError> {
        renderer
            .render(t, params)
            .map_err(|e| ToolError::Internal(anyhow::Error::new(e)))
    };
    let artifact = |dir: &Utf8Path,
                    name: &str,
                    role: FileRole,
                    t: &Template,
                    register: Option<ArtifactKind>|
     -> Result<Artifact, ToolError> {
        Ok(Artifact {
            path: dir.join(name),
            role,
            content: fill(t)?,
            register,
        })
    };

    let mut out = Rendered {
        artifacts: Vec::new(),
        snippet: None,
        follow_ups: Vec::new(),
    };
    let src = paths.source_dir.as_path();

    match platform {
        PlatformTarget::Ios { project_name } => {
            out.artifacts.push(artifact(
                src,
                "VideoPlayer.swift",
                FileRole::Component,
                &templates::ios_player(service),
                Some(ArtifactKind::Source),
            )?);
            if service == ServiceType::GenericStream {
                out.artifacts.push(artifact(
                    src,
                    "empty.cpp",
                    FileRole::Support,
                    &templates::IOS_EMPTY_CPP,
                    Some(ArtifactKind::Source),
                )?);
                out.artifacts.push(artifact(
                    src,
                    "empty.hpp",
                    FileRole::Support,
                    &templates::IOS_EMPTY_HPP,
                    Some(ArtifactKind::Header),
                )?);
                out.artifacts.push(artifact(
                    src,
                    &format!("{project_name}-Bridging-Header.h"),
                    FileRole::Support,
                    &templates::IOS_BRIDGING_HEADER,
                    Some(ArtifactKind::Header),
                )?);
            }
            out.snippet = Some(Snippet {
                heading: "Import and add the following ios component to your ContentView:"
                    .to_string(),
                body: fill(&templates::IOS_SNIPPET)?,
            });
        }
        PlatformTarget::Android => {
            out.artifacts.push(artifact(
                src,
                "VideoPlayerActivity.kt",
                FileRole::Component,
                &templates::ANDROID_ACTIVITY,
                None,
            )?);
            out.artifacts.push(artifact(
                paths.resource_dir.as_path(),
                "activity_video_player.xml",
                FileRole::Support,
                &templates::ANDROID_LAYOUT,
                None,
            )?);
            out.follow_ups.push(
                FollowUp::new("A new Android Activity has been created")
                    .with_detail(src.join("VideoPlayerActivity.kt").to_string()),
            );
        }
        PlatformTarget::Web { framework, .. } => {
            let ext = framework.component_extension();
            if let Some(component) = templates::web_component(framework) {
                let (dir, name) = match framework {
                    WebFramework::Angular => (
                        src.join("app/video-player"),
                        format!("video-player.component.{ext}"),
                    ),
                    WebFramework::Vue => (src.join("components"), format!("VideoPlayer.{ext}")),
                    WebFramework::Ember => {
                        (src.join("app/components"), format!("video-player.{ext}"))
                    }
                    WebFramework::None | WebFramework::Other(_) => {
                        (src.to_path_buf(), format!("VideoPlayer.{ext}"))
                    }
                };
                out.artifacts.push(artifact(
                    dir.as_path(),
                    &name,
                    FileRole::Component,
                    &component,
                    None,
                )?);
                if *framework == WebFramework::Angular {
                    out.artifacts.push(artifact(
                        dir.as_path(),
                        "video-player.component.scss",
                        FileRole::Support,
                        &templates::WEB_ANGULAR_STYLES,
                        None,
                    )?);
                }
            }

            let heading = match framework {
                WebFramework::None => "Copy and paste the following snippet of code:".to_string(),
                other => format!("Import and add the following {other} component:"),
            };
            out.snippet = Some(Snippet {
                heading,
                body: fill(&templates::web_snippet(framework))?,
            });

            match framework {
                WebFramework::Angular => out.follow_ups.push(FollowUp::new(
                    "Don't forget to add the component to your angular module",
                )),
                WebFramework::Ember => out.follow_ups.push(
                    FollowUp::new("Add the following statement in your ember-cli-build.js:")
                        .with_detail(EMBER_CSS_IMPORT),
                ),
                _ => {}
            }
        }
    }
    Ok(out)
}

/// Write a generated file and, for native project graphs, register it
/// under the anchor group. Registration only touches the in-memory graph;
/// the graph itself is written back with the other descriptors.
fn insert_source_artifact(
    ledger: &mut Ledger<'_>,
    graph: Option<(&mut ProjectGraph, &InsertionPoint)>,
    artifact: &Artifact,
) -> IntegrationResult<()> {
    let before = read_optional(&artifact.path)?;
    ledger.write(
        &artifact.path,
        artifact.role,
        before,
        artifact.content.clone(),
    )?;

    if let (Some((graph, point)), Some(kind)) = (graph, artifact.register) {
        let file_name = artifact.path.file_name().ok_or_else(|| {
            IntegrationError::project_structure(&artifact.path, "artifact has no file name")
        })?;
        if graph.register_file(file_name, kind, point)? {
            debug!(file = file_name, anchor = %point.anchor, "registered in project graph");
        }
    }
    Ok(())
}

struct Mutation<'r, 'w> {
    root: &'r Utf8Path,
    ledger: &'r mut Ledger<'w>,
    installer: &'r dyn PackageInstaller,
    dependencies: &'r mut Vec<DependencyOutcome>,
    follow_ups: &'r mut Vec<FollowUp>,
}

impl Mutation<'_, '_> {
    fn run(
        &mut self,
        platform: &PlatformTarget,
        service: ServiceType,
        loaded: Loaded,
    ) -> IntegrationResult<()> {
        match (platform, loaded) {
            (PlatformTarget::Ios { project_name }, Loaded::Ios { graph, podfile }) => {
                self.ios(project_name, service, graph, podfile)
            }
            (PlatformTarget::Android, Loaded::Android { gradle }) => self.android(gradle),
            (PlatformTarget::Web { .. }, Loaded::Web { package, markup }) => {
                self.web(package, markup)
            }
            (platform, _) => Err(IntegrationError::project_structure(
                self.root,
                format!("descriptors do not match platform {}", platform.kind()),
            )),
        }
    }

    fn ios(
        &mut self,
        project_name: &str,
        service: ServiceType,
        mut graph: Loadable<ProjectGraph>,
        mut podfile: Loadable<Podfile>,
    ) -> IntegrationResult<()> {
        let pod = match service {
            ServiceType::LowLatencyStream => DependencyReference::new("AmazonIVSPlayer"),
            ServiceType::GenericStream => DependencyReference::new("MobileVLCKit")
                .with_version("3.3.0")
                .with_platform_version("8.4"),
        };

        if service == ServiceType::GenericStream {
            let header = format!("{project_name}/{project_name}-Bridging-Header.h");
            for configuration in ["Debug", "Release"] {
                graph
                    .doc
                    .set_build_property(BRIDGING_HEADER_SETTING, &header, configuration)?;
            }
        }
        self.ledger.write(
            &graph.path,
            FileRole::Descriptor,
            Some(graph.original),
            graph.doc.into_text(),
        )?;

        let mut changed = podfile.doc.ensure_dependency(&pod)?;
        if let Some(floor) = &pod.platform_version {
            changed |= podfile.doc.ensure_platform(floor)?;
        }
        // A declared pod whose install failed or was deferred still needs one.
        let installed = !changed && podfile.doc.is_installed(&pod)?;
        self.ledger.write(
            &podfile.path,
            FileRole::Descriptor,
            Some(podfile.original),
            podfile.doc.into_text(),
        )?;

        let status = if installed {
            DependencyStatus::AlreadyPresent
        } else {
            self.install(Ecosystem::CocoaPods, &pod)?
        };
        self.record(&podfile.path, pod, status);
        Ok(())
    }

    fn android(&mut self, mut gradle: Loadable<GradleBuildFile>) -> IntegrationResult<()> {
        let exoplayer = DependencyReference::new("com.google.android.exoplayer:exoplayer")
            .with_version("2.13.2");
        let status = if gradle.doc.ensure_dependency(&exoplayer)? {
            self.follow_ups.push(FollowUp::new(
                "Configuration complete, please reload your gradle dependencies.",
            ));
            DependencyStatus::Added
        } else {
            DependencyStatus::AlreadyPresent
        };
        self.ledger.write(
            &gradle.path,
            FileRole::Descriptor,
            Some(gradle.original),
            gradle.doc.into_text(),
        )?;
        self.record(&gradle.path, exoplayer, status);
        Ok(())
    }

    fn web(
        &mut self,
        package: Option<PackageManifest>,
        markup: Option<Loadable<MarkupDocument>>,
    ) -> IntegrationResult<()> {
        if let Some(mut markup) = markup {
            markup.doc.insert_fragment(
                IVS_SCRIPT_SIGNATURE,
                IVS_SCRIPT,
                &InsertionPoint::append_to("body"),
            )?;
            self.ledger.write(
                &markup.path,
                FileRole::Descriptor,
                Some(markup.original),
                markup.doc.into_text(),
            )?;
        }

        if let Some(package) = package {
            let videojs = DependencyReference::new("video.js");
            let status = package.ensure_dependency(self.installer, self.root, &videojs)?;
            if status == DependencyStatus::Deferred {
                self.defer(Ecosystem::Npm, &videojs);
            }
            self.record(package.path(), videojs, status);
        }
        Ok(())
    }

    fn install(
        &mut self,
        ecosystem: Ecosystem,
        dep: &DependencyReference,
    ) -> IntegrationResult<DependencyStatus> {
        match self
            .installer
            .ensure_package_present(ecosystem, self.root, dep)?
        {
            InstallOutcome::Installed => Ok(DependencyStatus::Installed),
            InstallOutcome::Deferred { .. } => {
                self.defer(ecosystem, dep);
                Ok(DependencyStatus::Deferred)
            }
        }
    }

    fn defer(&mut self, ecosystem: Ecosystem, dep: &DependencyReference) {
        self.follow_ups.push(
            FollowUp::new(format!("Install {} dependencies", ecosystem))
                .with_detail(ecosystem.install_command(dep).join(" ")),
        );
    }

    fn record(
        &mut self,
        descriptor: &Utf8Path,
        dependency: DependencyReference,
        status: DependencyStatus,
    ) {
        let descriptor = self.ledger.display(descriptor).to_string();
        self.dependencies.push(DependencyOutcome {
            descriptor,
            dependency,
            status,
        });
    }
}
