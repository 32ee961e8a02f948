//! Project layout per platform.

use camino::{Utf8Path, Utf8PathBuf};
use playerkit_edit::android_manifest::AndroidManifest;
use playerkit_edit::descriptor::read_descriptor;
use playerkit_edit::{IntegrationError, IntegrationResult};
use playerkit_types::platform::{PlatformTarget, WebFramework};
use tracing::debug;

/// Where generated files go and which descriptors a run touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    pub source_dir: Utf8PathBuf,
    pub resource_dir: Utf8PathBuf,
    pub descriptors: DescriptorPaths,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorPaths {
    Ios {
        pbxproj: Utf8PathBuf,
        podfile: Utf8PathBuf,
    },
    Android {
        manifest: Utf8PathBuf,
        gradle: Utf8PathBuf,
        /// Application package read from the manifest.
        package: String,
    },
    Web {
        package_json: Utf8PathBuf,
        markup: Utf8PathBuf,
    },
}

pub struct PathResolver;

impl PathResolver {
    /// Compute source, resource and descriptor locations for `platform`.
    ///
    /// Only reads: the Android manifest is parsed for its package. Fails
    /// with a project structure error when a required directory is missing.
    pub fn resolve(platform: &PlatformTarget, root: &Utf8Path) -> IntegrationResult<PlatformPaths> {
        require_dir(root)?;
        let paths = match platform {
            PlatformTarget::Ios { project_name } => {
                let source_dir = root.join(project_name);
                require_dir(&source_dir)?;
                PlatformPaths {
                    resource_dir: source_dir.clone(),
                    source_dir,
                    descriptors: DescriptorPaths::Ios {
                        pbxproj: root
                            .join(format!("{project_name}.xcodeproj"))
                            .join("project.pbxproj"),
                        podfile: root.join("Podfile"),
                    },
                }
            }
            PlatformTarget::Android => {
                let main = root.join("app/src/main");
                require_dir(&main)?;
                let manifest_path = main.join("AndroidManifest.xml");
                let manifest =
                    AndroidManifest::parse(&manifest_path, &read_descriptor(&manifest_path)?)?;
                let java = main.join("java");
                require_dir(&java)?;
                PlatformPaths {
                    source_dir: java.join(manifest.package_dir()),
                    resource_dir: main.join("res/layout"),
                    descriptors: DescriptorPaths::Android {
                        manifest: manifest_path,
                        gradle: gradle_file(&root.join("app")),
                        package: manifest.package().to_string(),
                    },
                }
            }
            PlatformTarget::Web {
                framework,
                source_dir: rel,
            } => {
                let source_dir = root.join(rel);
                if *framework != WebFramework::None {
                    require_dir(&source_dir)?;
                }
                PlatformPaths {
                    resource_dir: source_dir.clone(),
                    source_dir,
                    descriptors: DescriptorPaths::Web {
                        package_json: root.join("package.json"),
                        markup: markup_entry(framework, root, rel),
                    },
                }
            }
        };
        debug!(?paths, "resolved paths");
        Ok(paths)
    }

    /// Name of the single `*.xcodeproj` bundle under `root`.
    pub fn discover_ios_project(root: &Utf8Path) -> IntegrationResult<String> {
        let pattern = root.join("*.xcodeproj");
        let matches: Vec<String> = glob::glob(pattern.as_str())
            .map_err(|e| IntegrationError::project_structure(root, e.to_string()))?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .filter_map(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .collect();

        match matches.as_slice() {
            [name] => Ok(name.clone()),
            [] => Err(IntegrationError::project_structure(
                root,
                "no .xcodeproj found; pass the project name explicitly",
            )),
            many => Err(IntegrationError::project_structure(
                root,
                format!(
                    "several .xcodeproj bundles ({}); pass the project name explicitly",
                    many.join(", ")
                ),
            )),
        }
    }
}

/// HTML entry point the framework's tooling serves.
pub fn markup_entry(framework: &WebFramework, root: &Utf8Path, source_dir: &str) -> Utf8PathBuf {
    match framework {
        WebFramework::Angular => root.join(source_dir).join("index.html"),
        WebFramework::Ember => root.join("app/index.html"),
        WebFramework::Vue => root.join("public/index.html"),
        WebFramework::Other(name) if name.eq_ignore_ascii_case("react") => {
            root.join("public/index.html")
        }
        WebFramework::None | WebFramework::Other(_) => root.join("index.html"),
    }
}

/// `build.gradle`, or `build.gradle.kts` when only the Kotlin script exists.
fn gradle_file(module: &Utf8Path) -> Utf8PathBuf {
    let groovy = module.join("build.gradle");
    let kotlin = module.join("build.gradle.kts");
    if !groovy.exists() && kotlin.exists() {
        kotlin
    } else {
        groovy
    }
}

fn require_dir(dir: &Utf8Path) -> IntegrationResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(IntegrationError::project_structure(
            dir,
            "required directory is missing",
        ))
    }
}
