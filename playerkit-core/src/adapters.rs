//! Default port implementations.

use crate::ports::{
    Ecosystem, InstallOutcome, PackageInstaller, TemplateError, TemplateRenderer, WritePort,
};
use crate::templates::Template;
use camino::{Utf8Path, Utf8PathBuf};
use playerkit_edit::descriptor::write_atomic;
use playerkit_edit::{IntegrationError, IntegrationResult};
use playerkit_types::dependency::DependencyReference;
use playerkit_types::params::IntegrationParameters;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::process::Command;
use tracing::{debug, info};

/// Filesystem writes through a temp file and rename in the target directory.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &str) -> IntegrationResult<()> {
        write_atomic(path, contents)
    }
}

/// In-memory writer for embedding and testing.
#[derive(Debug, Default)]
pub struct MemoryWritePort {
    files: RefCell<BTreeMap<Utf8PathBuf, String>>,
}

impl MemoryWritePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl WritePort for MemoryWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &str) -> IntegrationResult<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

/// Runs the real package manager in the project root.
#[derive(Debug, Clone, Default)]
pub struct ProcessInstaller;

impl PackageInstaller for ProcessInstaller {
    fn ensure_package_present(
        &self,
        ecosystem: Ecosystem,
        project_root: &Utf8Path,
        dep: &DependencyReference,
    ) -> IntegrationResult<InstallOutcome> {
        let argv = ecosystem.install_command(dep);
        let command = argv.join(" ");
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| IntegrationError::ExternalProcess {
                command: command.clone(),
                message: "empty command".to_string(),
            })?;

        info!(%command, cwd = %project_root, "running package manager");
        let output = Command::new(program)
            .args(args)
            .current_dir(project_root)
            .output()
            .map_err(|e| IntegrationError::ExternalProcess {
                command: command.clone(),
                message: format!("failed to start: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(IntegrationError::ExternalProcess {
                command,
                message: format!("exited with {}: {}", output.status, tail.join("\n")),
            });
        }
        debug!(%command, "package manager finished");
        Ok(InstallOutcome::Installed)
    }
}

/// Runs nothing; reports the command the operator has to run.
#[derive(Debug, Clone, Default)]
pub struct ManualInstaller;

impl PackageInstaller for ManualInstaller {
    fn ensure_package_present(
        &self,
        ecosystem: Ecosystem,
        _project_root: &Utf8Path,
        dep: &DependencyReference,
    ) -> IntegrationResult<InstallOutcome> {
        Ok(InstallOutcome::Deferred {
            command: ecosystem.install_command(dep).join(" "),
        })
    }
}

/// `{{name}}` substitution.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRenderer;

impl TemplateRenderer for PlaceholderRenderer {
    fn render(
        &self,
        template: &Template,
        params: &IntegrationParameters,
    ) -> Result<String, TemplateError> {
        let text = template.text;
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                break;
            };
            let name = &after[..end];
            out.push_str(&rest[..start]);
            if is_identifier(name) {
                let value = params
                    .text(name)
                    .ok_or_else(|| TemplateError::UnknownParameter {
                        template: template.name.to_string(),
                        name: name.to_string(),
                    })?;
                out.push_str(&value);
            } else {
                out.push_str(&rest[start..start + 2 + end + 2]);
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
