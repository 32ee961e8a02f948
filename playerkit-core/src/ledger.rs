//! Record of every file a run creates or mutates.
//!
//! Writes go through the ledger so the report, the patch preview and the
//! dry-run switch all see the same before/after texts.

use crate::ports::WritePort;
use camino::{Utf8Path, Utf8PathBuf};
use playerkit_edit::IntegrationResult;
use playerkit_edit::descriptor::{TextChange, render_patch, sha256_hex};
use playerkit_types::report::{FileAction, FileChange, FileRole};
use std::collections::BTreeMap;
use tracing::debug;

pub struct Ledger<'a> {
    root: Utf8PathBuf,
    writer: &'a dyn WritePort,
    dry_run: bool,
    changes: BTreeMap<Utf8PathBuf, TextChange>,
    files: Vec<FileChange>,
}

impl<'a> Ledger<'a> {
    pub fn new(root: &Utf8Path, writer: &'a dyn WritePort, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            writer,
            dry_run,
            changes: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Record `after` as the new content of `path` and write it unless it is
    /// unchanged or this is a dry run.
    pub fn write(
        &mut self,
        path: &Utf8Path,
        role: FileRole,
        before: Option<String>,
        after: String,
    ) -> IntegrationResult<FileAction> {
        let action = match before.as_deref() {
            None => FileAction::Created,
            Some(b) if b == after => FileAction::Unchanged,
            Some(_) => FileAction::Modified,
        };

        if action != FileAction::Unchanged && !self.dry_run {
            self.writer.write_file(path, &after)?;
        }
        debug!(path = %path, ?action, dry_run = self.dry_run, "recorded");

        let shown = self.display(path);
        self.files.push(FileChange {
            path: shown.to_string(),
            role,
            action,
            sha256_before: before.as_deref().map(|b| sha256_hex(b.as_bytes())),
            sha256_after: Some(sha256_hex(after.as_bytes())),
        });
        self.changes.insert(shown, TextChange { before, after });
        Ok(action)
    }

    /// Path relative to the project root when it lies inside it.
    pub fn display(&self, path: &Utf8Path) -> Utf8PathBuf {
        path.strip_prefix(&self.root)
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    pub fn patch(&self) -> String {
        render_patch(&self.changes)
    }

    pub fn into_files(self) -> Vec<FileChange> {
        self.files
    }
}
