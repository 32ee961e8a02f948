//! Descriptor I/O: reading, hashing, atomic write-back and patch preview.

use crate::error::{IntegrationError, IntegrationResult};
use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::info;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Read a descriptor that must exist.
///
/// A missing file is a project structure problem, not an I/O failure: the
/// operator has to create it (or run the tool that does) first.
pub fn read_descriptor(path: &Utf8Path) -> IntegrationResult<String> {
    if !path.is_file() {
        return Err(IntegrationError::project_structure(
            path,
            "required file is missing",
        ));
    }
    fs::read_to_string(path).map_err(|e| IntegrationError::io(path, e))
}

/// Read a file if present.
pub fn read_optional(path: &Utf8Path) -> IntegrationResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IntegrationError::io(path, e)),
    }
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// Readers never observe a half-written file. Missing parent directories
/// are created. A replaced file keeps its permissions; a new one gets the
/// mode `fs::write` would give it (0666 less the umask).
pub fn write_atomic(path: &Utf8Path, contents: &str) -> IntegrationResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| IntegrationError::io(&parent, e))?;

    let existing = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(IntegrationError::io(path, e)),
    };

    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder
        .tempfile_in(&parent)
        .map_err(|e| IntegrationError::io(&parent, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| match existing {
            Some(perms) => tmp.as_file().set_permissions(perms),
            None => Ok(()),
        })
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| IntegrationError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| IntegrationError::io(path, e.error))?;

    info!(path = %path, bytes = contents.len(), "wrote");
    Ok(())
}

/// Before/after text of one file touched by a run. `before` is `None` for
/// files the run creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub before: Option<String>,
    pub after: String,
}

impl TextChange {
    pub fn is_change(&self) -> bool {
        self.before.as_deref() != Some(self.after.as_str())
    }
}

/// Unified diff over every changed file, keyed by display path.
pub fn render_patch(changes: &BTreeMap<Utf8PathBuf, TextChange>) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for (path, change) in changes {
        if !change.is_change() {
            continue;
        }
        let old = change.before.as_deref().unwrap_or("");

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        if change.before.is_none() {
            out.push_str("new file mode 100644\n");
            out.push_str(&format!("--- /dev/null\n+++ b/{0}\n", path));
        } else {
            out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));
        }

        let patch = diffy::create_patch(old, &change.after);
        let body = formatter.fmt_patch(&patch).to_string();
        // diffy repeats its own ---/+++ header; keep only the hunks.
        for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}
