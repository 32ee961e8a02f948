//! CocoaPods `Podfile`.
//!
//! Line-oriented: the file is Ruby, but everything needed here (pod
//! declarations, the platform line and `target ... do ... end` blocks) sits
//! on lines of its own.

use crate::DependencyDescriptor;
use crate::descriptor::read_optional;
use crate::error::{IntegrationError, IntegrationResult};
use camino::{Utf8Path, Utf8PathBuf};
use playerkit_types::dependency::DependencyReference;
use regex::Regex;
use std::sync::LazyLock;

static TARGET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)target\s+['"]([^'"]+)['"]\s+do\s*$"#).expect("valid regex")
});
static POD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*pod\s+['"]([^'"]+)['"]"#).expect("valid regex"));
static PLATFORM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*platform\s+:ios\b(?:\s*,\s*['"]([^'"]*)['"])?"#).expect("valid regex")
});
static COMMENTED_PLATFORM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*platform\s+:ios\b").expect("valid regex"));
static BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^\s*(if|unless|def|case|begin|while|until|class|module)\b)|\bdo(\s*\|[^|]*\|)?\s*$")
        .expect("valid regex")
});
static BLOCK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*end\b").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct Podfile {
    path: Utf8PathBuf,
    target: String,
    text: String,
    /// Line indices of the target's `target ... do` and matching `end`.
    block: (usize, usize),
}

impl Podfile {
    /// Parse a Podfile and locate the block of `target`, falling back to the
    /// only target block when none is named `target`.
    pub fn parse(
        path: impl Into<Utf8PathBuf>,
        text: impl Into<String>,
        target: &str,
    ) -> IntegrationResult<Self> {
        let path = path.into();
        let text = text.into();
        let block = locate_target(&text, target)
            .map_err(|m| IntegrationError::descriptor_parse(&path, m))?;
        Ok(Self {
            path,
            target: target.to_string(),
            text,
            block,
        })
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Raise the iOS deployment target to at least `floor`.
    ///
    /// A live `platform :ios` line at or above `floor` is kept. A lower (or
    /// unversioned) live line is replaced; without one, a commented-out
    /// platform line is uncommented, else one is prepended. Returns true on
    /// change.
    pub fn ensure_platform(&mut self, floor: &str) -> IntegrationResult<bool> {
        let wanted = format!("platform :ios, '{floor}'");
        let lines: Vec<&str> = self.text.split_inclusive('\n').collect();

        let live = lines.iter().enumerate().find_map(|(i, l)| {
            PLATFORM_LINE
                .captures(strip_comment(l))
                .map(|c| (i, c.get(1).map(|m| m.as_str())))
        });
        let replace = match live {
            Some((_, Some(version))) if !version_below(version, floor) => return Ok(false),
            Some((i, _)) => Some(i),
            None => lines.iter().position(|l| COMMENTED_PLATFORM_LINE.is_match(l)),
        };

        let text = match replace {
            Some(i) => {
                let eol = if lines[i].ends_with('\n') { "\n" } else { "" };
                let mut out = String::with_capacity(self.text.len() + wanted.len());
                for (j, line) in lines.iter().enumerate() {
                    if j == i {
                        out.push_str(&wanted);
                        out.push_str(eol);
                    } else {
                        out.push_str(line);
                    }
                }
                out
            }
            None => format!("{wanted}\n{}", self.text),
        };
        *self = Podfile::parse(self.path.clone(), text, &self.target)?;
        Ok(true)
    }

    /// True once `pod install` has resolved `dep`: `Podfile.lock` lists the
    /// pod and the `Pods/Manifest.lock` sandbox copy matches it.
    pub fn is_installed(&self, dep: &DependencyReference) -> IntegrationResult<bool> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_str().is_empty() => p.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        let Some(lock) = read_optional(&dir.join("Podfile.lock"))? else {
            return Ok(false);
        };
        let manifest = read_optional(&dir.join("Pods").join("Manifest.lock"))?;
        let in_sync = manifest.as_deref() == Some(lock.as_str());
        Ok(in_sync && lock_lists_pod(&lock, &dep.identifier))
    }

    fn declaration(dep: &DependencyReference) -> String {
        match &dep.version {
            Some(v) => format!("pod '{}', '{}'", dep.identifier, v),
            None => format!("pod '{}'", dep.identifier),
        }
    }
}

impl DependencyDescriptor for Podfile {
    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn as_text(&self) -> &str {
        &self.text
    }

    /// Any uncommented `pod '<identifier>'` line, including subspecs.
    fn has_dependency(&self, dep: &DependencyReference) -> bool {
        self.text.lines().any(|line| {
            POD_LINE
                .captures(strip_comment(line))
                .and_then(|c| c.get(1))
                .map(|m| {
                    let name = m.as_str();
                    name == dep.identifier
                        || name
                            .strip_prefix(dep.identifier.as_str())
                            .is_some_and(|rest| rest.starts_with('/'))
                })
                .unwrap_or(false)
        })
    }

    fn ensure_dependency(&mut self, dep: &DependencyReference) -> IntegrationResult<bool> {
        if self.has_dependency(dep) {
            return Ok(false);
        }
        let (open, close) = self.block;
        let lines: Vec<&str> = self.text.split_inclusive('\n').collect();
        let indent = TARGET_LINE
            .captures(lines[open].trim_end_matches(['\r', '\n']))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or("");

        let mut out = String::with_capacity(self.text.len() + 64);
        for (i, line) in lines.iter().enumerate() {
            if i == close {
                out.push_str(&format!("{indent}  {}\n", Podfile::declaration(dep)));
            }
            out.push_str(line);
        }
        *self = Podfile::parse(self.path.clone(), out, &self.target)?;
        Ok(true)
    }
}

/// Whether `version` sorts before `floor`, comparing dotted numeric parts
/// (`8.4` == `8.4.0`). A version that is not numeric is left alone.
fn version_below(version: &str, floor: &str) -> bool {
    fn parts(v: &str) -> Option<Vec<u32>> {
        v.trim().split('.').map(|p| p.parse().ok()).collect()
    }
    let (Some(mut have), Some(mut want)) = (parts(version), parts(floor)) else {
        return false;
    };
    let len = have.len().max(want.len());
    have.resize(len, 0);
    want.resize(len, 0);
    have < want
}

/// Entries of the `PODS:` section, subspecs included.
fn lock_lists_pod(lock: &str, identifier: &str) -> bool {
    lock.lines()
        .skip_while(|l| l.trim_end() != "PODS:")
        .skip(1)
        .take_while(|l| l.starts_with(' '))
        .filter_map(|l| l.trim_start().strip_prefix("- "))
        .any(|entry| {
            let name = entry.trim_matches('"');
            name.split([' ', '/']).next() == Some(identifier)
        })
}

/// Text before a `#` that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return &line[..i],
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    line
}

fn locate_target(text: &str, target: &str) -> Result<(usize, usize), String> {
    let lines: Vec<&str> = text.lines().map(strip_comment).collect();

    let starts: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| {
            TARGET_LINE
                .captures(l)
                .and_then(|c| c.get(2))
                .map(|m| (i, m.as_str()))
        })
        .collect();

    let open = match starts.iter().find(|(_, name)| *name == target) {
        Some((i, _)) => *i,
        None => {
            let outer: Vec<usize> = starts
                .iter()
                .map(|(i, _)| *i)
                .filter(|i| depth_at(&lines, *i) == 0)
                .collect();
            match outer.as_slice() {
                [only] => *only,
                [] => return Err("no `target ... do` block".to_string()),
                _ => return Err(format!("no `target '{target}' do` block")),
            }
        }
    };

    let mut depth = 0usize;
    for (i, line) in lines.iter().enumerate().skip(open) {
        if BLOCK_CLOSE.is_match(line) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Ok((open, i));
            }
        } else if BLOCK_OPEN.is_match(line) {
            depth += 1;
        }
    }
    Err(format!(
        "`target` block at line {} has no matching `end`",
        open + 1
    ))
}

fn depth_at(lines: &[&str], upto: usize) -> usize {
    let mut depth = 0usize;
    for line in &lines[..upto] {
        if BLOCK_CLOSE.is_match(line) {
            depth = depth.saturating_sub(1);
        } else if BLOCK_OPEN.is_match(line) {
            depth += 1;
        }
    }
    depth
}
