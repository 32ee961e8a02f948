//! Gradle module build file (`app/build.gradle` or `app/build.gradle.kts`).
//!
//! The file is never re-serialized. Comments and string literals are masked
//! out of a scan copy of the text so braces and identifiers inside them do
//! not count; edits are spliced into the original text.

use crate::DependencyDescriptor;
use crate::error::{IntegrationError, IntegrationResult};
use crate::splice::{Splice, apply_splices, is_line_leading, line_indent, line_start};
use camino::{Utf8Path, Utf8PathBuf};
use playerkit_types::dependency::DependencyReference;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradleDialect {
    Groovy,
    Kotlin,
}

impl GradleDialect {
    pub fn from_path(path: &Utf8Path) -> Self {
        if path.extension() == Some("kts") {
            GradleDialect::Kotlin
        } else {
            GradleDialect::Groovy
        }
    }

    /// `implementation` declaration for `coordinate` in this dialect.
    pub fn declaration(self, coordinate: &str) -> String {
        match self {
            GradleDialect::Groovy => format!("implementation '{coordinate}'"),
            GradleDialect::Kotlin => format!("implementation(\"{coordinate}\")"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradleBuildFile {
    path: Utf8PathBuf,
    dialect: GradleDialect,
    text: String,
    /// `text` with comments blanked; same byte length, newlines kept.
    code: String,
    /// Offsets of the top-level `dependencies {` brace and its closing `}`.
    block: Range<usize>,
}

impl GradleBuildFile {
    /// Parse a build file. A file without a top-level `dependencies { }`
    /// block has no place for new declarations and is rejected.
    pub fn parse(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> IntegrationResult<Self> {
        let path = path.into();
        let text = text.into();
        let dialect = GradleDialect::from_path(&path);
        let (code, masked) =
            mask(&text).map_err(|m| IntegrationError::descriptor_parse(&path, m))?;
        let block = find_dependencies_block(&masked)
            .map_err(|m| IntegrationError::descriptor_parse(&path, m))?;
        Ok(Self {
            path,
            dialect,
            text,
            code,
            block,
        })
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl DependencyDescriptor for GradleBuildFile {
    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn as_text(&self) -> &str {
        &self.text
    }

    /// Any non-comment line naming `group:artifact`, whatever the version.
    fn has_dependency(&self, dep: &DependencyReference) -> bool {
        self.code
            .lines()
            .any(|line| contains_identifier(line, &dep.identifier))
    }

    fn ensure_dependency(&mut self, dep: &DependencyReference) -> IntegrationResult<bool> {
        if self.has_dependency(dep) {
            return Ok(false);
        }

        let declaration = self.dialect.declaration(&dep.coordinate());
        let close = self.block.end;
        let own_line =
            is_line_leading(&self.text, close) && line_start(&self.text, close) > self.block.start;
        let splice = if own_line {
            let indent = self
                .member_indent()
                .unwrap_or_else(|| format!("{}    ", line_indent(&self.text, close)));
            Splice::insert(
                line_start(&self.text, close),
                format!("{indent}{declaration}\n"),
            )
        } else {
            let base = line_indent(&self.text, self.block.start).to_string();
            Splice::insert(close, format!("\n{base}    {declaration}\n{base}"))
        };

        let text = apply_splices(&self.text, vec![splice]);
        *self = GradleBuildFile::parse(self.path.clone(), text)?;
        Ok(true)
    }
}

impl GradleBuildFile {
    /// Indentation of the first declaration inside the dependencies block.
    fn member_indent(&self) -> Option<String> {
        let inner = &self.code[self.block.start + 1..self.block.end];
        let offset = self.block.start + 1;
        let mut pos = 0;
        for line in inner.split_inclusive('\n') {
            let at = offset + pos;
            pos += line.len();
            if at == offset || line.trim().is_empty() {
                continue;
            }
            return Some(line_indent(&self.text, at).to_string());
        }
        None
    }
}

/// True if `identifier` occurs in `line` as a whole coordinate prefix, so
/// `group:artifact` does not match `group:artifact-extension`.
fn contains_identifier(line: &str, identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    line.match_indices(identifier).any(|(at, _)| {
        let before = line[..at].chars().next_back();
        let after = line[at + identifier.len()..].chars().next();
        let boundary = |c: Option<char>| match c {
            None => true,
            Some(c) => !(c.is_alphanumeric() || matches!(c, '.' | '-' | '_')),
        };
        boundary(before) && boundary(after)
    })
}

/// Blank out comments. Returns (comments blanked, comments and strings blanked).
fn mask(text: &str) -> Result<(String, String), String> {
    let bytes = text.as_bytes();
    let mut code = bytes.to_vec();
    let mut structure = bytes.to_vec();
    let mut i = 0;
    let blank = |buf: &mut Vec<u8>, range: Range<usize>| {
        for b in &mut buf[range] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = text[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
                blank(&mut code, i..end);
                blank(&mut structure, i..end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = text[i + 2..]
                    .find("*/")
                    .map(|n| i + 2 + n + 2)
                    .ok_or_else(|| format!("unterminated comment at line {}", line_no(text, i)))?;
                blank(&mut code, i..end);
                blank(&mut structure, i..end);
                i = end;
            }
            quote @ (b'\'' | b'"') => {
                let mut j = i + 1;
                loop {
                    match bytes.get(j) {
                        Some(b'\\') => j += 2,
                        Some(b) if *b == quote => break,
                        Some(_) => j += 1,
                        None => {
                            return Err(format!(
                                "unterminated string at line {}",
                                line_no(text, i)
                            ));
                        }
                    }
                }
                blank(&mut structure, i + 1..j);
                i = j + 1;
            }
            _ => i += 1,
        }
    }

    // Ranges start and end on ASCII delimiters, so blanking keeps UTF-8 valid.
    let code = String::from_utf8(code).map_err(|e| e.to_string())?;
    let structure = String::from_utf8(structure).map_err(|e| e.to_string())?;
    Ok((code, structure))
}

fn line_no(text: &str, pos: usize) -> usize {
    text[..pos].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Locate the depth-0 `dependencies {` block in masked text.
fn find_dependencies_block(masked: &str) -> Result<Range<usize>, String> {
    const KEYWORD: &str = "dependencies";
    let bytes = masked.as_bytes();
    let mut depth: usize = 0;
    let mut i = 0;
    let mut found: Option<usize> = None;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                if depth == 0 {
                    return Err(format!("unbalanced `}}` at line {}", line_no(masked, i)));
                }
                depth -= 1;
                i += 1;
            }
            _ if found.is_none() && depth == 0 && bytes[i..].starts_with(KEYWORD.as_bytes()) => {
                let prev_ok = i == 0 || !is_ident(bytes[i - 1]);
                let mut j = i + KEYWORD.len();
                let next_ok = bytes.get(j).is_none_or(|b| !is_ident(*b));
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if prev_ok && next_ok && bytes.get(j) == Some(&b'{') {
                    found = Some(j);
                    i = j;
                } else {
                    i += KEYWORD.len();
                }
            }
            _ => i += 1,
        }
    }

    if depth != 0 {
        return Err("unbalanced braces: missing `}`".to_string());
    }
    let open = found.ok_or_else(|| "no top-level `dependencies { }` block".to_string())?;
    let close = matching_brace(bytes, open)
        .ok_or_else(|| "unterminated `dependencies` block".to_string())?;
    Ok(open..close)
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
