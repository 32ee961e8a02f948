//! HTML entry point (`index.html`).
//!
//! Only the named container element is located; the rest of the document is
//! opaque text. HTML comments are masked so a commented-out `<body>` or
//! script tag is never taken for the real one.

use crate::error::{IntegrationError, IntegrationResult};
use crate::splice::{Splice, apply_splices, is_line_leading, line_indent, line_start};
use camino::{Utf8Path, Utf8PathBuf};
use playerkit_types::dependency::{InsertionPoint, Position};
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(\s[^>]*)?>").expect("valid regex"));
static BODY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct MarkupDocument {
    path: Utf8PathBuf,
    text: String,
    masked: String,
}

/// Byte ranges of one element: its opening tag and its closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementSpan {
    open: Range<usize>,
    close: Range<usize>,
}

impl MarkupDocument {
    pub fn parse(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> IntegrationResult<Self> {
        let path = path.into();
        let text = text.into();
        let masked = mask_comments(&text)
            .map_err(|m| IntegrationError::descriptor_parse(&path, m))?;
        Ok(Self { path, text, masked })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn element(&self, name: &str) -> IntegrationResult<ElementSpan> {
        let (open_re, close_re) = self.element_patterns(name)?;

        let open = open_re.find(&self.masked).ok_or_else(|| {
            IntegrationError::anchor_not_found(&self.path, format!("no <{name}> element"))
        })?;
        let close = close_re
            .find_iter(&self.masked[open.end()..])
            .last()
            .map(|m| open.end() + m.start()..open.end() + m.end())
            .ok_or_else(|| {
                IntegrationError::anchor_not_found(&self.path, format!("<{name}> is never closed"))
            })?;
        Ok(ElementSpan {
            open: open.range(),
            close,
        })
    }

    fn element_patterns(
        &self,
        name: &str,
    ) -> IntegrationResult<(Cow<'static, Regex>, Cow<'static, Regex>)> {
        if name.eq_ignore_ascii_case("body") {
            return Ok((Cow::Borrowed(&*BODY_OPEN), Cow::Borrowed(&*BODY_CLOSE)));
        }
        let escaped = regex::escape(name);
        let compile = |pattern: String| {
            Regex::new(&pattern)
                .map(Cow::Owned)
                .map_err(|e| IntegrationError::descriptor_parse(&self.path, e.to_string()))
        };
        Ok((
            compile(format!(r"(?i)<{escaped}(\s[^>]*)?>"))?,
            compile(format!(r"(?i)</{escaped}\s*>"))?,
        ))
    }

    /// Check that the element exists, without looking at its content.
    pub fn locate(&self, element: &str) -> IntegrationResult<()> {
        self.element(element).map(|_| ())
    }

    /// True if `signature` occurs (outside comments) inside `element`.
    pub fn has_fragment(&self, element: &str, signature: &str) -> IntegrationResult<bool> {
        let span = self.element(element)?;
        Ok(self.masked[span.open.end..span.close.start].contains(signature))
    }

    /// Insert `fragment` at `point` unless `signature` is already where the
    /// fragment would go. Returns true if the document changed.
    pub fn insert_fragment(
        &mut self,
        signature: &str,
        fragment: &str,
        point: &InsertionPoint,
    ) -> IntegrationResult<bool> {
        let span = self.element(&point.anchor)?;
        let region = match point.position {
            Position::Before | Position::Append => span.open.end..span.close.start,
            Position::After => span.close.end..self.masked.len(),
        };
        if self.masked[region].contains(signature) {
            return Ok(false);
        }

        let text = &self.text;
        let splice = match point.position {
            Position::Append => {
                let at = span.close.start;
                if is_line_leading(text, at) {
                    let indent = line_indent(text, at);
                    Splice::insert(line_start(text, at), format!("{indent}  {fragment}\n"))
                } else {
                    Splice::insert(at, fragment.to_string())
                }
            }
            Position::Before => {
                let indent = line_indent(text, span.open.start);
                Splice::insert(span.open.end, format!("\n{indent}  {fragment}"))
            }
            Position::After => {
                let indent = line_indent(text, span.close.start);
                Splice::insert(span.close.end, format!("\n{indent}{fragment}"))
            }
        };

        let text = apply_splices(&self.text, vec![splice]);
        *self = MarkupDocument::parse(self.path.clone(), text)?;
        Ok(true)
    }
}

/// Blank `<!-- ... -->` comments, keeping byte offsets.
fn mask_comments(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 4..];
        let end = after
            .find("-->")
            .ok_or_else(|| "unterminated `<!--` comment".to_string())?;
        let comment = &rest[start..start + 4 + end + 3];
        out.extend(comment.bytes().map(|b| if b == b'\n' { '\n' } else { ' ' }));
        rest = &after[end + 3..];
    }
    out.push_str(rest);
    Ok(out)
}
