//! Lossless reader for the OpenStep property-list dialect used by `project.pbxproj`.
//!
//! The parser never rewrites text. It records byte spans for every value so
//! edits can be spliced into the original source, leaving every untouched
//! byte (comments, section markers, indentation) exactly as it was.

use std::ops::Range;

#[derive(Debug, Clone)]
pub struct Scalar {
    /// Unescaped value.
    pub value: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub items: Vec<Node>,
    /// Offset of `(`.
    pub open: usize,
    /// Offset of `)`.
    pub close: usize,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub key: Scalar,
    pub value: Node,
    /// Offset just past the terminating `;`.
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct DictNode {
    pub entries: Vec<Entry>,
    /// Offset of `{`.
    pub open: usize,
    /// Offset of `}`.
    pub close: usize,
}

impl DictNode {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key.value == key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Scalar(Scalar),
    Array(ArrayNode),
    Dict(DictNode),
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s.value.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictNode> {
        match self {
            Node::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            Node::Scalar(s) => s.span.clone(),
            Node::Array(a) => a.open..a.close + 1,
            Node::Dict(d) => d.open..d.close + 1,
        }
    }
}

/// Parse failure with a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parse a whole document. The top-level value must be a dictionary.
pub fn parse_document(src: &str) -> Result<DictNode, SyntaxError> {
    let mut p = Parser { src, pos: 0 };
    p.skip_trivia()?;
    let root = match p.peek() {
        Some(b'{') => p.dict()?,
        Some(_) => return Err(p.error("expected `{` at start of document")),
        None => return Err(p.error("empty document")),
    };
    p.skip_trivia()?;
    if p.pos < src.len() {
        return Err(p.error("trailing content after root dictionary"));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

fn is_bare(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'+' | b'/' | b':' | b'.' | b'-')
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: line_of(self.src, self.pos),
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        let bytes = self.src.as_bytes();
        loop {
            match bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if bytes.get(self.pos + 1) == Some(&b'*') => {
                    match self.src[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => return Err(self.error("unterminated comment")),
                    }
                }
                Some(b'/') if bytes.get(self.pos + 1) == Some(&b'/') => {
                    match self.src[self.pos..].find('\n') {
                        Some(end) => self.pos += end + 1,
                        None => self.pos = bytes.len(),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, want: u8) -> Result<(), SyntaxError> {
        self.skip_trivia()?;
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", want as char)))
        }
    }

    fn value(&mut self) -> Result<Node, SyntaxError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'{') => Ok(Node::Dict(self.dict()?)),
            Some(b'(') => Ok(Node::Array(self.array()?)),
            Some(_) => Ok(Node::Scalar(self.scalar()?)),
            None => Err(self.error("unexpected end of document")),
        }
    }

    fn dict(&mut self) -> Result<DictNode, SyntaxError> {
        let open = self.pos;
        self.pos += 1;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    let close = self.pos;
                    self.pos += 1;
                    return Ok(DictNode {
                        entries,
                        open,
                        close,
                    });
                }
                None => return Err(self.error("unterminated dictionary")),
                Some(_) => {}
            }
            let key = self.scalar()?;
            self.expect(b'=')?;
            let value = self.value()?;
            self.expect(b';')?;
            entries.push(Entry {
                key,
                value,
                end: self.pos,
            });
        }
    }

    fn array(&mut self) -> Result<ArrayNode, SyntaxError> {
        let open = self.pos;
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b')') => {
                    let close = self.pos;
                    self.pos += 1;
                    return Ok(ArrayNode { items, open, close });
                }
                None => return Err(self.error("unterminated array")),
                Some(_) => {}
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {}
                _ => return Err(self.error("expected `,` or `)` in array")),
            }
        }
    }

    fn scalar(&mut self) -> Result<Scalar, SyntaxError> {
        let start = self.pos;
        match self.peek() {
            Some(b'"') => self.quoted(),
            Some(b'<') => match self.src[start..].find('>') {
                Some(end) => {
                    self.pos = start + end + 1;
                    Ok(Scalar {
                        value: self.src[start..self.pos].to_string(),
                        span: start..self.pos,
                    })
                }
                None => Err(self.error("unterminated data literal")),
            },
            _ => {
                let bytes = self.src.as_bytes();
                while self.pos < bytes.len() && is_bare(bytes[self.pos]) {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.error("expected a value"));
                }
                Ok(Scalar {
                    value: self.src[start..self.pos].to_string(),
                    span: start..self.pos,
                })
            }
        }
    }

    fn quoted(&mut self) -> Result<Scalar, SyntaxError> {
        let start = self.pos;
        let mut value = String::new();
        let mut chars = self.src[start + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos = start + 1 + i + 1;
                    return Ok(Scalar {
                        value,
                        span: start..self.pos,
                    });
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                other => value.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }
}

pub(crate) fn line_of(src: &str, pos: usize) -> usize {
    src[..pos.min(src.len())].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Render `value` the way Xcode does: bare when every byte is a safe
/// identifier byte, otherwise quoted and escaped.
pub fn quote(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b':' | b'.'));
    if bare {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
