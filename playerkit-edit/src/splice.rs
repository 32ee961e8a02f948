//! Byte-range splices over descriptor text.
//!
//! Adapters compute every edit against one snapshot of the text and apply
//! them together, so untouched bytes never move through a serializer.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub text: String,
}

impl Splice {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Apply splices computed against `text`.
///
/// Insertions at the same offset land in the order they were given.
pub fn apply_splices(text: &str, splices: Vec<Splice>) -> String {
    let mut indexed: Vec<(usize, Splice)> = splices.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        b.range
            .start
            .cmp(&a.range.start)
            .then_with(|| ib.cmp(ia))
    });
    let mut out = text.to_string();
    for (_, s) in indexed {
        out.replace_range(s.range, &s.text);
    }
    out
}

/// Offset of the first byte of the line containing `pos`.
pub fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Leading whitespace of the line containing `pos`.
pub fn line_indent(text: &str, pos: usize) -> &str {
    let start = line_start(text, pos);
    let line = &text[start..];
    let len = line
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &line[..len]
}

/// True if only whitespace precedes `pos` on its line.
pub fn is_line_leading(text: &str, pos: usize) -> bool {
    text[line_start(text, pos)..pos].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_offset_inserts_keep_given_order() {
        let out = apply_splices(
            "ab",
            vec![Splice::insert(1, "1"), Splice::insert(1, "2"), Splice::insert(0, ">")],
        );
        assert_eq!(out, ">a12b");
    }

    #[test]
    fn replace_and_insert_combine() {
        let out = apply_splices(
            "key = old;",
            vec![Splice::replace(6..9, "new"), Splice::insert(10, " // x")],
        );
        assert_eq!(out, "key = new; // x");
    }

    #[test]
    fn line_helpers() {
        let text = "a\n\t\tb = c;\n";
        let pos = text.find('b').unwrap();
        assert_eq!(line_start(text, pos), 2);
        assert_eq!(line_indent(text, pos), "\t\t");
        assert!(is_line_leading(text, pos));
        assert!(!is_line_leading(text, pos + 2));
    }
}
