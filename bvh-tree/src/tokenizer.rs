//! Line tokenizer
//!
//! BVH has no formal lexical grammar: a logical line is everything between
//! two line breaks, and fields are separated by single spaces.

/// One non-empty source line split into fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLine {
    /// 1-based line number in the source text
    pub line: usize,
    /// Space-delimited fields of the trimmed line
    pub fields: Vec<String>,
}

impl TokenLine {
    /// First field of the line
    pub fn key(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }
}

/// Split raw text into trimmed, non-empty lines of space-delimited fields
///
/// `\n`, `\r\n` and a bare `\r` each end a line and advance the line
/// number; a final line without a trailing break is still emitted. Fields
/// are split on every single space, so a run of two spaces inside a line
/// yields an empty field.
pub fn tokenize(text: &str) -> Vec<TokenLine> {
    let mut lines = Vec::new();
    let mut rest = text;
    let mut line = 1;

    loop {
        let end = rest.find(|c: char| c == '\n' || c == '\r');
        let raw = end.map_or(rest, |i| &rest[..i]);

        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            lines.push(TokenLine {
                line,
                fields: trimmed.split(' ').map(String::from).collect(),
            });
        }

        let Some(i) = end else {
            break;
        };
        let width = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[i + width..];
        line += 1;
    }

    lines
}
