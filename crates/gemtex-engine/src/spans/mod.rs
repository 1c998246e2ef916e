//! # Protected Spans
//!
//! Pulls code fences, inline code, and inline math out of dialect text before any
//! structural or formatting pass runs, leaving numbered placeholder tokens behind.
//!
//! ## Modules
//!
//! - **`fence`**: `CodeFence` line detection, `CodeMeta` JSON headers, dedenting
//! - **`cursor`**: byte `Cursor` used to scan inline code spans
//!
//! ## Placeholders
//!
//! A placeholder is `<SENTINEL><index><SENTINEL>`, e.g. `CBLOCK7CBLOCK`. Sentinels
//! are plain capital letters so that no later pass (emphasis, escaping,
//! typography, HTML escaping) can match inside them, and the index digits are
//! always bounded by letters.

pub mod cursor;
pub mod fence;

use std::sync::OnceLock;

use regex::{Captures, Regex};

pub use cursor::Cursor;
pub use fence::{CodeFence, CodeMeta, FenceOpen};

/// A fenced code block lifted out of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Lexer name handed to the code environment (`python`, `text`, ...).
    pub shorthand: String,
    /// Human readable label shown above the block (`Python`, `Code`, ...).
    pub label: String,
    /// Dedented literal body.
    pub code: String,
}

/// A borrowed view of one entry in a [`SpanTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedSpan<'a> {
    Code(&'a CodeBlock),
    InlineCode(&'a str),
    Math(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    CodeBlock,
    InlineCode,
    Math,
}

impl SpanKind {
    pub const fn sentinel(self) -> &'static str {
        match self {
            SpanKind::CodeBlock => "CBLOCK",
            SpanKind::InlineCode => "ICODE",
            SpanKind::Math => "MATHPH",
        }
    }

    pub fn placeholder(self, index: usize) -> String {
        format!("{0}{index}{0}", self.sentinel())
    }

    /// Matches any placeholder of this kind, capturing the index.
    pub fn regex(self) -> &'static Regex {
        static CODE_BLOCK: OnceLock<Regex> = OnceLock::new();
        static INLINE_CODE: OnceLock<Regex> = OnceLock::new();
        static MATH: OnceLock<Regex> = OnceLock::new();
        let cell = match self {
            SpanKind::CodeBlock => &CODE_BLOCK,
            SpanKind::InlineCode => &INLINE_CODE,
            SpanKind::Math => &MATH,
        };
        cell.get_or_init(|| {
            Regex::new(&format!("{0}([0-9]+){0}", self.sentinel()))
                .expect("placeholder pattern is valid")
        })
    }
}

fn math_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"IMATH(.*?)IMATH").expect("math pattern is valid"))
}

/// Backslash escapes the HTML-to-Markdown step adds that carry no meaning here.
const ESCAPED_LITERALS: [char; 5] = ['`', '*', '_', '-', '.'];

/// Turns `` \` ``, `\*`, `\_`, `\-` and `\.` back into the bare characters.
pub fn unescape_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPED_LITERALS.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// What happens to a code fence that never closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnclosedFence {
    /// The opener and everything after it stay literal text.
    #[default]
    Literal,
    /// The block runs to the end of the input.
    CloseAtEnd,
}

/// Side table of protected spans, addressed by placeholder index.
///
/// One table is created per chunk (or per preview) and may be fed several
/// texts, e.g. the prompt and the answer of one chunk.
#[derive(Debug, Default, Clone)]
pub struct SpanTable {
    code_blocks: Vec<CodeBlock>,
    inline_code: Vec<String>,
    math: Vec<String>,
}

impl SpanTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every protected span in `text` with a placeholder.
    ///
    /// Order: NBSP normalization, literal unescaping, internal and standard
    /// code fences, inline math, inline code.
    pub fn extract(&mut self, text: &str) -> String {
        self.extract_with(text, UnclosedFence::Literal)
    }

    pub fn extract_with(&mut self, text: &str, unclosed: UnclosedFence) -> String {
        let text = text.replace('\u{00A0}', " ");
        let text = unescape_literals(&text);
        let text = self.extract_fences(&text, unclosed);
        let text = self.extract_math(&text);
        self.extract_inline_code(&text)
    }

    pub fn get(&self, kind: SpanKind, index: usize) -> Option<ProtectedSpan<'_>> {
        match kind {
            SpanKind::CodeBlock => self.code_blocks.get(index).map(ProtectedSpan::Code),
            SpanKind::InlineCode => self
                .inline_code
                .get(index)
                .map(|s| ProtectedSpan::InlineCode(s)),
            SpanKind::Math => self.math.get(index).map(|s| ProtectedSpan::Math(s)),
        }
    }

    pub fn code_blocks(&self) -> &[CodeBlock] {
        &self.code_blocks
    }

    pub fn inline_code(&self) -> &[String] {
        &self.inline_code
    }

    pub fn math(&self) -> &[String] {
        &self.math
    }

    /// Replaces placeholders with `render`'s output: math first, then inline
    /// code, then stray code block placeholders. Unknown indices stay verbatim.
    pub fn restore(
        &self,
        text: &str,
        mut render: impl FnMut(ProtectedSpan<'_>) -> String,
    ) -> String {
        let mut text = text.to_string();
        for kind in [SpanKind::Math, SpanKind::InlineCode, SpanKind::CodeBlock] {
            text = kind
                .regex()
                .replace_all(&text, |caps: &Captures| {
                    let span = caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| self.get(kind, index));
                    match span {
                        Some(span) => render(span),
                        None => {
                            log::warn!("No {kind:?} entry for placeholder {}", &caps[0]);
                            caps[0].to_string()
                        }
                    }
                })
                .into_owned();
        }
        text
    }

    fn push_code_block(&mut self, meta: CodeMeta, code: String) -> String {
        self.code_blocks.push(CodeBlock {
            shorthand: meta.shorthand,
            label: meta.label,
            code,
        });
        SpanKind::CodeBlock.placeholder(self.code_blocks.len() - 1)
    }

    fn extract_fences(&mut self, text: &str, unclosed: UnclosedFence) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let Some(open) = CodeFence::open(line) else {
                out.push(line.to_string());
                i += 1;
                continue;
            };
            let close = match (i + 1..lines.len()).find(|&j| CodeFence::closes(lines[j])) {
                Some(close) => close,
                None if unclosed == UnclosedFence::CloseAtEnd => lines.len(),
                None => {
                    out.push(line.to_string());
                    i += 1;
                    continue;
                }
            };

            let body = &lines[i + 1..close];
            let replacement = if open.is_internal() {
                match body.split_first() {
                    Some((meta_line, rest)) => match CodeMeta::parse(meta_line) {
                        Ok(meta) => self.push_code_block(meta, fence::dedent(rest, open.indent)),
                        Err(e) => {
                            log::warn!("Unreadable code block metadata {meta_line:?}: {e}");
                            CodeFence::PARSE_ERROR_MARKER.to_string()
                        }
                    },
                    None => {
                        log::warn!("Code block without metadata line");
                        CodeFence::PARSE_ERROR_MARKER.to_string()
                    }
                }
            } else {
                let code = fence::dedent(body, open.indent);
                self.push_code_block(CodeMeta::from_info(open.info), code)
            };

            out.push(format!("{}{replacement}", open.indent));
            i = close + 1;
        }

        out.join("\n")
    }

    fn extract_math(&mut self, text: &str) -> String {
        let math = &mut self.math;
        math_regex()
            .replace_all(text, |caps: &Captures| {
                math.push(caps[1].to_string());
                SpanKind::Math.placeholder(math.len() - 1)
            })
            .into_owned()
    }

    /// Single-backtick spans on one line, not touching another backtick.
    fn extract_inline_code(&mut self, text: &str) -> String {
        const TICK: u8 = b'`';

        let mut out = String::with_capacity(text.len());
        let mut cur = Cursor::new(text);
        let mut copied = 0;

        while !cur.eof() {
            if cur.peek() != Some(TICK) || cur.peek_back() == Some(TICK) {
                cur.bump();
                continue;
            }

            let start = cur.pos();
            let mut probe = cur.clone();
            probe.bump(); // opening `
            probe.bump_until(|b| b == TICK || b == b'\n');
            let end = probe.pos();
            let closed = probe.peek() == Some(TICK) && end > start + 1;
            probe.bump(); // closing `

            if !closed || probe.peek() == Some(TICK) {
                cur.bump();
                continue;
            }

            out.push_str(&text[copied..start]);
            self.inline_code.push(text[start + 1..end].to_string());
            out.push_str(&SpanKind::InlineCode.placeholder(self.inline_code.len() - 1));
            copied = probe.pos();
            cur = probe;
        }

        out.push_str(&text[copied..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unescapes_known_literals_only() {
        assert_eq!(unescape_literals(r"\* \_ \- \. \` \& \\"), r"* _ - . ` \& \\");
    }

    #[test]
    fn extracts_standard_fence() {
        let mut table = SpanTable::new();
        let out = table.extract("before\n```Python\nprint(1)\n\n```\nafter");
        assert_eq!(out, "before\nCBLOCK0CBLOCK\nafter");
        assert_eq!(
            table.code_blocks(),
            &[CodeBlock {
                shorthand: "python".into(),
                label: "Python".into(),
                code: "print(1)".into(),
            }]
        );
    }

    #[test]
    fn extracts_internal_fence_and_dedents() {
        let mut table = SpanTable::new();
        let text = "  ```gemini-internal-code\n  {\"shorthand\":\"css\",\"label\":\"CSS\"}\n  a {\n    color: red;\n  }\n  ```";
        let out = table.extract(text);
        assert_eq!(out, "  CBLOCK0CBLOCK");
        assert_eq!(table.code_blocks()[0].code, "a {\n  color: red;\n}");
        assert_eq!(table.code_blocks()[0].label, "CSS");
    }

    #[test]
    fn broken_metadata_becomes_marker() {
        let mut table = SpanTable::new();
        let out = table.extract("```gemini-internal-code\n{broken\nx = 1\n```\nnext");
        assert_eq!(out, "[Code block parsing error]\nnext");
        assert!(table.code_blocks().is_empty());
    }

    #[test]
    fn unterminated_fence_stays_literal() {
        let mut table = SpanTable::new();
        let out = table.extract("```rust\nfn main() {}");
        assert_eq!(out, "```rust\nfn main() {}");
        assert!(table.code_blocks().is_empty());
    }

    #[test]
    fn unterminated_fence_can_run_to_end() {
        let mut table = SpanTable::new();
        let text = "intro\n```rust\nfn main() {}\n";
        let out = table.extract_with(text, UnclosedFence::CloseAtEnd);
        assert_eq!(out, "intro\nCBLOCK0CBLOCK");
        assert_eq!(table.code_blocks()[0].code, "fn main() {}");
        assert_eq!(table.code_blocks()[0].shorthand, "rust");
    }

    #[test]
    fn extracts_math_before_inline_code() {
        let mut table = SpanTable::new();
        let out = table.extract("Let IMATHa_`b`IMATH and `x_y` hold");
        assert_eq!(out, "Let MATHPH0MATHPH and ICODE0ICODE hold");
        assert_eq!(table.math(), &["a_`b`".to_string()]);
        assert_eq!(table.inline_code(), &["x_y".to_string()]);
    }

    #[test]
    fn inline_code_ignores_double_backticks_and_newlines() {
        let mut table = SpanTable::new();
        let out = table.extract("``not`` and `open\nclose`");
        assert_eq!(out, "``not`` and `open\nclose`");
        assert!(table.inline_code().is_empty());
    }

    #[test]
    fn shared_table_keeps_counting() {
        let mut table = SpanTable::new();
        let a = table.extract("`one`");
        let b = table.extract("`two`");
        assert_eq!(a, "ICODE0ICODE");
        assert_eq!(b, "ICODE1ICODE");
    }

    #[test]
    fn nbsp_becomes_space() {
        let mut table = SpanTable::new();
        assert_eq!(table.extract("a\u{00A0}b"), "a b");
    }

    #[test]
    fn restore_leaves_unknown_placeholders() {
        let mut table = SpanTable::new();
        let text = table.extract("`x` ICODE9ICODE");
        let restored = table.restore(&text, |span| match span {
            ProtectedSpan::InlineCode(code) => format!("<{code}>"),
            _ => String::new(),
        });
        assert_eq!(restored, "<x> ICODE9ICODE");
    }
}
