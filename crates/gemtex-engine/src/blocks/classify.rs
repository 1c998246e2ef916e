use std::sync::OnceLock;

use regex::Regex;

use super::types::{Align, ListKind};

fn code_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*CBLOCK([0-9]+)CBLOCK\s*$").expect("valid regex"))
}

fn unordered_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)[*-]\s+(.*)$").expect("valid regex"))
}

fn ordered_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)[0-9]+\.\s+(.*)$").expect("valid regex"))
}

fn rule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?:\*\s*){3,}|(?:-\s*){3,}|(?:_\s*){3,})$").expect("valid regex")
    })
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(#{1,6})\s+(.*)$").expect("valid regex"))
}

fn table_row_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\|(.*)\|\s*$").expect("valid regex"))
}

fn alignment_row_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\|([-:\s|]+)\|\s*$").expect("valid regex"))
}

fn setext_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(-{3,}|={3,})\s*$").expect("valid regex"))
}

/// A list item marker and the text after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarker<'a> {
    pub kind: ListKind,
    pub content: &'a str,
}

/// Classification of a single line containing only local facts.
///
/// Lookahead decisions (setext headings, table openings) are made by the
/// builder, which sees the next line's class as well.
#[derive(Debug, Clone)]
pub struct LineClass<'a> {
    pub text: &'a str,
    /// Width of the leading whitespace in bytes.
    pub indent: usize,
    pub is_blank: bool,
    /// Index of the code block when the line is only a placeholder.
    pub code: Option<usize>,
    /// Never set for lines that are horizontal rules.
    pub list: Option<ListMarker<'a>>,
    pub is_rule: bool,
    pub heading: Option<(u8, &'a str)>,
    /// Trimmed cells of a `| a | b |` row.
    pub table_cells: Option<Vec<&'a str>>,
    /// Set when the line is a `|:--|--:|` alignment row.
    pub alignment: Option<Vec<Align>>,
    /// Heading level this line would give the line above it.
    pub setext_level: Option<u8>,
}

/// Classifies individual lines for block structuring.
pub struct LineClassifier;

impl LineClassifier {
    pub fn classify<'a>(&self, text: &'a str) -> LineClass<'a> {
        let indent = text.len() - text.trim_start().len();
        let is_blank = text.trim().is_empty();
        let is_rule = rule_regex().is_match(text);

        let code = code_line_regex()
            .captures(text)
            .and_then(|c| c[1].parse().ok());

        let list = if is_rule {
            None
        } else if let Some(c) = unordered_regex().captures(text) {
            c.get(2).map(|m| ListMarker {
                kind: ListKind::Unordered,
                content: m.as_str(),
            })
        } else {
            ordered_regex().captures(text).and_then(|c| {
                c.get(2).map(|m| ListMarker {
                    kind: ListKind::Ordered,
                    content: m.as_str(),
                })
            })
        };

        let heading = heading_regex().captures(text).and_then(|c| {
            let level = c.get(1)?.as_str().len() as u8;
            Some((level, c.get(2)?.as_str()))
        });

        let table_cells = table_row_regex()
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|inner| inner.as_str().split('|').map(str::trim).collect());

        let alignment = alignment_row_regex()
            .captures(text)
            .and_then(|c| c.get(1))
            .filter(|inner| inner.as_str().contains('-'))
            .map(|inner| inner.as_str().split('|').map(Align::from_marker).collect());

        let setext_level = setext_regex().captures(text).map(|c| {
            if c[1].starts_with('=') { 1 } else { 2 }
        });

        LineClass {
            text,
            indent,
            is_blank,
            code,
            list,
            is_rule,
            heading,
            table_cells,
            alignment,
            setext_level,
        }
    }
}
