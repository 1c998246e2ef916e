use serde::Serialize;

/// Whether a list is numbered or bulleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Reads one cell of an alignment row such as `:--`, `:-:` or `--:`.
    pub fn from_marker(marker: &str) -> Self {
        let marker = marker.trim();
        match (marker.starts_with(':'), marker.ends_with(':')) {
            (true, true) if marker.len() > 1 => Align::Center,
            (false, true) => Align::Right,
            _ => Align::Left,
        }
    }
}

/// One structural element of a region, in document order.
///
/// Text payloads still carry placeholders and raw inline markup; the
/// renderers run the inline formatter over them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        /// 1 to 6.
        level: u8,
        text: String,
        /// Underlined with `===` or `---` rather than `#`-prefixed.
        setext: bool,
    },
    ListStart(ListKind),
    ListEnd(ListKind),
    Item {
        kind: ListKind,
        text: String,
    },
    /// A more-indented line that continues the current list item.
    Continuation(String),
    TableStart(Vec<Align>),
    TableHeader(Vec<String>),
    TableRow(Vec<String>),
    TableEnd,
    Rule,
    /// A code block placeholder on its own line.
    Code {
        index: usize,
    },
    Paragraph(String),
    Blank,
}
