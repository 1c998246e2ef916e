//! # Prompt Preview
//!
//! Renders a user's own prompt as a tree of typed nodes with sanitized inline
//! HTML, using the same span extraction and block structuring as the export.
//!
//! Unlike the export, horizontal rules become visible [`RenderNode::HorizontalRule`]s
//! and blank lines become empty paragraphs, since every source line is shown
//! as its own line. A code fence still open at the end of the prompt is shown
//! as a code block.

pub mod html;

use serde::Serialize;

use crate::{
    blocks::{Align, Block, ListKind, structure},
    inline::{Html, format_inline},
    spans::{ProtectedSpan, SpanKind, SpanTable, UnclosedFence},
};

pub use html::to_html;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderNode {
    Header {
        level: u8,
        html: String,
    },
    List {
        kind: ListKind,
        items: Vec<ListItemNode>,
    },
    CodeBlock {
        /// Display label.
        lang: String,
        shorthand: String,
        lines: Vec<String>,
    },
    Paragraph {
        html: String,
    },
    HorizontalRule,
    Table {
        aligns: Vec<Align>,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListItemNode {
    pub html: String,
    /// Nested lists and code blocks inside the item.
    pub children: Vec<RenderNode>,
}

/// Replaces span placeholders in formatted HTML.
pub fn restore_html(text: &str, spans: &SpanTable) -> String {
    spans.restore(text, |span| match span {
        ProtectedSpan::InlineCode(code) => format!(
            r#"<code class="gemini-prompt-inline-code">{}</code>"#,
            html_escape::encode_text(code)
        ),
        ProtectedSpan::Math(src) => html_escape::encode_text(&format!("${src}$")).into_owned(),
        ProtectedSpan::Code(block) => format!(
            r#"<code class="gemini-prompt-inline-code">{}</code>"#,
            html_escape::encode_text(&block.code)
        ),
    })
}

fn inline_html(text: &str, spans: &SpanTable) -> String {
    restore_html(&format_inline::<Html>(text), spans)
}

#[derive(Default)]
struct TableBuilder {
    aligns: Vec<Align>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Folds the block stream into nodes, nesting lists under their parent item.
#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<RenderNode>,
    lists: Vec<(ListKind, Vec<ListItemNode>)>,
    table: Option<TableBuilder>,
}

impl TreeBuilder {
    /// The item that content inside the innermost list attaches to.
    fn current_item(&mut self) -> Option<&mut ListItemNode> {
        let (_, items) = self.lists.last_mut()?;
        if items.is_empty() {
            items.push(ListItemNode::default());
        }
        items.last_mut()
    }

    fn emit(&mut self, node: RenderNode) {
        match self.current_item() {
            Some(item) => item.children.push(node),
            None => self.nodes.push(node),
        }
    }

    fn push(&mut self, block: &Block, spans: &SpanTable) {
        match block {
            Block::Heading { level, text, .. } => self.emit(RenderNode::Header {
                level: *level,
                html: inline_html(text, spans),
            }),
            Block::ListStart(kind) => self.lists.push((*kind, vec![])),
            Block::ListEnd(_) => {
                if let Some((kind, items)) = self.lists.pop() {
                    self.emit(RenderNode::List { kind, items });
                }
            }
            Block::Item { text, .. } => {
                let html = inline_html(text, spans);
                match self.lists.last_mut() {
                    Some((_, items)) => items.push(ListItemNode {
                        html,
                        children: vec![],
                    }),
                    None => self.emit(RenderNode::Paragraph { html }),
                }
            }
            Block::Continuation(text) => {
                let html = inline_html(text, spans);
                match self.current_item() {
                    Some(item) if item.html.is_empty() => item.html = html,
                    Some(item) => {
                        item.html.push_str("<br>");
                        item.html.push_str(&html);
                    }
                    None => self.emit(RenderNode::Paragraph { html }),
                }
            }
            Block::TableStart(aligns) => {
                self.table = Some(TableBuilder {
                    aligns: aligns.clone(),
                    ..TableBuilder::default()
                })
            }
            Block::TableHeader(cells) => {
                if let Some(table) = &mut self.table {
                    table.header = cells.iter().map(|c| inline_html(c, spans)).collect();
                }
            }
            Block::TableRow(cells) => {
                if let Some(table) = &mut self.table {
                    table
                        .rows
                        .push(cells.iter().map(|c| inline_html(c, spans)).collect());
                }
            }
            Block::TableEnd => {
                if let Some(table) = self.table.take() {
                    self.emit(RenderNode::Table {
                        aligns: table.aligns,
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            Block::Rule => self.emit(RenderNode::HorizontalRule),
            Block::Code { index } => match spans.get(SpanKind::CodeBlock, *index) {
                Some(ProtectedSpan::Code(code)) => self.emit(RenderNode::CodeBlock {
                    lang: code.label.clone(),
                    shorthand: code.shorthand.clone(),
                    lines: code.code.split('\n').map(str::to_string).collect(),
                }),
                _ => {
                    log::warn!("No code block for index {index}");
                    self.emit(RenderNode::Paragraph {
                        html: SpanKind::CodeBlock.placeholder(*index),
                    });
                }
            },
            Block::Paragraph(text) => self.emit(RenderNode::Paragraph {
                html: inline_html(text, spans),
            }),
            Block::Blank => self.emit(RenderNode::Paragraph {
                html: String::new(),
            }),
        }
    }

    fn finish(self) -> Vec<RenderNode> {
        self.nodes
    }
}

/// Renders the lines of one prompt as a node tree.
pub fn convert_inline<S: AsRef<str>>(lines: &[S]) -> Vec<RenderNode> {
    let text = lines
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<&str>>()
        .join("\n");

    let mut spans = SpanTable::new();
    let text = spans.extract_with(&text, UnclosedFence::CloseAtEnd);
    let lines: Vec<&str> = text.split('\n').collect();

    let mut tree = TreeBuilder::default();
    for block in structure(&lines) {
        tree.push(&block, &spans);
    }
    tree.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(html: &str) -> RenderNode {
        RenderNode::Paragraph {
            html: html.to_string(),
        }
    }

    fn item(html: &str, children: Vec<RenderNode>) -> ListItemNode {
        ListItemNode {
            html: html.to_string(),
            children,
        }
    }

    #[test]
    fn headers_and_paragraphs() {
        assert_eq!(
            convert_inline(&["## Plan", "do **this** & <that>"]),
            vec![
                RenderNode::Header {
                    level: 2,
                    html: "Plan".into()
                },
                paragraph("do <strong>this</strong> &amp; &lt;that&gt;"),
            ]
        );
    }

    #[test]
    fn blank_lines_and_rules_are_visible() {
        assert_eq!(
            convert_inline(&["a", "", "***", "b"]),
            vec![
                paragraph("a"),
                paragraph(""),
                RenderNode::HorizontalRule,
                paragraph("b"),
            ]
        );
    }

    #[test]
    fn nested_lists_attach_to_parent_item() {
        assert_eq!(
            convert_inline(&["- a", "  1. b", "     more", "- c"]),
            vec![RenderNode::List {
                kind: ListKind::Unordered,
                items: vec![
                    item(
                        "a",
                        vec![RenderNode::List {
                            kind: ListKind::Ordered,
                            items: vec![item("b<br>more", vec![])],
                        }]
                    ),
                    item("c", vec![]),
                ],
            }]
        );
    }

    #[test]
    fn code_blocks_keep_lines() {
        assert_eq!(
            convert_inline(&["```Rust", "fn main() {", "    <x>", "}", "```"]),
            vec![RenderNode::CodeBlock {
                lang: "Rust".into(),
                shorthand: "rust".into(),
                lines: vec!["fn main() {".into(), "    <x>".into(), "}".into()],
            }]
        );
    }

    #[test]
    fn unterminated_fence_becomes_code_block() {
        assert_eq!(
            convert_inline(&["Try:", "```python", "print(1)"]),
            vec![
                paragraph("Try:"),
                RenderNode::CodeBlock {
                    lang: "python".into(),
                    shorthand: "python".into(),
                    lines: vec!["print(1)".into()],
                },
            ]
        );
    }

    #[test]
    fn inline_code_is_escaped() {
        assert_eq!(
            convert_inline(&["run `<b>*x*</b>`"]),
            vec![paragraph(
                r#"run <code class="gemini-prompt-inline-code">&lt;b&gt;*x*&lt;/b&gt;</code>"#
            )]
        );
    }

    #[test]
    fn tables() {
        assert_eq!(
            convert_inline(&["| a | b |", "|---|:-:|", "| *1* | 2 |"]),
            vec![RenderNode::Table {
                aligns: vec![Align::Left, Align::Center],
                header: vec!["a".into(), "b".into()],
                rows: vec![vec!["<em>1</em>".into(), "2".into()]],
            }]
        );
    }

    #[test]
    fn serializes_with_type_tags() {
        let json = serde_json::to_string(&convert_inline(&["---"])).unwrap();
        assert_eq!(json, r#"[{"type":"horizontal_rule"}]"#);
    }
}
