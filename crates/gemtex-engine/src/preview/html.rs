use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{ListItemNode, RenderNode};
use crate::blocks::{Align, ListKind};

fn align_style(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

fn write_item(out: &mut String, item: &ListItemNode) {
    out.push_str("<li><p>");
    out.push_str(&item.html);
    out.push_str("</p>");
    for child in &item.children {
        write_node(out, child);
    }
    out.push_str("</li>");
}

fn write_row(out: &mut String, tag: &str, cells: &[String], aligns: &[Align]) {
    out.push_str("<tr>");
    for (cell, align) in cells.iter().zip(aligns) {
        out.push_str(&format!(
            r#"<{tag} style="text-align: {}">{cell}</{tag}>"#,
            align_style(*align)
        ));
    }
    out.push_str("</tr>");
}

fn write_node(out: &mut String, node: &RenderNode) {
    match node {
        RenderNode::Header { level, html } => out.push_str(&format!(
            r#"<h{level} class="gemini-prompt-header gemini-h{level}">{html}</h{level}>"#
        )),
        RenderNode::List { kind, items } => {
            let tag = match kind {
                ListKind::Unordered => "ul",
                ListKind::Ordered => "ol",
            };
            out.push_str(&format!(r#"<{tag} class="gemini-prompt-list">"#));
            for item in items {
                write_item(out, item);
            }
            out.push_str(&format!("</{tag}>"));
        }
        RenderNode::CodeBlock {
            lang,
            shorthand,
            lines,
        } => {
            out.push_str(r#"<div class="code-block">"#);
            out.push_str(&format!(
                r#"<div class="code-block-decoration header-formatted gds-title-s"><span>{}</span></div>"#,
                encode_text(lang)
            ));
            out.push_str(
                r#"<div class="formatted-code-block-internal-container"><div class="animated-opacity"><pre>"#,
            );
            out.push_str(&format!(
                r#"<code class="code-container formatted language-{}">{}</code>"#,
                encode_double_quoted_attribute(shorthand),
                encode_text(&lines.join("\n"))
            ));
            out.push_str("</pre></div></div></div>");
        }
        RenderNode::Paragraph { html } => {
            out.push_str(&format!(r#"<p class="query-text-line">{html}</p>"#))
        }
        RenderNode::HorizontalRule => out.push_str(r#"<hr class="gemini-prompt-hr">"#),
        RenderNode::Table {
            aligns,
            header,
            rows,
        } => {
            out.push_str(r#"<table class="gemini-prompt-table"><thead>"#);
            write_row(out, "th", header, aligns);
            out.push_str("</thead><tbody>");
            for row in rows {
                write_row(out, "td", row, aligns);
            }
            out.push_str("</tbody></table>");
        }
    }
}

/// Materializes a node tree as HTML, one top-level node per line.
pub fn to_html(nodes: &[RenderNode]) -> String {
    nodes
        .iter()
        .map(|node| {
            let mut out = String::new();
            write_node(&mut out, node);
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}
