//! LaTeX rendering of structured blocks.
//!
//! Each text fragment is formatted with [`format_inline`] and then has its
//! span placeholders restored, so code never passes through the formatter.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    blocks::{Align, Block, ListKind},
    inline::{Latex, escape_latex, format_inline},
    spans::{CodeBlock, ProtectedSpan, SpanKind, SpanTable},
};

/// Delimiters tried for `\mintinline` when the code contains braces.
const INLINE_DELIMITERS: [char; 8] = ['|', '!', '+', '@', '=', '/', ';', '"'];

/// Inserted between inline code and an adjacent bracket.
const STICKY: &str = r"\penalty10000 ";

fn enumeration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([\d\.]+|[a-zA-Z]\)|[IVXLCDM]+\.|[ivxlcdm]+\.)\s+").expect("valid regex")
    })
}

fn sticky_regexes() -> &'static (Regex, Regex) {
    static RE: OnceLock<(Regex, Regex)> = OnceLock::new();
    RE.get_or_init(|| {
        (
            Regex::new(r"([(\[]|\\\{)(ICODE[0-9]+ICODE)").expect("valid regex"),
            Regex::new(r"(ICODE[0-9]+ICODE)([)\]]|\\\})").expect("valid regex"),
        )
    })
}

/// Sectioning command for a heading. Setext headings are always sections.
pub fn heading_command(level: u8, setext: bool) -> &'static str {
    if setext {
        return "section";
    }
    match level {
        0 | 1 => "chapter",
        2 => "section",
        3 => "subsection",
        4 => "subsubsection",
        5 => "paragraph",
        _ => "subparagraph",
    }
}

fn list_env(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Unordered => "itemize",
        ListKind::Ordered => "enumerate",
    }
}

fn column_spec(align: Align) -> &'static str {
    match align {
        Align::Left => r">{\raggedright\arraybackslash}X",
        Align::Center => r">{\centering\arraybackslash}X",
        Align::Right => r">{\raggedleft\arraybackslash}X",
    }
}

/// `\begin{hcH}\mintinline{text}{...}\end{hcH}`, switching to a delimiter
/// absent from `code` when it contains braces.
pub fn inline_code(code: &str) -> String {
    let body = if code.contains(['{', '}']) {
        match INLINE_DELIMITERS.iter().find(|d| !code.contains(**d)) {
            Some(d) => format!("{d}{code}{d}"),
            None => {
                log::warn!("No free \\mintinline delimiter for {code:?}");
                format!("{{{code}}}")
            }
        }
    } else {
        format!("{{{code}}}")
    };
    format!(r"\begin{{hcH}}\mintinline{{text}}{body}\end{{hcH}}")
}

/// The code environment with its surrounding vertical space.
pub fn code_environment(block: &CodeBlock) -> Vec<String> {
    let mut lines = vec![
        r"\vspace{.25\baselineskip}".to_string(),
        format!(
            r"\begin{{code}}{{{}}}{{{}}}",
            block.shorthand,
            escape_latex(&block.label)
        ),
    ];
    lines.extend(block.code.split('\n').map(str::to_string));
    lines.push(r"\end{code}".to_string());
    lines.push(r"\vspace{.5\baselineskip}".to_string());
    lines
}

/// Replaces span placeholders in formatted text with their LaTeX form.
pub fn restore_latex(text: &str, spans: &SpanTable) -> String {
    let (before, after) = sticky_regexes();
    let text = before.replace_all(text, format!("${{1}}{STICKY}${{2}}"));
    let text = after.replace_all(&text, format!("${{1}}{STICKY}${{2}}"));
    spans.restore(&text, |span| match span {
        ProtectedSpan::Math(src) => format!("${src}$"),
        ProtectedSpan::InlineCode(code) => inline_code(code),
        ProtectedSpan::Code(block) => format!("\n{}\n", code_environment(block).join("\n")),
    })
}

/// Formats a text fragment and restores its spans.
fn inline(text: &str, spans: &SpanTable) -> String {
    restore_latex(&format_inline::<Latex>(text), spans)
}

fn heading_title(text: &str, spans: &SpanTable) -> String {
    let formatted = format_inline::<Latex>(text);
    let formatted = enumeration_regex().replace(&formatted, r"${1}\hs ");
    restore_latex(&formatted, spans)
}

fn table_row(cells: &[String], spans: &SpanTable) -> String {
    let cells: Vec<String> = cells.iter().map(|cell| inline(cell, spans)).collect();
    format!(r"{} \\", cells.join(" & "))
}

/// Renders blocks to LaTeX lines, before spacing.
pub fn render_blocks(blocks: &[Block], spans: &SpanTable) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(blocks.len());
    let mut emit = |s: String| out.extend(s.split('\n').map(str::to_string));

    for block in blocks {
        match block {
            Block::Heading {
                level,
                text,
                setext,
            } => emit(format!(
                r"\{}[nonumber=true]{{{}}}",
                heading_command(*level, *setext),
                heading_title(text, spans)
            )),
            Block::ListStart(kind) => emit(format!(r"\begin{{{}}}", list_env(*kind))),
            Block::ListEnd(kind) => emit(format!(r"\end{{{}}}", list_env(*kind))),
            Block::Item { text, .. } => emit(format!(r"  \item {}", inline(text, spans))),
            Block::Continuation(text) | Block::Paragraph(text) => emit(inline(text, spans)),
            Block::TableStart(aligns) => {
                let cols: Vec<&str> = aligns.iter().map(|a| column_spec(*a)).collect();
                emit(format!(
                    r"\begin{{tabularx}}{{\textwidth}}{{ {} }}",
                    cols.join(" | ")
                ));
            }
            Block::TableHeader(cells) => {
                emit(r"\hline".to_string());
                emit(table_row(cells, spans));
                emit(r"\hline".to_string());
            }
            Block::TableRow(cells) => emit(table_row(cells, spans)),
            Block::TableEnd => {
                emit(r"\hline".to_string());
                emit(r"\end{tabularx}".to_string());
                emit(r"\addvspace{\baselineskip}".to_string());
            }
            Block::Rule => {}
            Block::Code { index } => match spans.get(SpanKind::CodeBlock, *index) {
                Some(ProtectedSpan::Code(code)) => {
                    code_environment(code).into_iter().for_each(&mut emit)
                }
                _ => {
                    log::warn!("No code block for index {index}");
                    emit(SpanKind::CodeBlock.placeholder(*index));
                }
            },
            Block::Blank => emit(String::new()),
        }
    }

    out
}
