use std::sync::OnceLock;

use regex::Regex;

use super::ExportOptions;
use crate::{
    blocks::structure,
    latex::render_blocks,
    spacing::apply_spacing,
    spans::{CodeFence, SpanTable},
};

fn blank_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Collapses runs of three or more newlines to a single blank line.
pub fn collapse_blank_runs(text: &str) -> String {
    blank_run_regex().replace_all(text, "\n\n").into_owned()
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3 && line.bytes().all(|b| b == b'=')
}

/// One prompt and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `None` when the source had no separator line.
    pub prompt: Option<String>,
    pub answer: String,
}

impl Chunk {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            answer: answer.into(),
        }
    }

    /// Splits on the first line of three or more `=` that is not inside a
    /// code fence. Without one the whole text is the answer.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut i = 0;
        while i < lines.len() {
            if CodeFence::open(lines[i]).is_some() {
                if let Some(close) = (i + 1..lines.len()).find(|&j| CodeFence::closes(lines[j])) {
                    i = close + 1;
                    continue;
                }
            }
            if i > 0 && is_separator(lines[i]) {
                return Self {
                    prompt: Some(lines[..i].join("\n")),
                    answer: lines[i + 1..].join("\n"),
                };
            }
            i += 1;
        }
        Self {
            prompt: None,
            answer: text.to_string(),
        }
    }

    pub fn to_latex(&self, options: &ExportOptions) -> String {
        convert_regions(self.prompt.as_deref(), &self.answer, options)
    }
}

/// Placeholder-bearing region text to spaced LaTeX lines.
fn render_region(text: &str, spans: &SpanTable) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let blocks = structure(&lines);
    apply_spacing(&render_blocks(&blocks, spans)).join("\n")
}

fn convert_regions(prompt: Option<&str>, answer: &str, options: &ExportOptions) -> String {
    let mut spans = SpanTable::new();
    let prompt = prompt.map(|p| spans.extract(p).trim().to_string());
    let answer = spans.extract(answer);

    let mut out = String::new();
    if let Some(prompt) = prompt {
        out.push_str(&format!(
            "\\addvspace{{3\\baselineskip}}\n\n\
             \\begin{{bgbox}}\n{}\n\\end{{bgbox}}\n\n\
             \\addvspace{{\\baselineskip}}\n\n\
             \\relpospar[scale=0.95][-1.05cm,-.3cm]{{{}}}\n",
            render_region(&prompt, &spans),
            options.prompt_label
        ));
    }
    out.push_str(&render_region(&answer, &spans));
    collapse_blank_runs(&out)
}

/// Converts one prompt and its answer to LaTeX with the default options.
pub fn convert_chunk(prompt: &str, answer: &str) -> String {
    convert_chunk_with(prompt, answer, &ExportOptions::default())
}

pub fn convert_chunk_with(prompt: &str, answer: &str, options: &ExportOptions) -> String {
    convert_regions(Some(prompt), answer, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_splits_on_first_separator() {
        let chunk = Chunk::parse("Q?\n===\nA1\n=====\nA2");
        assert_eq!(chunk.prompt.as_deref(), Some("Q?"));
        assert_eq!(chunk.answer, "A1\n=====\nA2");
    }

    #[test]
    fn parse_without_separator_is_all_answer() {
        let chunk = Chunk::parse("just an answer\n==");
        assert_eq!(chunk.prompt, None);
        assert_eq!(chunk.answer, "just an answer\n==");
    }

    #[test]
    fn parse_ignores_separators_in_fences() {
        let chunk = Chunk::parse("```\nQ\n===\n```\n====\nA");
        assert_eq!(chunk.prompt.as_deref(), Some("```\nQ\n===\n```"));
        assert_eq!(chunk.answer, "A");
    }

    #[test]
    fn prompt_region_is_boxed() {
        let latex = convert_chunk("  Hi  ", "Hello");
        assert_eq!(
            latex,
            "\\addvspace{3\\baselineskip}\n\n\
             \\begin{bgbox}\nHi\n\\end{bgbox}\n\n\
             \\addvspace{\\baselineskip}\n\n\
             \\relpospar[scale=0.95][-1.05cm,-.3cm]{gemini}\n\
             Hello"
        );
    }

    #[test]
    fn answer_only_chunk() {
        let chunk = Chunk::parse("a\n\n\n\nb");
        assert_eq!(chunk.to_latex(&ExportOptions::default()), "a\n\nb");
    }

    #[test]
    fn prompt_and_answer_share_placeholders() {
        let latex = convert_chunk("`p`", "`a`");
        assert!(latex.contains(r"\mintinline{text}{p}"));
        assert!(latex.contains(r"\mintinline{text}{a}"));
        assert!(!latex.contains("ICODE"));
    }

    #[test]
    fn collapses_newline_runs() {
        assert_eq!(collapse_blank_runs("a\n\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }
}
