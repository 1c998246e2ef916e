//! Blank separator lines between rendered LaTeX constructs.
//!
//! Paragraph-level lines get a blank line after them. Nothing is inserted
//! inside lists, tables or code, after a block environment's `\begin{...}`
//! line, or before its `\end{...}` line. Runs of blank lines collapse to one.
//!
//! Inline environments such as `\begin{hcH}` around inline code are ordinary
//! paragraph text here.

const CODE_BEGIN: &str = r"\begin{code}";
const CODE_END: &str = r"\end{code}";
const NESTING_ENVS: [&str; 3] = ["itemize", "enumerate", "tabularx"];
/// Environments that stand on their own lines.
const BLOCK_ENVS: [&str; 5] = ["code", "itemize", "enumerate", "tabularx", "bgbox"];

fn opens_block_env(line: &str) -> bool {
    BLOCK_ENVS
        .iter()
        .any(|env| line.starts_with(&format!(r"\begin{{{env}}}")))
}

fn closes_block_env(line: &str) -> bool {
    BLOCK_ENVS
        .iter()
        .any(|env| line.starts_with(&format!(r"\end{{{env}}}")))
}

fn opens_nesting_env(line: &str) -> bool {
    NESTING_ENVS
        .iter()
        .any(|env| line.starts_with(&format!(r"\begin{{{env}}}")))
}

fn closes_nesting_env(line: &str) -> bool {
    NESTING_ENVS
        .iter()
        .any(|env| line.starts_with(&format!(r"\end{{{env}}}")))
}

/// Inserts blank separator lines into rendered LaTeX lines.
pub fn apply_spacing<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len() * 2);
    let mut nesting = 0usize;
    let mut in_code = false;

    for (j, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let trimmed = line.trim();

        if in_code && !trimmed.starts_with(CODE_END) {
            out.push(line.to_string());
            continue;
        }

        if trimmed.is_empty() {
            if out.last().is_some_and(|last| !last.trim().is_empty()) {
                out.push(String::new());
            }
            continue;
        }

        out.push(line.to_string());

        if trimmed.starts_with(CODE_BEGIN) {
            in_code = true;
            continue;
        }
        if trimmed.starts_with(CODE_END) {
            in_code = false;
        }

        if opens_block_env(trimmed) {
            if opens_nesting_env(trimmed) {
                nesting += 1;
            }
            continue;
        }
        if closes_nesting_env(trimmed) {
            nesting = nesting.saturating_sub(1);
        }
        if nesting > 0 {
            continue;
        }

        let needs_gap = lines.get(j + 1).is_some_and(|next| {
            let next = next.as_ref().trim();
            !next.is_empty() && !closes_block_env(next)
        });
        if needs_gap {
            out.push(String::new());
        }
    }

    out
}
