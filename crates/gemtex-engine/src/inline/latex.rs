use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::InlineTarget;

/// Escapes that pass through [`escape_latex`] unchanged.
const PRESERVED: [&str; 12] = [
    r"\&",
    r"\%",
    r"\$",
    r"\#",
    r"\_",
    r"\{",
    r"\}",
    r"\,",
    r"\textbackslash{}",
    r"\textasciitilde{}",
    r"\textasciicircum{}",
    r"\h{}",
];

/// Commands the formatter emits, with their argument counts.
const COMMANDS: [(&str, usize); 5] = [
    ("textbf", 1),
    ("textit", 1),
    ("iconfont", 1),
    ("fromto", 2),
    ("weblink", 2),
];

const ABBREVIATIONS: [(&str, &str); 5] = [
    ("z. B.", r"z.\,B."),
    ("d. h.", r"d.\,h."),
    ("m. E.", r"m.\,E."),
    ("d. i.", r"d.\,i."),
    ("u. a.", r"u.\,a."),
];

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*[–-]\s*(\d+)").expect("valid regex"))
}

fn quote_regexes() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r#""(.*?)""#).expect("valid regex"),
            Regex::new(r"„(.*?)“").expect("valid regex"),
            Regex::new(r"“(.*?)”").expect("valid regex"),
        ]
    })
}

/// `None` when the pattern can't be compiled; emoji are then left alone.
fn emoji_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x{2600}-\x{27BF}\x{1F300}-\x{1F64F}\x{1F680}-\x{1F9FF}\x{1FA70}-\x{1FAFF}]")
            .map_err(|e| log::warn!("Emoji substitution disabled: {e}"))
            .ok()
    })
    .as_ref()
}

/// Byte offset just past the brace group opening at `s[0]`, honouring
/// backslash-escaped braces.
fn brace_group_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Hyperlink targets may only carry the escapes [`escape_url`] produces.
fn is_url_argument(arg: &str) -> bool {
    let mut chars = arg.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => return false,
            '\\' if !matches!(chars.next(), Some('%' | '#')) => return false,
            _ => {}
        }
    }
    true
}

/// Reads one of [`COMMANDS`] with balanced arguments at the start of `s`.
/// Returns the re-escaped command and the number of bytes it spans.
fn read_command(s: &str) -> Option<(String, usize)> {
    let (name, argc) = COMMANDS.iter().find(|(name, _)| {
        s.strip_prefix('\\')
            .and_then(|rest| rest.strip_prefix(name))
            .is_some_and(|rest| rest.starts_with('{'))
    })?;

    let mut pos = 1 + name.len();
    let mut out = format!("\\{name}");
    for arg in 0..*argc {
        let len = brace_group_end(&s[pos..])?;
        let inner = &s[pos + 1..pos + len - 1];
        let inner = if *name == "weblink" && arg == 1 {
            is_url_argument(inner).then(|| inner.to_string())?
        } else {
            escape_latex(inner)
        };
        out.push('{');
        out.push_str(&inner);
        out.push('}');
        pos += len;
    }
    Some((out, pos))
}

/// Escapes LaTeX metacharacters.
///
/// Running it on its own output changes nothing: known escapes and the
/// formatter's commands with balanced arguments are kept as they are. The
/// same holds for such sequences typed in the chat text, which therefore
/// render as LaTeX instead of showing their backslashes. Any other backslash
/// becomes `\textbackslash{}`.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if ch == '\\' {
            if let Some(p) = PRESERVED.iter().find(|p| rest.starts_with(**p)) {
                out.push_str(p);
                rest = &rest[p.len()..];
            } else if let Some((cmd, len)) = read_command(rest) {
                out.push_str(&cmd);
                rest = &rest[len..];
            } else {
                out.push_str(r"\textbackslash{}");
                rest = &rest[1..];
            }
            continue;
        }
        match ch {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Escapes a URL for the second argument of `\weblink`.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for ch in url.trim().chars() {
        match ch {
            '%' => out.push_str(r"\%"),
            '#' => out.push_str(r"\#"),
            '{' => out.push_str(r"\%7B"),
            '}' => out.push_str(r"\%7D"),
            '\\' => out.push_str(r"\%5C"),
            ' ' => out.push_str(r"\%20"),
            _ => out.push(ch),
        }
    }
    out
}

/// German typography on escaped text.
pub fn typography(text: &str) -> String {
    let mut text = text.to_string();
    for (from, to) in ABBREVIATIONS {
        text = text.replace(from, to);
    }
    text = range_regex()
        .replace_all(&text, r"\fromto{${1}}{${2}}")
        .into_owned();
    text = text.replace('-', r"\h{}");
    for re in quote_regexes() {
        text = re.replace_all(&text, "»${1}«").into_owned();
    }
    text = text.replace("...", "…");
    wrap_emoji(&text)
}

fn wrap_emoji(text: &str) -> String {
    let Some(re) = emoji_regex() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        let m = &caps[0];
        let wrapped = caps
            .get(0)
            .is_some_and(|g| text[..g.start()].ends_with(r"\iconfont{"));
        if wrapped {
            m.to_string()
        } else {
            format!(r"\iconfont{{{m}}}")
        }
    })
    .into_owned()
}

/// LaTeX output for the export document.
pub struct Latex;

impl InlineTarget for Latex {
    fn escape(text: &str) -> String {
        escape_latex(text)
    }

    fn typography(text: &str) -> String {
        typography(text)
    }

    fn bold(inner: &str) -> String {
        format!(r"\textbf{{{inner}}}")
    }

    fn italic(inner: &str) -> String {
        format!(r"\textit{{{inner}}}")
    }

    fn link(text: &str, url: &str) -> String {
        format!(r"\weblink{{{text}}}{{{}}}", escape_url(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::format_inline;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("a & b", r"a \& b")]
    #[case("100%", r"100\%")]
    #[case("$5 #1", r"\$5 \#1")]
    #[case("snake_case", r"snake\_case")]
    #[case("{x}", r"\{x\}")]
    #[case(r"C:\dir", r"C:\textbackslash{}dir")]
    #[case("~/x^2", r"\textasciitilde{}/x\textasciicircum{}2")]
    fn escapes_metacharacters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_latex(input), expected);
    }

    #[rstest]
    #[case(r"a \& b")]
    #[case(r"\textbackslash{}n")]
    #[case(r"\textbf{x \& \textit{y}}")]
    #[case(r"\weblink{Docs}{https://x.org/a\#b}")]
    #[case(r"\fromto{1}{2}")]
    fn escaping_is_idempotent(#[case] escaped: &str) {
        assert_eq!(escape_latex(escaped), escaped);
    }

    #[test]
    fn authored_commands_are_split_by_kind() {
        assert_eq!(
            escape_latex(r"Type \textbf{x} or \& literally"),
            r"Type \textbf{x} or \& literally"
        );
        assert_eq!(
            escape_latex(r"Type \section{x} literally"),
            r"Type \textbackslash{}section\{x\} literally"
        );
    }

    #[test]
    fn unbalanced_command_is_escaped() {
        assert_eq!(escape_latex(r"\textbf{x"), r"\textbackslash{}textbf\{x");
    }

    #[test]
    fn url_argument_rejects_commands() {
        assert_eq!(
            escape_latex(r"\weblink{a}{\input{x}}"),
            r"\textbackslash{}weblink\{a\}\{\textbackslash{}input\{x\}\}"
        );
    }

    #[test]
    fn escapes_urls() {
        assert_eq!(
            escape_url("https://x.org/a b?q=1%2#frag{}"),
            r"https://x.org/a\%20b?q=1\%2\#frag\%7B\%7D"
        );
    }

    #[rstest]
    #[case("z. B. und d. h.", r"z.\,B. und d.\,h.")]
    #[case("Seiten 12-15", r"Seiten \fromto{12}{15}")]
    #[case("1990 – 2000", r"\fromto{1990}{2000}")]
    #[case("E-Mail", r"E\h{}Mail")]
    #[case(r#"ein "Zitat" hier"#, "ein »Zitat« hier")]
    #[case("„so“", "»so«")]
    #[case("warte...", "warte…")]
    #[case("ok 👍", r"ok \iconfont{👍}")]
    fn german_typography(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(typography(input), expected);
    }

    #[test]
    fn emoji_are_wrapped_once() {
        assert_eq!(typography(r"\iconfont{👍}"), r"\iconfont{👍}");
    }

    #[test]
    fn formats_a_line() {
        assert_eq!(
            format_inline::<Latex>("Use **50%** of [the docs](https://x.org/#top), _e.g._ z. B. 3-4"),
            r"Use \textbf{50\%} of \weblink{the docs}{https://x.org/\#top}, \textit{e.g.} z.\,B. \fromto{3}{4}"
        );
    }

    #[test]
    fn escaped_delimiters_stay_literal() {
        assert_eq!(format_inline::<Latex>(r"2\*3\*4"), "2*3*4");
    }

    #[rstest]
    #[case("Plain text & more")]
    #[case("**bold** and *it* with_under_scores")]
    #[case(r"C:\path\to {x} ~ ^")]
    #[case("Seiten 12-15, z. B. \"hier\"... 🎉")]
    #[case("nested **a *b* c** 100%")]
    fn formatting_twice_changes_nothing(#[case] input: &str) {
        let once = format_inline::<Latex>(input);
        assert_eq!(format_inline::<Latex>(&once), once);
    }
}
