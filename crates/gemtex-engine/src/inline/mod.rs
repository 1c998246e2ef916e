//! # Inline Formatting
//!
//! Formats the text of a single block for one output target.
//!
//! ## Passes
//!
//! 1. Links `[text](url)` are stashed behind opaque tokens
//! 2. Bold (`**x**`, `__x__`) and italic (`*x*`, `_x_`) are stashed, innermost
//!    first, unless the opening delimiter follows a backslash
//! 3. The remaining raw text is unescaped, escaped for the target and given
//!    the target's typography
//! 4. Tokens are restored, each stashed fragment formatted the same way
//!
//! Stashed fragments are formatted on their own, so every command a target
//! wraps around them has balanced arguments.
//!
//! ## Modules
//!
//! - **`latex`**: `Latex` target, idempotent `escape_latex`, typography
//! - **`html`**: `Html` target for the prompt preview

pub mod html;
pub mod latex;

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::spans::unescape_literals;

pub use html::Html;
pub use latex::{Latex, escape_latex, escape_url};

/// Output target of the inline formatter.
pub trait InlineTarget {
    /// Escapes metacharacters of the target markup.
    fn escape(text: &str) -> String;

    /// Substitutions applied after escaping.
    fn typography(text: &str) -> String {
        text.to_string()
    }

    fn bold(inner: &str) -> String;

    fn italic(inner: &str) -> String;

    /// `text` is already formatted, `url` is raw.
    fn link(text: &str, url: &str) -> String;
}

const TOKEN: &str = "FMTPH";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"FMTPH([0-9]+)FMTPH").expect("valid regex"))
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Bold,
    Italic,
}

/// Bold before italic so `**` is never read as two `*`.
fn emphasis_patterns() -> &'static [(Regex, Emphasis); 4] {
    static RE: OnceLock<[(Regex, Emphasis); 4]> = OnceLock::new();
    RE.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        [
            (re(r"\*\*(\S(?:.*?\S)??)\*\*"), Emphasis::Bold),
            (re(r"__(\S(?:.*?\S)??)__"), Emphasis::Bold),
            (re(r"\*(\S(?:.*?\S)??)\*"), Emphasis::Italic),
            (re(r"_(\S(?:.*?\S)??)_"), Emphasis::Italic),
        ]
    })
}

#[derive(Debug, Clone)]
enum Stashed {
    Emphasis(Emphasis, String),
    Link { text: String, url: String },
}

/// Fragments lifted out of one call to [`format_inline`].
#[derive(Debug, Default)]
struct Stash(Vec<Stashed>);

impl Stash {
    fn push(&mut self, entry: Stashed) -> String {
        self.0.push(entry);
        format!("{TOKEN}{}{TOKEN}", self.0.len() - 1)
    }

    fn links(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        for caps in link_regex().captures_iter(text) {
            let (Some(whole), Some(label), Some(url)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            out.push_str(&text[copied..whole.start()]);
            let label = self.emphasis(label.as_str());
            out.push_str(&self.push(Stashed::Link {
                text: label,
                url: url.as_str().to_string(),
            }));
            copied = whole.end();
        }
        out.push_str(&text[copied..]);
        out
    }

    fn emphasis(&mut self, text: &str) -> String {
        let mut text = text.to_string();
        for (re, kind) in emphasis_patterns() {
            text = replace_unescaped(&text, re, |inner| {
                let inner = self.emphasis(inner);
                self.push(Stashed::Emphasis(*kind, inner))
            });
        }
        text
    }

    /// Formats `raw` and restores tokens below `limit`, so an entry can only
    /// refer to entries stashed before it.
    fn render<T: InlineTarget>(&self, raw: &str, limit: usize) -> String {
        let text = T::typography(&T::escape(&unescape_literals(raw)));
        token_regex()
            .replace_all(&text, |caps: &Captures| {
                let entry = caps[1]
                    .parse::<usize>()
                    .ok()
                    .filter(|&i| i < limit)
                    .and_then(|i| self.0.get(i).map(|entry| (i, entry)));
                match entry {
                    Some((i, Stashed::Emphasis(Emphasis::Bold, inner))) => {
                        T::bold(&self.render::<T>(inner, i))
                    }
                    Some((i, Stashed::Emphasis(Emphasis::Italic, inner))) => {
                        T::italic(&self.render::<T>(inner, i))
                    }
                    Some((i, Stashed::Link { text, url })) => {
                        T::link(&self.render::<T>(text, i), url)
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Like `Regex::replace_all` with a single capture group, skipping matches
/// whose first character is escaped by a backslash.
fn replace_unescaped(text: &str, re: &Regex, mut rep: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while let Some(caps) = re.captures_at(text, pos) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if text[..whole.start()].ends_with('\\') {
            // delimiters are ASCII
            pos = whole.start() + 1;
            continue;
        }
        out.push_str(&text[copied..whole.start()]);
        out.push_str(&rep(inner.as_str()));
        copied = whole.end();
        pos = whole.end();
    }
    out.push_str(&text[copied..]);
    out
}

/// Formats one block's text for target `T`.
///
/// Span placeholders (`ICODE0ICODE`, ...) pass through untouched.
pub fn format_inline<T: InlineTarget>(text: &str) -> String {
    let mut stash = Stash::default();
    let text = stash.links(text);
    let text = stash.emphasis(&text);
    stash.render::<T>(&text, stash.0.len())
}
