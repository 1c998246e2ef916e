use super::InlineTarget;

const LINK_SCHEMES: [&str; 3] = ["http:", "https:", "mailto:"];

/// Whether `url` is relative or uses a scheme safe to link.
fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    let scheme_end = url.find(':');
    let path_start = url.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (None, _) => true,
        (Some(colon), Some(path)) if path < colon => true,
        _ => {
            let lower = url.to_ascii_lowercase();
            LINK_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
        }
    }
}

/// Sanitized HTML for the prompt preview.
pub struct Html;

impl InlineTarget for Html {
    fn escape(text: &str) -> String {
        html_escape::encode_text(text).into_owned()
    }

    fn bold(inner: &str) -> String {
        format!("<strong>{inner}</strong>")
    }

    fn italic(inner: &str) -> String {
        format!("<em>{inner}</em>")
    }

    fn link(text: &str, url: &str) -> String {
        if !is_safe_url(url) {
            log::debug!("Dropping link with unsafe target {url:?}");
            return text.to_string();
        }
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="gemini-prompt-link">{text}</a>"#,
            html_escape::encode_double_quoted_attribute(url.trim())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::format_inline;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            format_inline::<Html>("<script>alert(1)</script> & **bold**"),
            "&lt;script&gt;alert(1)&lt;/script&gt; &amp; <strong>bold</strong>"
        );
    }

    #[test]
    fn no_latex_typography() {
        assert_eq!(format_inline::<Html>("z. B. 3-4 \"x\""), "z. B. 3-4 \"x\"");
    }

    #[test]
    fn renders_links() {
        assert_eq!(
            format_inline::<Html>("[*docs*](https://x.org/?a=1&b=\"2\")"),
            r#"<a href="https://x.org/?a=1&amp;b=&quot;2&quot;" target="_blank" rel="noopener noreferrer" class="gemini-prompt-link"><em>docs</em></a>"#
        );
    }

    #[rstest]
    #[case("https://example.org", true)]
    #[case("HTTP://EXAMPLE.ORG", true)]
    #[case("mailto:a@b.c", true)]
    #[case("docs/page.html", true)]
    #[case("/abs?x=a:b", true)]
    #[case("javascript:alert(1)", false)]
    #[case("data:text/html,x", false)]
    fn link_schemes(#[case] url: &str, #[case] safe: bool) {
        assert_eq!(is_safe_url(url), safe);
    }

    #[test]
    fn unsafe_link_keeps_text() {
        assert_eq!(format_inline::<Html>("[click](javascript:alert(1))"), "click)");
    }
}
