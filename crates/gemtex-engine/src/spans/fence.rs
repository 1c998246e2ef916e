use serde::Deserialize;

/// The opening line of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceOpen<'a> {
    /// Leading whitespace before the backticks.
    pub indent: &'a str,
    /// Info string after the backticks, trimmed.
    pub info: &'a str,
}

impl FenceOpen<'_> {
    /// Whether this fence carries the scraper's JSON metadata header.
    pub fn is_internal(&self) -> bool {
        self.info == CodeFence::INTERNAL_TAG
    }
}

/// Fenced code block delimiters, line by line.
pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    /// Info string of fences produced by the scraper, followed by a JSON line.
    pub const INTERNAL_TAG: &'static str = "gemini-internal-code";
    /// Emitted in place of an internal fence whose metadata can't be read.
    pub const PARSE_ERROR_MARKER: &'static str = "[Code block parsing error]";

    pub fn open(line: &str) -> Option<FenceOpen<'_>> {
        let rest = line.trim_start_matches([' ', '\t']);
        let info = rest.strip_prefix(Self::BACKTICKS)?;
        Some(FenceOpen {
            indent: &line[..line.len() - rest.len()],
            info: info.trim(),
        })
    }

    pub fn closes(line: &str) -> bool {
        line.trim() == Self::BACKTICKS
    }
}

/// Metadata header of an internal code fence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeMeta {
    pub shorthand: String,
    pub label: String,
}

impl CodeMeta {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let mut meta: CodeMeta = serde_json::from_str(line.trim())?;
        if meta.shorthand.trim().is_empty() {
            meta.shorthand = "text".to_string();
        }
        if meta.label.trim().is_empty() {
            meta.label = "Code".to_string();
        }
        Ok(meta)
    }

    /// Metadata for a standard fence: lowercased tag or `text`, raw tag or `Code`.
    pub fn from_info(info: &str) -> Self {
        if info.is_empty() {
            Self {
                shorthand: "text".to_string(),
                label: "Code".to_string(),
            }
        } else {
            Self {
                shorthand: info.to_lowercase(),
                label: info.to_string(),
            }
        }
    }
}

/// Strips `indent` from every body line that starts with it, then drops
/// trailing whitespace of the whole block.
pub fn dedent(body: &[&str], indent: &str) -> String {
    body.iter()
        .map(|line| line.strip_prefix(indent).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detect_plain_fence() {
        let open = CodeFence::open("```").unwrap();
        assert_eq!(open.indent, "");
        assert_eq!(open.info, "");
    }

    #[test]
    fn detect_indented_fence_with_language() {
        let open = CodeFence::open("    ```Python  ").unwrap();
        assert_eq!(open.indent, "    ");
        assert_eq!(open.info, "Python");
        assert!(!open.is_internal());
    }

    #[test]
    fn detect_internal_fence() {
        assert!(CodeFence::open("```gemini-internal-code").unwrap().is_internal());
    }

    #[test]
    fn no_fence() {
        assert_eq!(CodeFence::open("hello ```"), None);
        assert_eq!(CodeFence::open("``inline``"), None);
    }

    #[test]
    fn closes_only_bare_backticks() {
        assert!(CodeFence::closes("```"));
        assert!(CodeFence::closes("   ```  "));
        assert!(!CodeFence::closes("```rust"));
    }

    #[test]
    fn parse_metadata() {
        let meta = CodeMeta::parse(r#"{"shorthand":"css","label":"CSS"}"#).unwrap();
        assert_eq!(
            meta,
            CodeMeta {
                shorthand: "css".into(),
                label: "CSS".into()
            }
        );
    }

    #[test]
    fn parse_metadata_fills_blank_fields() {
        let meta = CodeMeta::parse(r#"{"shorthand":"","label":""}"#).unwrap();
        assert_eq!(meta.shorthand, "text");
        assert_eq!(meta.label, "Code");
    }

    #[test]
    fn parse_metadata_rejects_broken_json() {
        assert!(CodeMeta::parse(r#"{"shorthand": "css""#).is_err());
        assert!(CodeMeta::parse("not json").is_err());
    }

    #[test]
    fn metadata_from_info_string() {
        assert_eq!(CodeMeta::from_info("Rust").shorthand, "rust");
        assert_eq!(CodeMeta::from_info("Rust").label, "Rust");
        assert_eq!(CodeMeta::from_info("").shorthand, "text");
        assert_eq!(CodeMeta::from_info("").label, "Code");
    }

    #[test]
    fn dedent_only_strips_matching_prefix() {
        let body = ["    fn main() {", "        x();", "  }", "", ""];
        assert_eq!(dedent(&body, "    "), "fn main() {\n    x();\n  }");
    }
}
