//! # Export
//!
//! Converts a whole conversation into one LaTeX document.
//!
//! A [`Document`] is an ordered list of [`Chunk`]s. Each chunk converts on its
//! own (fresh span table, fresh list and table state) into a boxed prompt
//! region and a plain answer region; the document joins them between a fixed
//! preamble and footer.

pub mod chunk;

use serde::{Deserialize, Serialize};

pub use chunk::{Chunk, collapse_blank_runs, convert_chunk, convert_chunk_with};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Conversation has no prompt/answer pairs to export")]
    EmptyConversation,
    #[error("Failed to read conversation: {0}")]
    ConversationParse(#[from] serde_json::Error),
}

/// Document-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub document_class: String,
    /// Comma separated, without brackets. Empty for none.
    pub class_options: String,
    /// Last argument of `\relpospar` after each prompt.
    pub prompt_label: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            document_class: "lua-gemini".to_string(),
            class_options: "ngerman".to_string(),
            prompt_label: "gemini".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn preamble(&self) -> String {
        let options = if self.class_options.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.class_options)
        };
        format!(
            "\n\\documentclass{options}{{{}}}\n\n\\begin{{document}}\n\n",
            self.document_class
        )
    }

    pub fn footer(&self) -> &'static str {
        "\n\n\\end{document}\n"
    }
}

/// One scraped prompt/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPair {
    pub prompt: String,
    pub answer_md: String,
}

/// An ordered conversation ready for export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub chunks: Vec<Chunk>,
}

impl Document {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = ConversationPair>) -> Self {
        Self {
            chunks: pairs
                .into_iter()
                .map(|pair| Chunk::new(pair.prompt, pair.answer_md))
                .collect(),
        }
    }

    /// Reads a JSON array of `{"prompt": ..., "answer_md": ...}` objects.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let pairs: Vec<ConversationPair> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn render(&self, options: &ExportOptions) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::EmptyConversation);
        }
        log::debug!("Rendering {} chunks", self.chunks.len());

        let mut tex = options.preamble();
        for chunk in &self.chunks {
            tex.push_str(&chunk.to_latex(options));
            tex.push_str("\n\n");
        }
        let mut tex = collapse_blank_runs(&tex).trim().to_string();
        tex.push_str(options.footer());
        Ok(tex)
    }
}
