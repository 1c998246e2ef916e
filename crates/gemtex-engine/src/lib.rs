//! # gemtex engine
//!
//! Converts the Markdown dialect of scraped chat conversations into a LaTeX
//! document, and a user's own prompt into sanitized preview HTML.
//!
//! ## Pipeline
//!
//! 1. **`spans`**: code fences, inline code and math are swapped for placeholders
//! 2. **`blocks`**: lines are structured into headings, lists, tables, rules,
//!    code and paragraphs
//! 3. **`inline`**: block text is formatted and escaped for the output target
//! 4. **`latex`** / **`preview`**: blocks are rendered and placeholders restored
//! 5. **`spacing`**: blank separator lines are placed between LaTeX constructs
//!
//! **`export`** drives the LaTeX side per chunk and per document.
//!
//! Every conversion is a pure function of its input; nothing is shared
//! between calls.

pub mod blocks;
pub mod export;
pub mod inline;
pub mod latex;
pub mod preview;
pub mod spacing;
pub mod spans;

pub use export::{
    Chunk, ConversationPair, Document, ExportError, ExportOptions, convert_chunk,
    convert_chunk_with,
};
pub use preview::{ListItemNode, RenderNode, convert_inline, to_html};
