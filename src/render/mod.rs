//! Rendering module for converting structured documents to output formats.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, to_spaced_string, JsonFormat, SpacedFormatter};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{MarkdownOptions, PageSelection, TableFallback, DEFAULT_IMAGE_PLACEHOLDER};
pub use text::to_text;
