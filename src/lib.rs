//! # docling-reader
//!
//! Load converted documents as retrieval-ready records.
//!
//! A converter turns a source into a structured DoclingDocument tree. The
//! reader flattens that tree into Markdown (blocks joined by blank lines) or
//! into its canonical single-line JSON, and wraps the result in one
//! [`Document`] record per source.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docling_reader::DoclingReader;
//!
//! fn main() -> docling_reader::Result<()> {
//!     let reader = DoclingReader::new();
//!     for record in reader.lazy_load_data("notes.md") {
//!         let record = record?;
//!         println!("{}\n{}", record.id(), record.text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two export modes**: Markdown or canonical DoclingDocument JSON
//! - **Lazy loading**: conversion runs only when the sequence is iterated
//! - **Pluggable converters**: any engine implementing [`DocumentConverter`]
//! - **Built-in readers**: serialized DoclingDocument JSON, plain text and Markdown
//! - **Tree tools**: reference resolution, traversal and validation

pub mod convert;
pub mod error;
pub mod model;
pub mod reader;
pub mod record;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use convert::{
    ConversionResult, ConversionStatus, ConverterRegistry, DocumentConverter,
    JsonDocumentConverter, TextDocumentConverter,
};
pub use error::{Error, Result};
pub use model::{DocItemLabel, DoclingDocument, DocumentOrigin, GroupLabel, ItemRef, NodeItem};
pub use reader::{default_id, DoclingReader, DoclingReaderBuilder, ExportType, IdFn, LazyLoad};
pub use record::{Document, MetadataMode};
pub use render::{JsonFormat, MarkdownOptions, PageSelection, TableFallback};
pub use source::{SourceKind, SourceLocator};

use std::path::Path;

/// Convert a file with the built-in converters.
///
/// # Example
///
/// ```no_run
/// use docling_reader::convert_file;
///
/// let doc = convert_file("notes.md").unwrap();
/// println!("Nodes: {}", doc.node_count());
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<DoclingDocument> {
    let source = SourceLocator::from_path(path)?;
    ConverterRegistry::with_defaults()
        .convert(&source)?
        .into_document()
}

/// Load a file as a single record.
///
/// # Example
///
/// ```no_run
/// use docling_reader::{load_file, ExportType};
///
/// let record = load_file("notes.md", ExportType::Markdown).unwrap();
/// assert_eq!(record.id(), "notes.md");
/// ```
pub fn load_file<P: AsRef<Path>>(path: P, export_type: ExportType) -> Result<Document> {
    let source = SourceLocator::from_path(path)?;
    let reader = DoclingReader::builder().export_type(export_type).build();
    reader
        .lazy_load_data(source.as_str())
        .next()
        .unwrap_or_else(|| Err(Error::Other("reader produced no record".into())))
}

/// Convert a file to Markdown with default options.
///
/// # Example
///
/// ```no_run
/// use docling_reader::to_markdown;
///
/// let markdown = to_markdown("report.json").unwrap();
/// std::fs::write("report.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = convert_file(path)?;
    render::to_markdown(&doc, &MarkdownOptions::default())
}

/// Convert a file to Markdown with custom options.
pub fn to_markdown_with_options<P: AsRef<Path>>(
    path: P,
    options: &MarkdownOptions,
) -> Result<String> {
    let doc = convert_file(path)?;
    render::to_markdown(&doc, options)
}

/// Convert a file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = convert_file(path)?;
    render::to_text(&doc)
}

/// Convert a file to DoclingDocument JSON.
///
/// # Example
///
/// ```no_run
/// use docling_reader::{to_json, JsonFormat};
///
/// let json = to_json("notes.md", JsonFormat::Pretty).unwrap();
/// std::fs::write("notes.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = convert_file(path)?;
    render::to_json(&doc, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn markdown_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_convert_file() {
        let file = markdown_file("# Title\n\nBody text");
        let doc = convert_file(file.path()).unwrap();
        assert_eq!(doc.texts.len(), 2);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_convert_missing_file() {
        let err = convert_file("/nonexistent/dir/missing.md").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_to_markdown_and_text() {
        let file = markdown_file("# Title\n\n- a\n- b\n");
        assert_eq!(to_markdown(file.path()).unwrap(), "# Title\n\n- a\n- b");
        assert_eq!(to_text(file.path()).unwrap(), "Title\n\na\n\nb");
    }

    #[test]
    fn test_to_json_round_trips() {
        let file = markdown_file("Hello");
        let json = to_json(file.path(), JsonFormat::Compact).unwrap();
        let doc = DoclingDocument::from_json(&json).unwrap();
        assert_eq!(doc.texts[0].text, "Hello");
    }

    #[test]
    fn test_load_file_uses_path_as_id() {
        let file = markdown_file("Hello");
        let record = load_file(file.path(), ExportType::Markdown).unwrap();
        assert_eq!(record.id(), file.path().to_string_lossy());
        assert_eq!(record.text(), "Hello");
        assert!(record.metadata().is_empty());
    }

    #[test]
    fn test_json_format_variants() {
        assert_eq!(JsonFormat::default(), JsonFormat::Pretty);
        assert_ne!(JsonFormat::Compact, JsonFormat::Spaced);
    }

    #[test]
    fn test_export_type_default() {
        assert_eq!(DoclingReader::new().export_type(), ExportType::Markdown);
    }
}
