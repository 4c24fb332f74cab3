//! Document converter module providing a plugin architecture for source formats.
//!
//! A converter turns a source into a structured [`DoclingDocument`]. Layout
//! analysis engines plug in by implementing [`DocumentConverter`]; the crate
//! ships two light converters for sources that need no layout analysis.
//! [`ConverterRegistry`] dispatches on the source's file extension and is
//! itself a converter.
//!
//! # Example
//!
//! ```no_run
//! use docling_reader::convert::{ConverterRegistry, DocumentConverter};
//! use docling_reader::SourceLocator;
//!
//! fn main() -> docling_reader::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let source = SourceLocator::parse("notes.md")?;
//!
//!     let result = registry.convert(&source)?;
//!     println!("{} nodes", result.document.node_count());
//!     Ok(())
//! }
//! ```

mod json;
mod text;

pub use json::JsonDocumentConverter;
pub use text::TextDocumentConverter;

use crate::error::{Error, Result};
use crate::model::DoclingDocument;
use crate::source::SourceLocator;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Outcome reported by a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionStatus {
    /// Converted without problems
    #[default]
    Success,
    /// Converted, but parts of the source were dropped
    PartialSuccess,
    /// Conversion failed; the document is not usable
    Failure,
    /// The converter declined the source
    Skipped,
}

impl ConversionStatus {
    /// Whether the document can be used.
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            ConversionStatus::Success | ConversionStatus::PartialSuccess
        )
    }
}

/// Result of converting one source.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The source that was converted
    pub input: SourceLocator,

    /// Conversion outcome
    pub status: ConversionStatus,

    /// Per-item error messages
    pub errors: Vec<String>,

    /// The structured document
    pub document: DoclingDocument,
}

impl ConversionResult {
    /// Create a successful result.
    pub fn new(input: SourceLocator, document: DoclingDocument) -> Self {
        Self {
            input,
            status: ConversionStatus::Success,
            errors: Vec::new(),
            document,
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: ConversionStatus) -> Self {
        self.status = status;
        self
    }

    /// Record an error message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    /// Take the document, failing when the status says it is not usable.
    pub fn into_document(self) -> Result<DoclingDocument> {
        match self.status {
            ConversionStatus::Success => Ok(self.document),
            ConversionStatus::PartialSuccess => {
                for error in &self.errors {
                    log::warn!("{}: {}", self.input, error);
                }
                Ok(self.document)
            }
            ConversionStatus::Failure | ConversionStatus::Skipped => {
                let message = if self.errors.is_empty() {
                    format!("converter reported {:?}", self.status)
                } else {
                    self.errors.join("; ")
                };
                Err(Error::Conversion {
                    locator: self.input.to_string(),
                    message,
                })
            }
        }
    }
}

/// Trait for document converters.
///
/// Implement this trait to plug in a conversion engine.
pub trait DocumentConverter: Send + Sync {
    /// Get the supported file extensions for this converter.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["pdf"]`).
    fn supported_extensions(&self) -> &[&'static str];

    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert the document at `source`.
    fn convert(&self, source: &SourceLocator) -> Result<ConversionResult>;

    /// Convert from bytes. `name` is the file name the bytes came from.
    fn convert_bytes(&self, bytes: &[u8], name: &str) -> Result<ConversionResult>;

    /// Check if this converter supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Read a local source, rejecting remote locators.
pub(crate) fn read_local(source: &SourceLocator) -> Result<Vec<u8>> {
    let path = source.path().ok_or_else(|| {
        Error::UnsupportedSource(format!("{} (remote sources are not fetched)", source))
    })?;
    log::debug!("Reading {}", path.display());
    Ok(fs::read(path)?)
}

/// Registry for document converters.
///
/// The registry maps file extensions to converters and converts a source
/// with the converter registered for its extension.
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn DocumentConverter>>,
    by_name: HashMap<String, Arc<dyn DocumentConverter>>,
    extensions: Vec<&'static str>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
            extensions: Vec::new(),
        }
    }

    /// Create a registry with the built-in JSON and text converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonDocumentConverter::new()));
        registry.register(Arc::new(TextDocumentConverter::new()));
        registry
    }

    /// Register a converter.
    ///
    /// The converter will be registered for all its supported extensions,
    /// replacing any converter registered earlier for the same extension.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        for ext in converter.supported_extensions() {
            self.converters
                .insert(ext.to_lowercase(), converter.clone());
            if !self.extensions.contains(ext) {
                self.extensions.push(*ext);
            }
        }
        self.extensions.sort_unstable();
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.get(&ext.to_lowercase()).cloned()
    }

    /// Get a converter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.converters.contains_key(&ext.to_lowercase())
    }

    fn lookup(&self, ext: Option<String>, what: &str) -> Result<Arc<dyn DocumentConverter>> {
        let ext = ext.ok_or_else(|| {
            Error::UnsupportedFormat(format!("{} has no file extension", what))
        })?;
        self.get_by_extension(&ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("No converter for extension: {}", ext)))
    }
}

impl DocumentConverter for ConverterRegistry {
    fn supported_extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    fn name(&self) -> &str {
        "registry"
    }

    fn convert(&self, source: &SourceLocator) -> Result<ConversionResult> {
        let converter = self.lookup(source.extension(), source.as_str())?;
        log::debug!("Converting {} with the {} converter", source, converter.name());
        converter.convert(source)
    }

    fn convert_bytes(&self, bytes: &[u8], name: &str) -> Result<ConversionResult> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let converter = self.lookup(ext, name)?;
        converter.convert_bytes(bytes, name)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.supports("json"));
        assert!(registry.supports("MD"));
        assert!(registry.supports("txt"));
        assert!(!registry.supports("pdf"));
        assert_eq!(
            registry.supported_extensions(),
            &["json", "markdown", "md", "text", "txt"]
        );
    }

    #[test]
    fn test_registry_get_by_extension() {
        let registry = ConverterRegistry::with_defaults();
        let converter = registry.get_by_extension("markdown");
        assert_eq!(converter.unwrap().name(), "text");
        assert!(registry.get_by_name("JSON").is_some());
    }

    #[test]
    fn test_registry_unknown_extension() {
        let registry = ConverterRegistry::with_defaults();
        let source = SourceLocator::parse("report.pdf").unwrap();
        assert!(matches!(
            registry.convert(&source),
            Err(Error::UnsupportedFormat(_))
        ));

        let source = SourceLocator::parse("README").unwrap();
        assert!(matches!(
            registry.convert(&source),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_registry_convert_bytes() {
        let registry = ConverterRegistry::with_defaults();
        let result = registry.convert_bytes(b"Hello\n\nWorld", "hello.txt").unwrap();
        assert_eq!(result.document.texts.len(), 2);
        assert_eq!(result.input.as_str(), "hello.txt");
    }

    #[test]
    fn test_remote_source_not_fetched() {
        let registry = ConverterRegistry::with_defaults();
        let source = SourceLocator::parse("https://example.com/notes.md").unwrap();
        assert!(matches!(
            registry.convert(&source),
            Err(Error::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_status_into_document() {
        let input = SourceLocator::parse("a.txt").unwrap();
        let doc = DoclingDocument::new("a");

        let ok = ConversionResult::new(input.clone(), doc.clone());
        assert!(ok.into_document().is_ok());

        let partial = ConversionResult::new(input.clone(), doc.clone())
            .with_status(ConversionStatus::PartialSuccess)
            .with_error("page 2 dropped");
        assert!(partial.into_document().is_ok());

        let failed = ConversionResult::new(input.clone(), doc.clone())
            .with_status(ConversionStatus::Failure)
            .with_error("corrupt file");
        match failed.into_document() {
            Err(Error::Conversion { locator, message }) => {
                assert_eq!(locator, "a.txt");
                assert_eq!(message, "corrupt file");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let skipped = ConversionResult::new(input, doc).with_status(ConversionStatus::Skipped);
        assert!(skipped.into_document().is_err());
        assert!(!ConversionStatus::Skipped.is_usable());
    }
}
