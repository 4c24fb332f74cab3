//! Reader adapter: sources in, retrieval records out.
//!
//! [`DoclingReader`] converts each source with a [`DocumentConverter`],
//! exports the structured document as Markdown or canonical JSON and wraps
//! the result in one [`Document`] record per source. Loading is lazy: the
//! converter runs inside [`Iterator::next`].
//!
//! # Example
//!
//! ```no_run
//! use docling_reader::{DoclingReader, ExportType};
//!
//! fn main() -> docling_reader::Result<()> {
//!     let reader = DoclingReader::builder()
//!         .export_type(ExportType::Json)
//!         .build();
//!
//!     for record in reader.lazy_load_data("notes.md") {
//!         let record = record?;
//!         println!("{}: {} bytes", record.id(), record.text().len());
//!     }
//!     Ok(())
//! }
//! ```

use crate::convert::{ConverterRegistry, DocumentConverter};
use crate::error::{Error, Result};
use crate::model::DoclingDocument;
use crate::record::Document;
use crate::render::{to_json, to_markdown, JsonFormat, MarkdownOptions};
use crate::source::SourceLocator;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;
use std::sync::Arc;

/// How the structured document is flattened into record text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportType {
    /// Markdown rendering of the body, blocks joined by blank lines
    #[default]
    Markdown,
    /// Canonical single-line JSON of the whole document
    Json,
}

impl ExportType {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Markdown => "markdown",
            ExportType::Json => "json",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" | "text" => Ok(ExportType::Markdown),
            "json" | "structured" => Ok(ExportType::Json),
            other => Err(Error::Other(format!(
                "Unknown export type: {} (expected markdown or json)",
                other
            ))),
        }
    }
}

/// Computes a record id from the converted document and its source.
pub type IdFn = Arc<dyn Fn(&DoclingDocument, &SourceLocator) -> String + Send + Sync>;

/// Default id function: the source locator, verbatim.
pub fn default_id(_doc: &DoclingDocument, source: &SourceLocator) -> String {
    source.as_str().to_string()
}

/// Loads sources as retrieval records.
#[derive(Clone)]
pub struct DoclingReader {
    converter: Arc<dyn DocumentConverter>,
    export_type: ExportType,
    id_func: IdFn,
    extra_info: Option<Map<String, Value>>,
    markdown_options: MarkdownOptions,
}

impl DoclingReader {
    /// Reader with the default converters, Markdown export and locator ids.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a reader.
    pub fn builder() -> DoclingReaderBuilder {
        DoclingReaderBuilder::default()
    }

    /// Export type in use.
    pub fn export_type(&self) -> ExportType {
        self.export_type
    }

    /// Converter in use.
    pub fn converter(&self) -> &Arc<dyn DocumentConverter> {
        &self.converter
    }

    /// Markdown options used by [`ExportType::Markdown`].
    pub fn markdown_options(&self) -> &MarkdownOptions {
        &self.markdown_options
    }

    /// Lazily load one source. The sequence yields exactly one record, or
    /// one error.
    pub fn lazy_load_data(&self, source: impl Into<String>) -> LazyLoad {
        self.lazy_load_many([source])
    }

    /// Lazily load several sources, one record each, in input order. The
    /// sequence stops after the first error.
    pub fn lazy_load_many<I, S>(&self, sources: I) -> LazyLoad
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LazyLoad {
            reader: self.clone(),
            pending: sources.into_iter().map(Into::into).collect(),
            done: false,
        }
    }

    /// Load every source eagerly.
    pub fn load_data<I, S>(&self, sources: I) -> Result<Vec<Document>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lazy_load_many(sources).collect()
    }

    /// Convert one source and build its record.
    fn produce(&self, raw: &str) -> Result<Document> {
        let source = SourceLocator::parse(raw)?;
        log::debug!(
            "Loading {} with the {} converter ({} export)",
            source,
            self.converter.name(),
            self.export_type
        );

        let doc = self.converter.convert(&source)?.into_document()?;
        let text = match self.export_type {
            ExportType::Json => to_json(&doc, JsonFormat::Spaced)?,
            ExportType::Markdown => to_markdown(&doc, &self.markdown_options)?,
        };

        let id = (self.id_func)(&doc, &source);
        let record = Document::new(id, text);
        Ok(match self.extra_info {
            Some(ref extra) => record.with_metadata(extra.clone()),
            None => record,
        })
    }
}

impl Default for DoclingReader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DoclingReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoclingReader")
            .field("converter", &self.converter.name())
            .field("export_type", &self.export_type)
            .field("extra_info", &self.extra_info)
            .field("markdown_options", &self.markdown_options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DoclingReader`].
pub struct DoclingReaderBuilder {
    converter: Option<Arc<dyn DocumentConverter>>,
    export_type: ExportType,
    id_func: Option<IdFn>,
    extra_info: Option<Map<String, Value>>,
    markdown_options: MarkdownOptions,
}

impl Default for DoclingReaderBuilder {
    fn default() -> Self {
        Self {
            converter: None,
            export_type: ExportType::default(),
            id_func: None,
            extra_info: None,
            // Pictures carry no text worth indexing.
            markdown_options: MarkdownOptions::default().with_image_placeholder(""),
        }
    }
}

impl DoclingReaderBuilder {
    /// Use `converter` instead of the default registry.
    pub fn converter(mut self, converter: impl DocumentConverter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Use a shared converter.
    pub fn shared_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the export type.
    pub fn export_type(mut self, export_type: ExportType) -> Self {
        self.export_type = export_type;
        self
    }

    /// Set the id function.
    pub fn id_func<F>(mut self, id_func: F) -> Self
    where
        F: Fn(&DoclingDocument, &SourceLocator) -> String + Send + Sync + 'static,
    {
        self.id_func = Some(Arc::new(id_func));
        self
    }

    /// Metadata copied into every record.
    pub fn extra_info(mut self, extra_info: Map<String, Value>) -> Self {
        self.extra_info = Some(extra_info);
        self
    }

    /// Set the Markdown options.
    pub fn markdown_options(mut self, options: MarkdownOptions) -> Self {
        self.markdown_options = options;
        self
    }

    /// Build the reader.
    pub fn build(self) -> DoclingReader {
        DoclingReader {
            converter: self.converter.unwrap_or_else(|| {
                Arc::new(ConverterRegistry::with_defaults()) as Arc<dyn DocumentConverter>
            }),
            export_type: self.export_type,
            id_func: self.id_func.unwrap_or_else(|| Arc::new(default_id) as IdFn),
            extra_info: self.extra_info,
            markdown_options: self.markdown_options,
        }
    }
}

/// Lazy sequence of records returned by [`DoclingReader::lazy_load_data`].
///
/// Each call to `next` converts one source. After an error, or once every
/// source is consumed, the sequence only yields `None`.
pub struct LazyLoad {
    reader: DoclingReader,
    pending: VecDeque<String>,
    done: bool,
}

impl LazyLoad {
    /// Number of sources not yet converted.
    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.pending.len()
        }
    }
}

impl Iterator for LazyLoad {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(raw) = self.pending.pop_front() else {
            self.done = true;
            return None;
        };

        let result = self.reader.produce(&raw);
        if let Err(ref e) = result {
            log::debug!("Stopping after failure on {:?}: {}", raw, e);
            self.done = true;
            self.pending.clear();
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for LazyLoad {}

impl fmt::Debug for LazyLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyLoad")
            .field("pending", &self.pending)
            .field("done", &self.done)
            .finish()
    }
}
