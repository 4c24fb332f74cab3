//! Integration tests for the converter module.

use std::fs;
use std::sync::Arc;

use docling_reader::convert::{
    ConversionResult, ConversionStatus, ConverterRegistry, DocumentConverter,
};
use docling_reader::error::Result;
use docling_reader::model::DocItemLabel;
use docling_reader::{DoclingDocument, DoclingReader, Error, ExportType, SourceLocator};
use tempfile::TempDir;

/// Mock converter for testing.
struct MockConverter {
    extensions: Vec<&'static str>,
    name: &'static str,
}

impl MockConverter {
    fn new(extensions: Vec<&'static str>, name: &'static str) -> Self {
        Self { extensions, name }
    }

    fn document(&self) -> Result<DoclingDocument> {
        let mut doc = DoclingDocument::new(self.name);
        doc.add_text(
            DocItemLabel::Paragraph,
            format!("Converted by {}", self.name),
            None,
        )?;
        Ok(doc)
    }
}

impl DocumentConverter for MockConverter {
    fn supported_extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    fn name(&self) -> &str {
        self.name
    }

    fn convert(&self, source: &SourceLocator) -> Result<ConversionResult> {
        Ok(ConversionResult::new(source.clone(), self.document()?))
    }

    fn convert_bytes(&self, _bytes: &[u8], name: &str) -> Result<ConversionResult> {
        Ok(ConversionResult::new(SourceLocator::parse(name)?, self.document()?))
    }
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_converter_registry_new() {
    let registry = ConverterRegistry::new();
    assert!(!registry.supports("json"));
    assert!(registry.get_by_extension("md").is_none());
}

#[test]
fn test_registry_defaults() {
    let registry = ConverterRegistry::with_defaults();
    for ext in ["json", "md", "markdown", "txt", "text"] {
        assert!(registry.supports(ext), "{} should be supported", ext);
    }
    assert!(!registry.supports("pdf"));
}

#[test]
fn test_register_custom_converter() {
    let mut registry = ConverterRegistry::with_defaults();
    registry.register(Arc::new(MockConverter::new(vec!["pdf", "docx"], "mock")));

    assert!(registry.supports("PDF"));
    assert_eq!(registry.get_by_extension("docx").unwrap().name(), "mock");
    assert_eq!(registry.get_by_name("mock").unwrap().name(), "mock");

    let source = SourceLocator::parse("report.pdf").unwrap();
    let doc = registry.convert(&source).unwrap().into_document().unwrap();
    assert_eq!(doc.texts[0].text, "Converted by mock");
}

#[test]
fn test_unknown_extension() {
    let registry = ConverterRegistry::with_defaults();
    let source = SourceLocator::parse("archive.zip").unwrap();
    assert!(matches!(
        registry.convert(&source),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_failed_conversion_is_an_error() {
    let source = SourceLocator::parse("a.pdf").unwrap();
    let result = ConversionResult::new(source, DoclingDocument::new("a"))
        .with_status(ConversionStatus::Failure)
        .with_error("engine crashed");
    assert!(!result.status.is_usable());
    assert!(matches!(
        result.into_document(),
        Err(Error::Conversion { .. })
    ));
}

#[test]
fn test_markdown_file_through_reader() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "guide.md",
        "# Guide\n\nIntro text.\n\n## Steps\n\n1. first\n2. second\n\n| k | v |\n|---|---|\n| a | 1 |\n",
    );

    let reader = DoclingReader::new();
    let record = reader.lazy_load_data(path.as_str()).next().unwrap().unwrap();
    assert_eq!(record.id(), path);
    assert_eq!(
        record.text(),
        "# Guide\n\nIntro text.\n\n## Steps\n\n1. first\n2. second\n\n| k | v |\n| --- | --- |\n| a | 1 |"
    );
}

#[test]
fn test_text_file_json_export() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "plain.txt", "first\n\nsecond");

    let reader = DoclingReader::builder()
        .export_type(ExportType::Json)
        .build();
    let record = reader.lazy_load_data(path.as_str()).next().unwrap().unwrap();

    assert!(record.text().starts_with(r#"{"schema_name": "DoclingDocument", "version": "1.0.0", "name": "plain", "origin": {"mimetype": "text/plain", "#));
    let doc = DoclingDocument::from_json(record.text()).unwrap();
    assert_eq!(doc.texts.len(), 2);
    assert_eq!(doc.texts[1].text, "second");
}

#[test]
fn test_json_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut doc = DoclingDocument::new("stored");
    doc.add_title("Stored", None).unwrap();
    doc.add_text(DocItemLabel::Paragraph, "Body", None).unwrap();
    let path = write(&dir, "stored.json", &serde_json::to_string(&doc).unwrap());

    let records = DoclingReader::new().load_data([path.as_str()]).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text(), "# Stored\n\nBody");
}

#[test]
fn test_missing_file_stops_batch() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.md", "ok");
    let missing = dir.path().join("missing.md").to_string_lossy().into_owned();

    let reader = DoclingReader::new();
    let mut records = reader.lazy_load_many([good.clone(), missing, good]);
    assert!(records.next().unwrap().is_ok());
    assert!(matches!(records.next(), Some(Err(Error::Io(_)))));
    assert!(records.next().is_none());
}

#[test]
fn test_remote_source_unsupported_by_defaults() {
    let reader = DoclingReader::new();
    let result = reader
        .lazy_load_data("https://example.com/notes.md")
        .next()
        .unwrap();
    assert!(matches!(result, Err(Error::UnsupportedSource(_))));
}
