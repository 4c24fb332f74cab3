//! Converter for already-serialized DoclingDocument JSON.

use crate::error::{Error, Result};
use crate::model::{DoclingDocument, SCHEMA_NAME};
use crate::source::SourceLocator;

use super::{read_local, ConversionResult, DocumentConverter};

/// Loads a DoclingDocument from its JSON serialization.
///
/// Unknown fields are rejected, and so is a document whose tree fails
/// [`DoclingDocument::validate`].
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentConverter {
    _private: (),
}

impl JsonDocumentConverter {
    /// Create a new JSON converter.
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn load(&self, bytes: &[u8], input: SourceLocator) -> Result<ConversionResult> {
        let doc: DoclingDocument = serde_json::from_slice(bytes)?;
        if doc.schema_name != SCHEMA_NAME {
            return Err(Error::UnsupportedFormat(format!(
                "{}: schema {:?} is not {}",
                input, doc.schema_name, SCHEMA_NAME
            )));
        }

        if let Err(e) = doc.validate() {
            log::debug!("{} does not form a valid tree: {}", input, e);
            return Err(e);
        }
        Ok(ConversionResult::new(input, doc))
    }
}

impl DocumentConverter for JsonDocumentConverter {
    fn supported_extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn name(&self) -> &str {
        "json"
    }

    fn convert(&self, source: &SourceLocator) -> Result<ConversionResult> {
        let bytes = read_local(source)?;
        self.load(&bytes, source.clone())
    }

    fn convert_bytes(&self, bytes: &[u8], name: &str) -> Result<ConversionResult> {
        self.load(bytes, SourceLocator::parse(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionStatus;
    use crate::model::DocItemLabel;

    fn sample_json() -> String {
        let mut doc = DoclingDocument::new("sample");
        doc.add_text(DocItemLabel::Paragraph, "Hello", None).unwrap();
        serde_json::to_string(&doc).unwrap()
    }

    #[test]
    fn test_json_converter_extensions() {
        let converter = JsonDocumentConverter::new();
        assert_eq!(converter.supported_extensions(), &["json"]);
        assert!(converter.supports_extension("JSON"));
        assert!(!converter.supports_extension("md"));
        assert_eq!(converter.name(), "json");
    }

    #[test]
    fn test_convert_bytes() {
        let converter = JsonDocumentConverter::new();
        let result = converter
            .convert_bytes(sample_json().as_bytes(), "sample.json")
            .unwrap();
        assert_eq!(result.status, ConversionStatus::Success);
        assert_eq!(result.document.texts[0].text, "Hello");
    }

    #[test]
    fn test_invalid_tree_is_rejected() {
        let json = sample_json().replace(r##""parent":{"$ref":"#/body"}"##, r##""parent":{"$ref":"#/furniture"}"##);
        let converter = JsonDocumentConverter::new();
        assert!(matches!(
            converter.convert_bytes(json.as_bytes(), "bad.json"),
            Err(Error::InconsistentParent { .. })
        ));
    }

    #[test]
    fn test_dangling_child_is_rejected() {
        let json = sample_json().replace(
            r##""children":[{"$ref":"#/texts/0"}]"##,
            r##""children":[{"$ref":"#/texts/0"},{"$ref":"#/texts/7"}]"##,
        );
        assert!(json.contains("#/texts/7"));
        let converter = JsonDocumentConverter::new();
        assert!(matches!(
            converter.convert_bytes(json.as_bytes(), "bad.json"),
            Err(Error::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let json = sample_json().replacen('{', r#"{"surprise":1,"#, 1);
        let converter = JsonDocumentConverter::new();
        assert!(matches!(
            converter.convert_bytes(json.as_bytes(), "x.json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_wrong_schema() {
        let json = sample_json().replace("DoclingDocument", "SomethingElse");
        let converter = JsonDocumentConverter::new();
        assert!(matches!(
            converter.convert_bytes(json.as_bytes(), "x.json"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let converter = JsonDocumentConverter::new();
        assert!(matches!(
            converter.convert_bytes(b"{not json", "x.json"),
            Err(Error::Json(_))
        ));
    }
}
