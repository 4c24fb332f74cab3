//! Output records handed to retrieval pipelines.
//!
//! A [`Document`] is the retrieval framework's unit of content: an id, a
//! metadata mapping, the body text and the templates used to combine them
//! when the text is embedded or sent to a model. It serializes to the
//! framework's wire shape, including both spellings of the metadata
//! separator key.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Default template combining metadata and content.
pub const DEFAULT_TEXT_TEMPLATE: &str = "{metadata_str}\n\n{content}";

/// Default template for one metadata entry.
pub const DEFAULT_METADATA_TEMPLATE: &str = "{key}: {value}";

/// Default separator between metadata entries.
pub const DEFAULT_METADATA_SEPARATOR: &str = "\n";

/// Default MIME type of the body text.
pub const DEFAULT_MIMETYPE: &str = "text/plain";

/// Which metadata keys are visible when rendering content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataMode {
    /// Every key
    #[default]
    All,
    /// Keys not excluded for embedding
    Embed,
    /// Keys not excluded for the language model
    Llm,
    /// No metadata at all
    None,
}

/// A retrievable document record.
///
/// Records are immutable once built: fields are reached through accessors,
/// and the `with_*` builders consume the record and return a new one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "DocumentWire")]
pub struct Document {
    id: String,
    embedding: Option<Vec<f32>>,
    metadata: Map<String, Value>,
    excluded_embed_metadata_keys: Vec<String>,
    excluded_llm_metadata_keys: Vec<String>,
    relationships: Map<String, Value>,
    text: String,
    mimetype: String,
    start_char_idx: Option<usize>,
    end_char_idx: Option<usize>,
    text_template: String,
    metadata_template: String,
    metadata_separator: String,
}

impl Document {
    /// Create a record with empty metadata and the default templates.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding: None,
            metadata: Map::new(),
            excluded_embed_metadata_keys: Vec::new(),
            excluded_llm_metadata_keys: Vec::new(),
            relationships: Map::new(),
            text: text.into(),
            mimetype: DEFAULT_MIMETYPE.to_string(),
            start_char_idx: None,
            end_char_idx: None,
            text_template: DEFAULT_TEXT_TEMPLATE.to_string(),
            metadata_template: DEFAULT_METADATA_TEMPLATE.to_string(),
            metadata_separator: DEFAULT_METADATA_SEPARATOR.to_string(),
        }
    }

    /// Replace the metadata mapping.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add or replace one metadata entry.
    pub fn with_metadata_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Keys hidden from [`MetadataMode::Embed`].
    pub fn with_excluded_embed_metadata_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_embed_metadata_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keys hidden from [`MetadataMode::Llm`].
    pub fn with_excluded_llm_metadata_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_llm_metadata_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Record identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Alias of [`Document::id`].
    pub fn doc_id(&self) -> &str {
        &self.id
    }

    /// Body text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Metadata mapping.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Embedding vector, if one was attached.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Keys hidden when embedding.
    pub fn excluded_embed_metadata_keys(&self) -> &[String] {
        &self.excluded_embed_metadata_keys
    }

    /// Keys hidden from the language model.
    pub fn excluded_llm_metadata_keys(&self) -> &[String] {
        &self.excluded_llm_metadata_keys
    }

    /// Relationships to other records.
    pub fn relationships(&self) -> &Map<String, Value> {
        &self.relationships
    }

    /// MIME type of the body text.
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Start offset of the text in its source.
    pub fn start_char_idx(&self) -> Option<usize> {
        self.start_char_idx
    }

    /// End offset of the text in its source.
    pub fn end_char_idx(&self) -> Option<usize> {
        self.end_char_idx
    }

    /// Template combining metadata and content.
    pub fn text_template(&self) -> &str {
        &self.text_template
    }

    /// Template for one metadata entry.
    pub fn metadata_template(&self) -> &str {
        &self.metadata_template
    }

    /// Separator between metadata entries.
    pub fn metadata_separator(&self) -> &str {
        &self.metadata_separator
    }

    /// Metadata entries visible in `mode`, each rendered through the
    /// metadata template and joined by the separator.
    pub fn get_metadata_str(&self, mode: MetadataMode) -> String {
        let excluded: &[String] = match mode {
            MetadataMode::All => &[],
            MetadataMode::Embed => &self.excluded_embed_metadata_keys,
            MetadataMode::Llm => &self.excluded_llm_metadata_keys,
            MetadataMode::None => return String::new(),
        };

        self.metadata
            .iter()
            .filter(|(key, _)| !excluded.contains(*key))
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                fill_template(
                    &self.metadata_template,
                    &[("key", key.as_str()), ("value", value.as_str())],
                )
            })
            .collect::<Vec<_>>()
            .join(&self.metadata_separator)
    }

    /// Text with the visible metadata prepended through the text template.
    /// Returns the bare text when no metadata is visible.
    pub fn get_content(&self, mode: MetadataMode) -> String {
        let metadata_str = self.get_metadata_str(mode);
        let metadata_str = metadata_str.trim();
        if metadata_str.is_empty() {
            return self.text.clone();
        }
        fill_template(
            &self.text_template,
            &[("metadata_str", metadata_str), ("content", self.text.as_str())],
        )
    }
}

/// Substitute `{name}` placeholders in a single pass. Unknown placeholders
/// are kept as written.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Document", 15)?;
        state.serialize_field("id_", &self.id)?;
        state.serialize_field("embedding", &self.embedding)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field(
            "excluded_embed_metadata_keys",
            &self.excluded_embed_metadata_keys,
        )?;
        state.serialize_field("excluded_llm_metadata_keys", &self.excluded_llm_metadata_keys)?;
        state.serialize_field("relationships", &self.relationships)?;
        state.serialize_field("text", &self.text)?;
        state.serialize_field("mimetype", &self.mimetype)?;
        state.serialize_field("start_char_idx", &self.start_char_idx)?;
        state.serialize_field("end_char_idx", &self.end_char_idx)?;
        state.serialize_field("text_template", &self.text_template)?;
        state.serialize_field("metadata_template", &self.metadata_template)?;
        // Older consumers read the misspelled key.
        state.serialize_field("metadata_seperator", &self.metadata_separator)?;
        state.serialize_field("metadata_separator", &self.metadata_separator)?;
        state.serialize_field("class_name", "Document")?;
        state.end()
    }
}

#[derive(Deserialize)]
struct DocumentWire {
    id_: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    excluded_embed_metadata_keys: Vec<String>,
    #[serde(default)]
    excluded_llm_metadata_keys: Vec<String>,
    #[serde(default)]
    relationships: Map<String, Value>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    mimetype: Option<String>,
    #[serde(default)]
    start_char_idx: Option<usize>,
    #[serde(default)]
    end_char_idx: Option<usize>,
    #[serde(default)]
    text_template: Option<String>,
    #[serde(default)]
    metadata_template: Option<String>,
    #[serde(default)]
    metadata_separator: Option<String>,
    #[serde(default)]
    metadata_seperator: Option<String>,
}

impl From<DocumentWire> for Document {
    fn from(wire: DocumentWire) -> Self {
        Self {
            id: wire.id_,
            embedding: wire.embedding,
            metadata: wire.metadata,
            excluded_embed_metadata_keys: wire.excluded_embed_metadata_keys,
            excluded_llm_metadata_keys: wire.excluded_llm_metadata_keys,
            relationships: wire.relationships,
            text: wire.text,
            mimetype: wire.mimetype.unwrap_or_else(|| DEFAULT_MIMETYPE.to_string()),
            start_char_idx: wire.start_char_idx,
            end_char_idx: wire.end_char_idx,
            text_template: wire
                .text_template
                .unwrap_or_else(|| DEFAULT_TEXT_TEMPLATE.to_string()),
            metadata_template: wire
                .metadata_template
                .unwrap_or_else(|| DEFAULT_METADATA_TEMPLATE.to_string()),
            metadata_separator: wire
                .metadata_separator
                .or(wire.metadata_seperator)
                .unwrap_or_else(|| DEFAULT_METADATA_SEPARATOR.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let doc = Document::new("https://example.com/foo.pdf", "Some text\n\nAnother paragraph");
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"id_":"https://example.com/foo.pdf","embedding":null,"metadata":{},"#,
                r#""excluded_embed_metadata_keys":[],"excluded_llm_metadata_keys":[],"#,
                r#""relationships":{},"text":"Some text\n\nAnother paragraph","#,
                r#""mimetype":"text/plain","start_char_idx":null,"end_char_idx":null,"#,
                r#""text_template":"{metadata_str}\n\n{content}","#,
                r#""metadata_template":"{key}: {value}","metadata_seperator":"\n","#,
                r#""metadata_separator":"\n","class_name":"Document"}"#
            )
        );
    }

    #[test]
    fn test_deserialize_either_separator_spelling() {
        let doc: Document =
            serde_json::from_value(json!({"id_": "a", "text": "t", "metadata_seperator": " | "}))
                .unwrap();
        assert_eq!(doc.metadata_separator(), " | ");
        assert_eq!(doc.mimetype(), "text/plain");

        let doc: Document =
            serde_json::from_value(json!({"id_": "a", "metadata_separator": ";"})).unwrap();
        assert_eq!(doc.metadata_separator(), ";");
    }

    #[test]
    fn test_round_trip() {
        let doc = Document::new("id", "body").with_metadata_value("page", 3);
        let back: Document = serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_metadata_str_modes() {
        let doc = Document::new("id", "body")
            .with_metadata_value("author", "Ada")
            .with_metadata_value("file_name", "a.pdf")
            .with_excluded_embed_metadata_keys(["file_name"])
            .with_excluded_llm_metadata_keys(["author"]);

        assert_eq!(
            doc.get_metadata_str(MetadataMode::All),
            "author: Ada\nfile_name: a.pdf"
        );
        assert_eq!(doc.get_metadata_str(MetadataMode::Embed), "author: Ada");
        assert_eq!(doc.get_metadata_str(MetadataMode::Llm), "file_name: a.pdf");
        assert_eq!(doc.get_metadata_str(MetadataMode::None), "");
    }

    #[test]
    fn test_get_content() {
        let plain = Document::new("id", "body");
        assert_eq!(plain.get_content(MetadataMode::All), "body");

        let doc = plain.with_metadata_value("pages", 2);
        assert_eq!(doc.get_content(MetadataMode::All), "pages: 2\n\nbody");
        assert_eq!(doc.get_content(MetadataMode::None), "body");
    }

    #[test]
    fn test_fill_template_single_pass() {
        assert_eq!(
            fill_template("{a}-{b}-{c}", &[("a", "{b}"), ("b", "x")]),
            "{b}-x-{c}"
        );
        assert_eq!(fill_template("{unclosed", &[("unclosed", "x")]), "{unclosed");
    }
}
