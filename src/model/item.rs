//! Node types of the structured document tree.

use super::TableData;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON pointer to a node (serialized as `{"$ref": "#/texts/0"}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemRef {
    /// Pointer path, e.g. `#/body` or `#/texts/0`
    #[serde(rename = "$ref")]
    pub cref: String,
}

impl ItemRef {
    /// Create a reference from a pointer path.
    pub fn new(cref: impl Into<String>) -> Self {
        Self { cref: cref.into() }
    }

    /// Reference to the `body` root.
    pub fn body() -> Self {
        Self::new("#/body")
    }

    /// Reference to the `furniture` root.
    pub fn furniture() -> Self {
        Self::new("#/furniture")
    }

    /// Reference to the `index`-th node of `collection`.
    pub fn item(collection: Collection, index: usize) -> Self {
        Self::new(format!("#/{}/{}", collection.as_str(), index))
    }

    /// The pointer path.
    pub fn as_str(&self) -> &str {
        &self.cref
    }

    /// Parse the pointer into its target location.
    pub fn target(&self) -> Result<RefTarget> {
        let path = self
            .cref
            .strip_prefix("#/")
            .ok_or_else(|| Error::InvalidReference(self.cref.clone()))?;

        match path.split_once('/') {
            None if path == "body" => Ok(RefTarget::Body),
            None if path == "furniture" => Ok(RefTarget::Furniture),
            None => Err(Error::InvalidReference(self.cref.clone())),
            Some((collection, index)) => {
                let collection = Collection::from_name(collection)
                    .ok_or_else(|| Error::InvalidReference(self.cref.clone()))?;
                let index = index
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidReference(self.cref.clone()))?;
                Ok(RefTarget::Item { collection, index })
            }
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cref)
    }
}

/// Location a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    /// The `body` root group
    Body,
    /// The `furniture` root group
    Furniture,
    /// A node stored in one of the item collections
    Item {
        /// Collection holding the node
        collection: Collection,
        /// Position in the collection
        index: usize,
    },
}

/// Item collections of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// `groups`
    Groups,
    /// `texts`
    Texts,
    /// `pictures`
    Pictures,
    /// `tables`
    Tables,
    /// `key_value_items`
    KeyValueItems,
    /// `form_items`
    FormItems,
}

impl Collection {
    /// Field name of the collection in the serialized document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Groups => "groups",
            Collection::Texts => "texts",
            Collection::Pictures => "pictures",
            Collection::Tables => "tables",
            Collection::KeyValueItems => "key_value_items",
            Collection::FormItems => "form_items",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "groups" => Some(Collection::Groups),
            "texts" => Some(Collection::Texts),
            "pictures" => Some(Collection::Pictures),
            "tables" => Some(Collection::Tables),
            "key_value_items" => Some(Collection::KeyValueItems),
            "form_items" => Some(Collection::FormItems),
            _ => None,
        }
    }
}

/// Layer a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentLayer {
    /// Main content
    Body,
    /// Page headers, footers and similar furniture
    Furniture,
    /// Background content
    Background,
    /// Invisible content (e.g. hidden text layers)
    Invisible,
    /// Speaker notes and annotations
    Notes,
}

/// Label of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLabel {
    /// No particular semantics (used by the roots)
    #[default]
    Unspecified,
    /// Bulleted list
    List,
    /// Numbered list
    OrderedList,
    /// Chapter
    Chapter,
    /// Section
    Section,
    /// Spreadsheet sheet
    Sheet,
    /// Presentation slide
    Slide,
    /// Form area
    FormArea,
    /// Key-value area
    KeyValueArea,
    /// Comment section
    CommentSection,
    /// Inline run of items rendered on one line
    Inline,
    /// Area grouping pictures
    PictureArea,
}

impl GroupLabel {
    /// Whether the group is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, GroupLabel::List | GroupLabel::OrderedList)
    }
}

/// Label of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocItemLabel {
    /// Caption of a table or picture
    Caption,
    /// Chart
    Chart,
    /// Footnote
    Footnote,
    /// Formula (LaTeX text)
    Formula,
    /// List item
    ListItem,
    /// Page footer
    PageFooter,
    /// Page header
    PageHeader,
    /// Picture
    Picture,
    /// Section header
    SectionHeader,
    /// Table
    Table,
    /// Generic text
    Text,
    /// Document title
    Title,
    /// Table of contents
    DocumentIndex,
    /// Code block
    Code,
    /// Checked checkbox
    CheckboxSelected,
    /// Unchecked checkbox
    CheckboxUnselected,
    /// Form
    Form,
    /// Key-value region
    KeyValueRegion,
    /// Paragraph
    Paragraph,
    /// Bibliographic reference
    Reference,
}

impl DocItemLabel {
    /// Serialized name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocItemLabel::Caption => "caption",
            DocItemLabel::Chart => "chart",
            DocItemLabel::Footnote => "footnote",
            DocItemLabel::Formula => "formula",
            DocItemLabel::ListItem => "list_item",
            DocItemLabel::PageFooter => "page_footer",
            DocItemLabel::PageHeader => "page_header",
            DocItemLabel::Picture => "picture",
            DocItemLabel::SectionHeader => "section_header",
            DocItemLabel::Table => "table",
            DocItemLabel::Text => "text",
            DocItemLabel::Title => "title",
            DocItemLabel::DocumentIndex => "document_index",
            DocItemLabel::Code => "code",
            DocItemLabel::CheckboxSelected => "checkbox_selected",
            DocItemLabel::CheckboxUnselected => "checkbox_unselected",
            DocItemLabel::Form => "form",
            DocItemLabel::KeyValueRegion => "key_value_region",
            DocItemLabel::Paragraph => "paragraph",
            DocItemLabel::Reference => "reference",
        }
    }

    /// Whether the label marks page furniture.
    pub fn is_furniture(&self) -> bool {
        matches!(self, DocItemLabel::PageHeader | DocItemLabel::PageFooter)
    }
}

/// Origin of the box coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoordOrigin {
    /// (0, 0) at the top-left corner
    #[default]
    #[serde(rename = "TOPLEFT")]
    TopLeft,
    /// (0, 0) at the bottom-left corner
    #[serde(rename = "BOTTOMLEFT")]
    BottomLeft,
}

/// Bounding box on a page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundingBox {
    /// Left
    pub l: f64,
    /// Top
    pub t: f64,
    /// Right
    pub r: f64,
    /// Bottom
    pub b: f64,
    /// Coordinate origin
    #[serde(default)]
    pub coord_origin: CoordOrigin,
}

impl BoundingBox {
    /// Box width.
    pub fn width(&self) -> f64 {
        (self.r - self.l).abs()
    }

    /// Box height.
    pub fn height(&self) -> f64 {
        (self.b - self.t).abs()
    }
}

/// Where a node's content was found in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvenanceItem {
    /// 1-indexed page number
    pub page_no: u32,
    /// Location on the page
    pub bbox: BoundingBox,
    /// Character span `[start, end)` within the node text
    pub charspan: (usize, usize),
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

/// Reference to a rendered image of a node or page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageRef {
    /// Image MIME type
    pub mimetype: String,
    /// Resolution
    pub dpi: u32,
    /// Pixel size
    pub size: Size,
    /// Location (file path, URL or data URI)
    pub uri: String,
}

/// Vertical script position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// Normal text
    #[default]
    Baseline,
    /// Subscript
    Sub,
    /// Superscript
    Super,
}

/// Inline text formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Formatting {
    /// Bold
    #[serde(default)]
    pub bold: bool,
    /// Italic
    #[serde(default)]
    pub italic: bool,
    /// Underline
    #[serde(default)]
    pub underline: bool,
    /// Strikethrough
    #[serde(default)]
    pub strikethrough: bool,
    /// Script position
    #[serde(default)]
    pub script: Script,
}

/// Root or structural group (body, furniture, lists, sections, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupItem {
    /// Pointer to this node
    pub self_ref: String,
    /// Pointer to the parent node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemRef>,
    /// Ordered child pointers
    #[serde(default)]
    pub children: Vec<ItemRef>,
    /// Content layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_layer: Option<ContentLayer>,
    /// Group name (`_root_` for the roots)
    #[serde(default = "default_group_name")]
    pub name: String,
    /// Group label
    #[serde(default)]
    pub label: GroupLabel,
}

fn default_group_name() -> String {
    "group".to_string()
}

impl GroupItem {
    /// Create a root group (`body` or `furniture`).
    pub fn root(self_ref: impl Into<String>) -> Self {
        Self {
            self_ref: self_ref.into(),
            parent: None,
            children: Vec::new(),
            content_layer: None,
            name: "_root_".to_string(),
            label: GroupLabel::Unspecified,
        }
    }
}

/// Text-bearing node (paragraphs, headings, list items, code, formulas, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextItem {
    /// Pointer to this node
    pub self_ref: String,
    /// Pointer to the parent node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemRef>,
    /// Ordered child pointers
    #[serde(default)]
    pub children: Vec<ItemRef>,
    /// Content layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_layer: Option<ContentLayer>,
    /// Item label
    pub label: DocItemLabel,
    /// Provenance
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    /// Text as found in the source
    pub orig: String,
    /// Sanitized text
    pub text: String,
    /// Inline formatting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<Formatting>,
    /// Link target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    /// Caption nodes (code blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions: Option<Vec<ItemRef>>,
    /// Reference nodes (code blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<ItemRef>>,
    /// Footnote nodes (code blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnotes: Option<Vec<ItemRef>>,
    /// Rendered image (code blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Heading level (section headers, 1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Whether the list item is numbered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerated: Option<bool>,
    /// Explicit list marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Language of a code block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_language: Option<String>,
}

impl TextItem {
    /// Create a text node with identical `orig` and `text`.
    pub fn new(self_ref: impl Into<String>, label: DocItemLabel, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            self_ref: self_ref.into(),
            parent: None,
            children: Vec::new(),
            content_layer: None,
            label,
            prov: Vec::new(),
            orig: text.clone(),
            text,
            formatting: None,
            hyperlink: None,
            captions: None,
            references: None,
            footnotes: None,
            image: None,
            level: None,
            enumerated: None,
            marker: None,
            code_language: None,
        }
    }
}

/// Table node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableItem {
    /// Pointer to this node
    pub self_ref: String,
    /// Pointer to the parent node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemRef>,
    /// Ordered child pointers
    #[serde(default)]
    pub children: Vec<ItemRef>,
    /// Content layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_layer: Option<ContentLayer>,
    /// Item label
    pub label: DocItemLabel,
    /// Provenance
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    /// Caption nodes
    #[serde(default)]
    pub captions: Vec<ItemRef>,
    /// Reference nodes
    #[serde(default)]
    pub references: Vec<ItemRef>,
    /// Footnote nodes
    #[serde(default)]
    pub footnotes: Vec<ItemRef>,
    /// Rendered image of the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Cell data
    pub data: TableData,
    /// Table annotations (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<serde_json::Value>>,
}

/// Picture node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PictureItem {
    /// Pointer to this node
    pub self_ref: String,
    /// Pointer to the parent node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemRef>,
    /// Ordered child pointers
    #[serde(default)]
    pub children: Vec<ItemRef>,
    /// Content layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_layer: Option<ContentLayer>,
    /// Item label
    pub label: DocItemLabel,
    /// Provenance
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    /// Caption nodes
    #[serde(default)]
    pub captions: Vec<ItemRef>,
    /// Reference nodes
    #[serde(default)]
    pub references: Vec<ItemRef>,
    /// Footnote nodes
    #[serde(default)]
    pub footnotes: Vec<ItemRef>,
    /// Rendered image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Classifier/description annotations (opaque)
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

/// Key-value region or form node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyValueItem {
    /// Pointer to this node
    pub self_ref: String,
    /// Pointer to the parent node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemRef>,
    /// Ordered child pointers
    #[serde(default)]
    pub children: Vec<ItemRef>,
    /// Content layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_layer: Option<ContentLayer>,
    /// Item label
    pub label: DocItemLabel,
    /// Provenance
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    /// Caption nodes
    #[serde(default)]
    pub captions: Vec<ItemRef>,
    /// Reference nodes
    #[serde(default)]
    pub references: Vec<ItemRef>,
    /// Footnote nodes
    #[serde(default)]
    pub footnotes: Vec<ItemRef>,
    /// Rendered image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Key/value graph (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ref_serde() {
        let r = ItemRef::item(Collection::Texts, 3);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r##"{"$ref":"#/texts/3"}"##);

        let back: ItemRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_item_ref_target() {
        assert_eq!(ItemRef::body().target().unwrap(), RefTarget::Body);
        assert_eq!(ItemRef::furniture().target().unwrap(), RefTarget::Furniture);
        assert_eq!(
            ItemRef::new("#/key_value_items/12").target().unwrap(),
            RefTarget::Item {
                collection: Collection::KeyValueItems,
                index: 12
            }
        );
    }

    #[test]
    fn test_item_ref_target_invalid() {
        for bad in ["texts/0", "#/texts", "#/texts/x", "#/widgets/0", "#/", ""] {
            assert!(
                matches!(ItemRef::new(bad).target(), Err(Error::InvalidReference(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_text_item_skips_absent_fields() {
        let mut item = TextItem::new("#/texts/0", DocItemLabel::Paragraph, "Hello");
        item.parent = Some(ItemRef::body());
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r##"{"self_ref":"#/texts/0","parent":{"$ref":"#/body"},"children":[],"label":"paragraph","prov":[],"orig":"Hello","text":"Hello"}"##
        );
    }

    #[test]
    fn test_label_names_match_serde() {
        for label in [
            DocItemLabel::SectionHeader,
            DocItemLabel::CheckboxUnselected,
            DocItemLabel::KeyValueRegion,
            DocItemLabel::DocumentIndex,
        ] {
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.as_str()));
        }
    }

    #[test]
    fn test_provenance_charspan_is_array() {
        let prov = ProvenanceItem {
            page_no: 1,
            bbox: BoundingBox {
                l: 0.0,
                t: 10.0,
                r: 100.0,
                b: 30.0,
                coord_origin: CoordOrigin::BottomLeft,
            },
            charspan: (0, 9),
        };
        let value = serde_json::to_value(&prov).unwrap();
        assert_eq!(value["charspan"], serde_json::json!([0, 9]));
        assert_eq!(value["bbox"]["coord_origin"], "BOTTOMLEFT");
        assert_eq!(prov.bbox.width(), 100.0);
        assert_eq!(prov.bbox.height(), 20.0);
    }

    #[test]
    fn test_code_item_keeps_floating_fields() {
        let json = r##"{"self_ref":"#/texts/2","parent":{"$ref":"#/body"},"children":[],"label":"code","prov":[],"orig":"x = 1","text":"x = 1","captions":[],"references":[],"footnotes":[],"code_language":"Python"}"##;
        let item: TextItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.captions.as_deref(), Some(&[][..]));
        assert_eq!(item.code_language.as_deref(), Some("Python"));
        assert_eq!(serde_json::to_string(&item).unwrap(), json);
    }

    #[test]
    fn test_heading_level_follows_formatting() {
        let mut item = TextItem::new("#/texts/0", DocItemLabel::SectionHeader, "Intro");
        item.level = Some(1);
        item.formatting = Some(Formatting::default());
        let json = serde_json::to_string(&item).unwrap();
        let formatting = json.find("\"formatting\"").unwrap();
        let level = json.find("\"level\"").unwrap();
        assert!(formatting < level);
    }

    #[test]
    fn test_unknown_item_field_rejected() {
        let json = r##"{"self_ref":"#/texts/0","label":"text","orig":"a","text":"a","font":"serif"}"##;
        let err = serde_json::from_str::<TextItem>(json).unwrap_err();
        assert!(err.to_string().contains("font"));
    }
}
