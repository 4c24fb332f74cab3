//! Document-level types and the builder API.

use super::{
    Collection, DocItemLabel, GroupItem, GroupLabel, ItemRef, PictureItem, RefTarget, Size,
    TableData, TableItem, TextItem,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema name written into every document.
pub const SCHEMA_NAME: &str = "DoclingDocument";

/// Schema version written by [`DoclingDocument::new`].
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A structured source document: two root groups (`body`, `furniture`) and
/// flat item collections linked by `$ref` pointers.
///
/// Field order matches the serialized form, so a parsed document
/// re-serializes to the same JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoclingDocument {
    /// Schema name (`DoclingDocument`)
    pub schema_name: String,

    /// Schema version
    pub version: String,

    /// Document name
    pub name: String,

    /// Where the document was converted from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<DocumentOrigin>,

    /// Root of page headers, footers and other furniture
    #[serde(default = "furniture_root")]
    pub furniture: GroupItem,

    /// Root of the main content
    pub body: GroupItem,

    /// Structural groups
    #[serde(default)]
    pub groups: Vec<GroupItem>,

    /// Text nodes
    #[serde(default)]
    pub texts: Vec<TextItem>,

    /// Picture nodes
    #[serde(default)]
    pub pictures: Vec<PictureItem>,

    /// Table nodes
    #[serde(default)]
    pub tables: Vec<TableItem>,

    /// Key-value nodes
    #[serde(default)]
    pub key_value_items: Vec<super::KeyValueItem>,

    /// Form nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_items: Vec<super::KeyValueItem>,

    /// Pages keyed by 1-indexed page number
    #[serde(default)]
    pub pages: BTreeMap<u32, PageItem>,
}

fn furniture_root() -> GroupItem {
    GroupItem::root("#/furniture")
}

/// Source file information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentOrigin {
    /// MIME type of the source
    pub mimetype: String,

    /// 64-bit hash of the source bytes
    pub binary_hash: u64,

    /// Source file name
    pub filename: String,

    /// Source URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// A page of the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageItem {
    /// Page size in points
    pub size: Size,

    /// Rendered page image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<super::ImageRef>,

    /// 1-indexed page number
    pub page_no: u32,
}

impl DoclingDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema_name: SCHEMA_NAME.to_string(),
            version: SCHEMA_VERSION.to_string(),
            name: name.into(),
            origin: None,
            furniture: furniture_root(),
            body: GroupItem::root("#/body"),
            groups: Vec::new(),
            texts: Vec::new(),
            pictures: Vec::new(),
            tables: Vec::new(),
            key_value_items: Vec::new(),
            form_items: Vec::new(),
            pages: BTreeMap::new(),
        }
    }

    /// Set the document origin.
    pub fn with_origin(mut self, origin: DocumentOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Parse a document from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Total number of nodes in the item collections (roots excluded).
    pub fn node_count(&self) -> usize {
        self.groups.len()
            + self.texts.len()
            + self.pictures.len()
            + self.tables.len()
            + self.key_value_items.len()
            + self.form_items.len()
    }

    /// Whether the body has no content.
    pub fn is_empty(&self) -> bool {
        self.body.children.is_empty()
    }

    /// Add a page.
    pub fn add_page(&mut self, page_no: u32, size: Size) {
        self.pages.insert(
            page_no,
            PageItem {
                size,
                image: None,
                page_no,
            },
        );
    }

    /// Add a structural group under `parent` (body when `None`).
    pub fn add_group(
        &mut self,
        label: GroupLabel,
        name: impl Into<String>,
        parent: Option<&ItemRef>,
    ) -> Result<ItemRef> {
        let cref = ItemRef::item(Collection::Groups, self.groups.len());
        let parent = self.attach(parent, &cref)?;
        self.groups.push(GroupItem {
            self_ref: cref.cref.clone(),
            parent: Some(parent),
            children: Vec::new(),
            content_layer: None,
            name: name.into(),
            label,
        });
        Ok(cref)
    }

    /// Add a text node under `parent` (body when `None`).
    pub fn add_text(
        &mut self,
        label: DocItemLabel,
        text: impl Into<String>,
        parent: Option<&ItemRef>,
    ) -> Result<ItemRef> {
        self.push_text(TextItem::new("", label, text), parent)
    }

    /// Add the document title.
    pub fn add_title(&mut self, text: impl Into<String>, parent: Option<&ItemRef>) -> Result<ItemRef> {
        self.add_text(DocItemLabel::Title, text, parent)
    }

    /// Add a section header at `level` (1 = top-level section).
    pub fn add_heading(
        &mut self,
        text: impl Into<String>,
        level: u8,
        parent: Option<&ItemRef>,
    ) -> Result<ItemRef> {
        let mut item = TextItem::new("", DocItemLabel::SectionHeader, text);
        item.level = Some(level.max(1));
        self.push_text(item, parent)
    }

    /// Add a list item. `parent` should be a list group.
    pub fn add_list_item(
        &mut self,
        text: impl Into<String>,
        enumerated: bool,
        marker: Option<String>,
        parent: Option<&ItemRef>,
    ) -> Result<ItemRef> {
        let mut item = TextItem::new("", DocItemLabel::ListItem, text);
        item.enumerated = Some(enumerated);
        item.marker = marker;
        self.push_text(item, parent)
    }

    /// Add a code block.
    pub fn add_code(
        &mut self,
        text: impl Into<String>,
        language: Option<String>,
        parent: Option<&ItemRef>,
    ) -> Result<ItemRef> {
        let mut item = TextItem::new("", DocItemLabel::Code, text);
        item.code_language = language;
        self.push_text(item, parent)
    }

    /// Add a table.
    pub fn add_table(&mut self, data: TableData, parent: Option<&ItemRef>) -> Result<ItemRef> {
        let cref = ItemRef::item(Collection::Tables, self.tables.len());
        let parent = self.attach(parent, &cref)?;
        self.tables.push(TableItem {
            self_ref: cref.cref.clone(),
            parent: Some(parent),
            children: Vec::new(),
            content_layer: None,
            label: DocItemLabel::Table,
            prov: Vec::new(),
            captions: Vec::new(),
            references: Vec::new(),
            footnotes: Vec::new(),
            image: None,
            data,
            annotations: None,
        });
        Ok(cref)
    }

    /// Add a picture.
    pub fn add_picture(&mut self, parent: Option<&ItemRef>) -> Result<ItemRef> {
        let cref = ItemRef::item(Collection::Pictures, self.pictures.len());
        let parent = self.attach(parent, &cref)?;
        self.pictures.push(PictureItem {
            self_ref: cref.cref.clone(),
            parent: Some(parent),
            children: Vec::new(),
            content_layer: None,
            label: DocItemLabel::Picture,
            prov: Vec::new(),
            captions: Vec::new(),
            references: Vec::new(),
            footnotes: Vec::new(),
            image: None,
            annotations: Vec::new(),
        });
        Ok(cref)
    }

    fn push_text(&mut self, mut item: TextItem, parent: Option<&ItemRef>) -> Result<ItemRef> {
        let cref = ItemRef::item(Collection::Texts, self.texts.len());
        let parent = self.attach(parent, &cref)?;
        item.self_ref = cref.cref.clone();
        item.parent = Some(parent);
        self.texts.push(item);
        Ok(cref)
    }

    /// Append `child` to the children of `parent` and return the parent ref.
    fn attach(&mut self, parent: Option<&ItemRef>, child: &ItemRef) -> Result<ItemRef> {
        let parent = parent.cloned().unwrap_or_else(ItemRef::body);
        let unresolved = || Error::UnresolvedReference {
            reference: parent.cref.clone(),
            owner: child.cref.clone(),
        };

        let children = match parent.target()? {
            RefTarget::Body => &mut self.body.children,
            RefTarget::Furniture => &mut self.furniture.children,
            RefTarget::Item { collection, index } => match collection {
                Collection::Groups => &mut self.groups.get_mut(index).ok_or_else(unresolved)?.children,
                Collection::Texts => &mut self.texts.get_mut(index).ok_or_else(unresolved)?.children,
                Collection::Pictures => {
                    &mut self.pictures.get_mut(index).ok_or_else(unresolved)?.children
                }
                Collection::Tables => &mut self.tables.get_mut(index).ok_or_else(unresolved)?.children,
                Collection::KeyValueItems => {
                    &mut self
                        .key_value_items
                        .get_mut(index)
                        .ok_or_else(unresolved)?
                        .children
                }
                Collection::FormItems => {
                    &mut self.form_items.get_mut(index).ok_or_else(unresolved)?.children
                }
            },
        };

        children.push(child.clone());
        Ok(parent)
    }
}
