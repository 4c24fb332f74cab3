//! Structured source document model.
//!
//! A [`DoclingDocument`] holds two root groups (`body` and `furniture`) and
//! flat collections of nodes (`texts`, `tables`, `pictures`, ...). Nodes point
//! at their children and parent through `$ref` pointers such as `#/texts/0`,
//! which keeps the tree serializable as plain JSON.

mod document;
mod item;
mod table;
mod tree;

pub use document::{DoclingDocument, DocumentOrigin, PageItem, SCHEMA_NAME, SCHEMA_VERSION};
pub use item::{
    BoundingBox, Collection, ContentLayer, CoordOrigin, DocItemLabel, Formatting, GroupItem,
    GroupLabel, ImageRef, ItemRef, KeyValueItem, PictureItem, ProvenanceItem, RefTarget, Script,
    Size, TableItem, TextItem,
};
pub use table::{TableCell, TableData};
pub use tree::{ItemIter, NodeItem};
