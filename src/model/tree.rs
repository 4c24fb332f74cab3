//! Reference resolution, traversal and validation of the node tree.

use super::{
    Collection, ContentLayer, DoclingDocument, GroupItem, ItemRef, KeyValueItem, PictureItem,
    RefTarget, TableItem, TextItem,
};
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Borrowed view of any node in a document.
#[derive(Debug, Clone, Copy)]
pub enum NodeItem<'a> {
    /// Group (including the roots)
    Group(&'a GroupItem),
    /// Text node
    Text(&'a TextItem),
    /// Table node
    Table(&'a TableItem),
    /// Picture node
    Picture(&'a PictureItem),
    /// Key-value or form node
    KeyValue(&'a KeyValueItem),
}

impl<'a> NodeItem<'a> {
    /// Pointer to the node itself.
    pub fn self_ref(&self) -> &'a str {
        match *self {
            NodeItem::Group(n) => &n.self_ref,
            NodeItem::Text(n) => &n.self_ref,
            NodeItem::Table(n) => &n.self_ref,
            NodeItem::Picture(n) => &n.self_ref,
            NodeItem::KeyValue(n) => &n.self_ref,
        }
    }

    /// Pointer to the parent node.
    pub fn parent(&self) -> Option<&'a ItemRef> {
        match *self {
            NodeItem::Group(n) => n.parent.as_ref(),
            NodeItem::Text(n) => n.parent.as_ref(),
            NodeItem::Table(n) => n.parent.as_ref(),
            NodeItem::Picture(n) => n.parent.as_ref(),
            NodeItem::KeyValue(n) => n.parent.as_ref(),
        }
    }

    /// Ordered child pointers.
    pub fn children(&self) -> &'a [ItemRef] {
        match *self {
            NodeItem::Group(n) => &n.children,
            NodeItem::Text(n) => &n.children,
            NodeItem::Table(n) => &n.children,
            NodeItem::Picture(n) => &n.children,
            NodeItem::KeyValue(n) => &n.children,
        }
    }

    /// Content layer, if recorded.
    pub fn content_layer(&self) -> Option<ContentLayer> {
        match *self {
            NodeItem::Group(n) => n.content_layer,
            NodeItem::Text(n) => n.content_layer,
            NodeItem::Table(n) => n.content_layer,
            NodeItem::Picture(n) => n.content_layer,
            NodeItem::KeyValue(n) => n.content_layer,
        }
    }

    /// Whether the node is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, NodeItem::Group(_))
    }
}

impl DoclingDocument {
    /// Resolve a pointer to the node it designates.
    pub fn resolve(&self, cref: &ItemRef) -> Option<NodeItem<'_>> {
        match cref.target().ok()? {
            RefTarget::Body => Some(NodeItem::Group(&self.body)),
            RefTarget::Furniture => Some(NodeItem::Group(&self.furniture)),
            RefTarget::Item { collection, index } => match collection {
                Collection::Groups => self.groups.get(index).map(NodeItem::Group),
                Collection::Texts => self.texts.get(index).map(NodeItem::Text),
                Collection::Pictures => self.pictures.get(index).map(NodeItem::Picture),
                Collection::Tables => self.tables.get(index).map(NodeItem::Table),
                Collection::KeyValueItems => self.key_value_items.get(index).map(NodeItem::KeyValue),
                Collection::FormItems => self.form_items.get(index).map(NodeItem::KeyValue),
            },
        }
    }

    /// Depth-first traversal in document order starting at `root` (the body
    /// when `None`). Yields `(node, depth)`; groups are yielded only when
    /// `with_groups` is set. Dangling references are skipped and a node is
    /// never yielded twice.
    pub fn iterate_items(&self, root: Option<&ItemRef>, with_groups: bool) -> ItemIter<'_> {
        let root = root.cloned().unwrap_or_else(ItemRef::body);
        let stack = match self.resolve(&root) {
            Some(node) => vec![(node, 0)],
            None => Vec::new(),
        };
        ItemIter {
            doc: self,
            stack,
            seen: HashSet::new(),
            with_groups,
        }
    }

    /// Check the tree invariants: every child pointer resolves, every node
    /// sits where its `self_ref` says, every child points back at the node
    /// listing it, and no node is reachable twice from the roots.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for root in [&self.body, &self.furniture] {
            let mut stack = vec![NodeItem::Group(root)];
            seen.insert(root.self_ref.as_str());

            while let Some(node) = stack.pop() {
                for child_ref in node.children() {
                    child_ref.target()?;
                    let child = self
                        .resolve(child_ref)
                        .ok_or_else(|| Error::UnresolvedReference {
                            reference: child_ref.cref.clone(),
                            owner: node.self_ref().to_string(),
                        })?;

                    if child.self_ref() != child_ref.as_str() {
                        return Err(Error::InvalidReference(format!(
                            "{} resolves to a node whose self_ref is {}",
                            child_ref,
                            child.self_ref()
                        )));
                    }

                    let parent = child.parent().map(|p| p.as_str());
                    if parent != Some(node.self_ref()) {
                        return Err(Error::InconsistentParent {
                            node: child_ref.cref.clone(),
                            expected: node.self_ref().to_string(),
                            actual: parent.map(str::to_string),
                        });
                    }

                    if !seen.insert(child.self_ref()) {
                        return Err(Error::CyclicReference(child_ref.cref.clone()));
                    }
                    stack.push(child);
                }
            }
        }

        log::debug!(
            "Validated document {:?}: {} of {} nodes reachable",
            self.name,
            seen.len().saturating_sub(2),
            self.node_count()
        );
        Ok(())
    }

    /// Text of the body in document order: text nodes as-is, tables as
    /// tab-separated rows, joined by blank lines.
    pub fn plain_text(&self) -> String {
        self.iterate_items(None, false)
            .filter_map(|(node, _)| match node {
                NodeItem::Text(t) if !t.text.is_empty() => Some(t.text.clone()),
                NodeItem::Table(t) if !t.data.is_empty() => Some(
                    t.data
                        .text_grid()
                        .iter()
                        .map(|row| row.join("\t"))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Iterator returned by [`DoclingDocument::iterate_items`].
pub struct ItemIter<'a> {
    doc: &'a DoclingDocument,
    stack: Vec<(NodeItem<'a>, usize)>,
    seen: HashSet<&'a str>,
    with_groups: bool,
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = (NodeItem<'a>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth)) = self.stack.pop() {
            if !self.seen.insert(node.self_ref()) {
                continue;
            }

            for child_ref in node.children().iter().rev() {
                match self.doc.resolve(child_ref) {
                    Some(child) => self.stack.push((child, depth + 1)),
                    None => log::warn!("Skipping unresolved reference {}", child_ref),
                }
            }

            if self.with_groups || !node.is_group() {
                return Some((node, depth));
            }
        }
        None
    }
}
