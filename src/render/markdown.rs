//! Markdown rendering for structured documents.

use crate::error::{Error, Result};
use crate::model::{
    ContentLayer, DocItemLabel, DoclingDocument, Formatting, GroupItem, GroupLabel, ItemRef,
    NodeItem, ProvenanceItem, Script, TableData, TextItem,
};
use std::collections::HashSet;

use super::{MarkdownOptions, TableFallback};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &DoclingDocument, options: &MarkdownOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Markdown renderer.
///
/// Walks the furniture tree (when enabled) and then the body in document
/// order. Every rendered node becomes one part; parts are joined by a blank
/// line. Consecutive items of one list form a single part.
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    /// Rendering options.
    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Render a document to Markdown.
    ///
    /// Fails with [`Error::UnresolvedReference`] when a child pointer does
    /// not resolve to a node.
    pub fn render(&self, doc: &DoclingDocument) -> Result<String> {
        let mut pass = Pass {
            doc,
            options: &self.options,
            seen: HashSet::new(),
            parts: Vec::new(),
        };

        if self.options.include_furniture {
            pass.visit_children(&doc.furniture.self_ref, &doc.furniture.children)?;
        }
        pass.visit_children(&doc.body.self_ref, &doc.body.children)?;

        log::debug!(
            "Rendered {:?} to {} Markdown blocks",
            doc.name,
            pass.parts.len()
        );
        Ok(pass.parts.join("\n\n"))
    }
}

/// State of a single rendering pass.
struct Pass<'a> {
    doc: &'a DoclingDocument,
    options: &'a MarkdownOptions,
    seen: HashSet<&'a str>,
    parts: Vec<String>,
}

impl<'a> Pass<'a> {
    fn push(&mut self, part: String) {
        if !part.is_empty() {
            self.parts.push(part);
        }
    }

    fn resolve_all(&self, owner: &str, refs: &'a [ItemRef]) -> Result<Vec<NodeItem<'a>>> {
        refs.iter()
            .map(|r| {
                self.doc
                    .resolve(r)
                    .ok_or_else(|| Error::UnresolvedReference {
                        reference: r.cref.clone(),
                        owner: owner.to_string(),
                    })
            })
            .collect()
    }

    /// Mark a node as visited; false when it was visited already or is out of scope.
    fn enter(&mut self, node: NodeItem<'a>) -> bool {
        self.seen.insert(node.self_ref()) && self.in_scope(node)
    }

    fn in_scope(&self, node: NodeItem<'a>) -> bool {
        match node.content_layer() {
            None | Some(ContentLayer::Body) => {}
            Some(ContentLayer::Furniture) if self.options.include_furniture => {}
            Some(_) => return false,
        }

        let prov: &[ProvenanceItem] = match node {
            NodeItem::Text(t) => {
                if t.label.is_furniture() && !self.options.include_furniture {
                    return false;
                }
                &t.prov
            }
            NodeItem::Table(t) => &t.prov,
            NodeItem::Picture(p) => &p.prov,
            NodeItem::KeyValue(kv) => &kv.prov,
            NodeItem::Group(_) => &[],
        };

        prov.is_empty()
            || prov
                .iter()
                .any(|p| self.options.page_selection.includes(p.page_no))
    }

    fn visit_children(&mut self, owner: &str, refs: &'a [ItemRef]) -> Result<()> {
        for child in self.resolve_all(owner, refs)? {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: NodeItem<'a>) -> Result<()> {
        if !self.enter(node) {
            return Ok(());
        }

        match node {
            NodeItem::Group(group) if group.label.is_list() => {
                let mut lines = Vec::new();
                self.list_lines(group, 0, &mut lines)?;
                self.push(lines.join("\n"));
            }
            NodeItem::Group(group) if group.label == GroupLabel::Inline => {
                let line = self.inline_group(group)?;
                self.push(line);
            }
            NodeItem::Group(group) => self.visit_children(&group.self_ref, &group.children)?,
            NodeItem::Text(item) => {
                let block = self.text_block(item);
                self.push(block);
                self.visit_children(&item.self_ref, &item.children)?;
            }
            NodeItem::Table(table) => {
                let caption = self.captions(&table.self_ref, &table.captions)?;
                self.push(caption);
                let body = self.table(&table.data);
                self.push(body);
                self.visit_children(&table.self_ref, &table.children)?;
            }
            NodeItem::Picture(picture) => {
                let caption = self.captions(&picture.self_ref, &picture.captions)?;
                self.push(caption);
                let placeholder = self.options.image_placeholder.clone();
                self.push(placeholder);
                self.visit_children(&picture.self_ref, &picture.children)?;
            }
            NodeItem::KeyValue(_) => {}
        }
        Ok(())
    }

    fn list_lines(
        &mut self,
        group: &'a GroupItem,
        depth: usize,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        let ordered = group.label == GroupLabel::OrderedList;
        let indent = " ".repeat(self.options.list_indent * depth);
        let mut number = 0;

        for child in self.resolve_all(&group.self_ref, &group.children)? {
            if !self.enter(child) {
                continue;
            }
            match child {
                NodeItem::Text(item) if item.label == DocItemLabel::ListItem => {
                    number += 1;
                    let marker = self.list_marker(item, ordered, number);
                    lines.push(format!("{}{} {}", indent, marker, self.inline_text(item)));
                    self.nested_lines(item, depth + 1, lines)?;
                }
                NodeItem::Group(sub) if sub.label.is_list() => {
                    self.list_lines(sub, depth + 1, lines)?;
                }
                NodeItem::Text(item) => {
                    lines.push(format!("{}{}", indent, self.text_block(item)));
                }
                other => {
                    // Tables and pictures inside lists still get their own block.
                    self.seen.remove(other.self_ref());
                    let before = self.parts.len();
                    self.visit(other)?;
                    let blocks = self.parts.split_off(before);
                    lines.extend(blocks);
                }
            }
        }
        Ok(())
    }

    fn nested_lines(
        &mut self,
        item: &'a TextItem,
        depth: usize,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        let indent = " ".repeat(self.options.list_indent * depth);
        for child in self.resolve_all(&item.self_ref, &item.children)? {
            if !self.enter(child) {
                continue;
            }
            match child {
                NodeItem::Group(sub) if sub.label.is_list() => {
                    self.list_lines(sub, depth, lines)?
                }
                NodeItem::Text(item) => {
                    lines.push(format!("{}{}", indent, self.text_block(item)));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn list_marker(&self, item: &TextItem, ordered: bool, number: usize) -> String {
        if ordered || item.enumerated == Some(true) {
            match item.marker.as_deref().map(str::trim) {
                Some(marker) if !marker.is_empty() => marker.to_string(),
                _ => format!("{}.", number),
            }
        } else {
            self.options.list_marker.to_string()
        }
    }

    fn inline_group(&mut self, group: &'a GroupItem) -> Result<String> {
        let mut words = Vec::new();
        for child in self.resolve_all(&group.self_ref, &group.children)? {
            if !self.enter(child) {
                continue;
            }
            if let NodeItem::Text(item) = child {
                let text = self.text_block(item);
                if !text.is_empty() {
                    words.push(text);
                }
            }
        }
        Ok(words.join(" "))
    }

    fn captions(&mut self, owner: &str, refs: &'a [ItemRef]) -> Result<String> {
        let mut texts = Vec::new();
        for node in self.resolve_all(owner, refs)? {
            if let NodeItem::Text(item) = node {
                self.seen.insert(node.self_ref());
                if !item.text.is_empty() {
                    texts.push(self.inline_text(item));
                }
            }
        }
        Ok(texts.join(" "))
    }

    fn text_block(&self, item: &TextItem) -> String {
        match item.label {
            DocItemLabel::Code => {
                let lang = item.code_language.as_deref().unwrap_or("");
                format!("```{}\n{}\n```", lang, item.text)
            }
            DocItemLabel::Formula if item.text.is_empty() => String::new(),
            DocItemLabel::Formula => format!("$${}$$", item.text),
            _ if item.text.is_empty() => String::new(),
            DocItemLabel::Title => format!("# {}", self.inline_text(item)),
            DocItemLabel::SectionHeader => {
                let level = (item.level.unwrap_or(1) as usize + 1)
                    .min(self.options.max_heading_level as usize)
                    .max(1);
                format!("{} {}", "#".repeat(level), self.inline_text(item))
            }
            DocItemLabel::ListItem => {
                let marker = self.list_marker(item, false, 1);
                format!("{} {}", marker, self.inline_text(item))
            }
            DocItemLabel::CheckboxSelected => format!("- [x] {}", self.inline_text(item)),
            DocItemLabel::CheckboxUnselected => format!("- [ ] {}", self.inline_text(item)),
            _ => self.inline_text(item),
        }
    }

    fn inline_text(&self, item: &TextItem) -> String {
        let mut text = if self.options.escape_underscores {
            escape_underscores(&item.text)
        } else {
            item.text.clone()
        };

        if let Some(ref formatting) = item.formatting {
            text = apply_formatting(&text, formatting);
        }
        if let Some(ref url) = item.hyperlink {
            text = format!("[{}]({})", text, url);
        }
        text
    }

    fn table(&self, data: &TableData) -> String {
        if data.is_empty() {
            return String::new();
        }

        let merged = data
            .table_cells
            .iter()
            .any(|c| c.row_span > 1 || c.col_span > 1);
        if merged && self.options.table_fallback == TableFallback::Html {
            return render_table_html(data);
        }

        let grid = data.text_grid();
        let header_end = data.header_rows().max(1) - 1;
        let mut lines = Vec::with_capacity(grid.len() + 1);

        for (i, row) in grid.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|text| escape_cell(text)).collect();
            lines.push(format!("| {} |", cells.join(" | ")));

            if i == header_end {
                lines.push(format!("|{}", " --- |".repeat(data.num_cols)));
            }
        }

        lines.join("\n")
    }
}

fn render_table_html(data: &TableData) -> String {
    let mut cells: Vec<_> = data.table_cells.iter().collect();
    cells.sort_by_key(|c| (c.start_row_offset_idx, c.start_col_offset_idx));

    let mut output = String::from("<table>\n");
    let mut row = None;
    for cell in cells {
        if row != Some(cell.start_row_offset_idx) {
            if row.is_some() {
                output.push_str("</tr>\n");
            }
            output.push_str("<tr>");
            row = Some(cell.start_row_offset_idx);
        }

        let tag = if cell.column_header { "th" } else { "td" };
        let mut attrs = String::new();
        if cell.row_span > 1 {
            attrs.push_str(&format!(" rowspan=\"{}\"", cell.row_span));
        }
        if cell.col_span > 1 {
            attrs.push_str(&format!(" colspan=\"{}\"", cell.col_span));
        }
        output.push_str(&format!("<{}{}>{}</{}>", tag, attrs, cell.text, tag));
    }
    if row.is_some() {
        output.push_str("</tr>\n");
    }
    output.push_str("</table>");
    output
}

fn apply_formatting(text: &str, formatting: &Formatting) -> String {
    let mut result = text.to_string();

    // Innermost first
    if formatting.strikethrough {
        result = format!("~~{}~~", result);
    }
    if formatting.italic {
        result = format!("*{}*", result);
    }
    if formatting.bold {
        result = format!("**{}**", result);
    }
    match formatting.script {
        Script::Baseline => {}
        Script::Sub => result = format!("<sub>{}</sub>", result),
        Script::Super => result = format!("<sup>{}</sup>", result),
    }
    if formatting.underline {
        result = format!("<u>{}</u>", result);
    }

    result
}

/// Escape underscores that are not escaped already.
fn escape_underscores(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '_' && prev != Some('\\') {
            result.push('\\');
        }
        result.push(c);
        prev = Some(c);
    }
    result
}

fn escape_cell(text: &str) -> String {
    text.trim().replace('\n', " ").replace('|', "\\|")
}
