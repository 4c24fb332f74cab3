//! Converter for plain text and Markdown sources.
//!
//! Plain text becomes one paragraph per blank-line separated block. Markdown
//! is read line by line: ATX headings, bullet and numbered lists (nested by
//! indentation), task-list checkboxes, fenced code, `$$` formulas, pipe
//! tables and images become the matching nodes; everything else is paragraph
//! text.

use crate::error::Result;
use crate::model::{
    DocItemLabel, DoclingDocument, DocumentOrigin, GroupLabel, ItemRef, TableData,
};
use crate::source::SourceLocator;
use md5::{Digest, Md5};
use regex::Regex;
use std::sync::OnceLock;

use super::{read_local, ConversionResult, DocumentConverter};

/// Builds a document tree from `.txt` and `.md` files.
#[derive(Debug, Clone, Default)]
pub struct TextDocumentConverter {
    _private: (),
}

impl TextDocumentConverter {
    /// Create a new text converter.
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn load(&self, bytes: &[u8], input: SourceLocator) -> Result<ConversionResult> {
        let text = decode(bytes, &input);
        let markdown = matches!(input.extension().as_deref(), Some("md" | "markdown"));
        let file_name = input.file_name().unwrap_or("document").to_string();
        let name = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => file_name.clone(),
        };

        let origin = DocumentOrigin {
            mimetype: if markdown { "text/markdown" } else { "text/plain" }.to_string(),
            binary_hash: binary_hash(bytes),
            filename: file_name,
            uri: None,
        };

        let mut doc = DoclingDocument::new(name).with_origin(origin);
        if markdown {
            MarkdownBuilder::new(&mut doc).build(&text)?;
        } else {
            for block in patterns().blank_line.split(&text) {
                let block = join_lines(block.lines());
                if !block.is_empty() {
                    doc.add_text(DocItemLabel::Paragraph, block, None)?;
                }
            }
        }

        log::debug!("Built {} nodes from {}", doc.node_count(), input);
        Ok(ConversionResult::new(input, doc))
    }
}

impl DocumentConverter for TextDocumentConverter {
    fn supported_extensions(&self) -> &[&'static str] {
        &["txt", "text", "md", "markdown"]
    }

    fn name(&self) -> &str {
        "text"
    }

    fn convert(&self, source: &SourceLocator) -> Result<ConversionResult> {
        let bytes = read_local(source)?;
        self.load(&bytes, source.clone())
    }

    fn convert_bytes(&self, bytes: &[u8], name: &str) -> Result<ConversionResult> {
        self.load(bytes, SourceLocator::parse(name)?)
    }
}

/// First eight bytes of the MD5 digest, big-endian.
fn binary_hash(bytes: &[u8]) -> u64 {
    let digest = Md5::digest(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

fn decode(bytes: &[u8], input: &SourceLocator) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            log::warn!("{} is not valid UTF-8 ({}), replacing bad bytes", input, e);
            String::from_utf8_lossy(bytes).into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.replace("\r\n", "\n"),
        None => text.replace("\r\n", "\n"),
    }
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Patterns {
    blank_line: Regex,
    heading: Regex,
    fence: Regex,
    bullet: Regex,
    ordered: Regex,
    checkbox: Regex,
    rule: Regex,
    formula: Regex,
    image: Regex,
    table_row: Regex,
    table_separator: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        blank_line: Regex::new(r"\n[ \t]*\n").unwrap(),
        heading: Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap(),
        fence: Regex::new(r"^ {0,3}(`{3,}|~{3,})[ \t]*([\w+#.-]*)").unwrap(),
        bullet: Regex::new(r"^([ \t]*)([-*+])[ \t]+(.*)$").unwrap(),
        ordered: Regex::new(r"^([ \t]*)(\d{1,9}[.)])[ \t]+(.*)$").unwrap(),
        checkbox: Regex::new(r"^\[([ xX])\][ \t]+(.*)$").unwrap(),
        rule: Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap(),
        formula: Regex::new(r"^[ \t]*\$\$(.+?)\$\$[ \t]*$").unwrap(),
        image: Regex::new(r"^[ \t]*!\[([^\]]*)\]\(([^)]*)\)[ \t]*$").unwrap(),
        table_row: Regex::new(r"^[ \t]*\|.*\|[ \t]*$").unwrap(),
        table_separator: Regex::new(r"^[ \t]*\|?(?:[ \t]*:?-+:?[ \t]*\|)+(?:[ \t]*:?-+:?[ \t]*)?$")
            .unwrap(),
    })
}

/// An open list level.
struct OpenList {
    indent: usize,
    ordered: bool,
    group: ItemRef,
    last_item: Option<ItemRef>,
}

/// Line-oriented Markdown reader filling a document.
struct MarkdownBuilder<'d> {
    doc: &'d mut DoclingDocument,
    paragraph: Vec<String>,
    lists: Vec<OpenList>,
    table: Vec<Vec<String>>,
}

impl<'d> MarkdownBuilder<'d> {
    fn new(doc: &'d mut DoclingDocument) -> Self {
        Self {
            doc,
            paragraph: Vec::new(),
            lists: Vec::new(),
            table: Vec::new(),
        }
    }

    fn build(mut self, text: &str) -> Result<()> {
        let p = patterns();
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            if !self.table.is_empty() && !p.table_row.is_match(line) {
                self.flush_table()?;
            }

            if let Some(caps) = p.fence.captures(line) {
                self.flush()?;
                let fence = &caps[1];
                let fence_char = fence.chars().next().unwrap_or('`');
                let language = Some(caps[2].to_string()).filter(|l| !l.is_empty());
                let mut code = Vec::new();
                for line in lines.by_ref() {
                    let closing = line.trim();
                    if closing.len() >= fence.len() && closing.chars().all(|c| c == fence_char) {
                        break;
                    }
                    code.push(line);
                }
                self.doc.add_code(code.join("\n"), language, None)?;
            } else if line.trim().is_empty() {
                self.flush_paragraph()?;
            } else if p.rule.is_match(line) {
                self.flush()?;
            } else if let Some(caps) = p.heading.captures(line) {
                self.flush()?;
                let hashes = caps[1].len();
                let text = caps[2].trim().to_string();
                if hashes == 1 {
                    self.doc.add_title(text, None)?;
                } else {
                    self.doc.add_heading(text, (hashes - 1) as u8, None)?;
                }
            } else if let Some(caps) = p.bullet.captures(line) {
                self.flush_paragraph()?;
                self.list_item(indent_width(&caps[1]), false, &caps[2], &caps[3])?;
            } else if let Some(caps) = p.ordered.captures(line) {
                self.flush_paragraph()?;
                self.list_item(indent_width(&caps[1]), true, &caps[2], &caps[3])?;
            } else if let Some(caps) = p.formula.captures(line) {
                self.flush()?;
                self.doc
                    .add_text(DocItemLabel::Formula, caps[1].trim(), None)?;
            } else if let Some(caps) = p.image.captures(line) {
                self.flush()?;
                let picture = self.doc.add_picture(None)?;
                let alt = caps[1].trim();
                if !alt.is_empty() {
                    let caption = self.doc.add_text(DocItemLabel::Caption, alt, Some(&picture))?;
                    if let Some(item) = self.doc.pictures.last_mut() {
                        item.captions.push(caption);
                    }
                }
            } else if p.table_row.is_match(line) {
                self.flush_paragraph()?;
                self.lists.clear();
                if !p.table_separator.is_match(line) {
                    self.table.push(split_row(line));
                }
            } else {
                self.lists.clear();
                self.paragraph.push(line.trim().to_string());
            }
        }

        self.flush()
    }

    fn list_item(&mut self, indent: usize, ordered: bool, marker: &str, text: &str) -> Result<()> {
        while self.lists.last().is_some_and(|l| l.indent > indent) {
            self.lists.pop();
        }

        let reuse = self
            .lists
            .last()
            .is_some_and(|l| l.indent == indent && l.ordered == ordered);
        if !reuse {
            if self.lists.last().is_some_and(|l| l.indent == indent) {
                self.lists.pop();
            }
            let parent = self.lists.last().and_then(|l| l.last_item.clone());
            let label = if ordered {
                GroupLabel::OrderedList
            } else {
                GroupLabel::List
            };
            let name = if ordered { "ordered list" } else { "list" };
            let group = self.doc.add_group(label, name, parent.as_ref())?;
            self.lists.push(OpenList {
                indent,
                ordered,
                group,
                last_item: None,
            });
        }

        let Some(list) = self.lists.last_mut() else {
            return Ok(());
        };
        let item = match patterns().checkbox.captures(text) {
            Some(caps) => {
                let label = if &caps[1] == " " {
                    DocItemLabel::CheckboxUnselected
                } else {
                    DocItemLabel::CheckboxSelected
                };
                self.doc.add_text(label, caps[2].trim(), Some(&list.group))?
            }
            None => self.doc.add_list_item(
                text.trim(),
                ordered,
                Some(marker.to_string()),
                Some(&list.group),
            )?,
        };
        list.last_item = Some(item);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flush_paragraph()?;
        self.flush_table()?;
        self.lists.clear();
        Ok(())
    }

    fn flush_paragraph(&mut self) -> Result<()> {
        if self.paragraph.is_empty() {
            return Ok(());
        }
        let text = join_lines(self.paragraph.iter().map(String::as_str));
        self.paragraph.clear();
        if !text.is_empty() {
            self.doc.add_text(DocItemLabel::Paragraph, text, None)?;
        }
        Ok(())
    }

    fn flush_table(&mut self) -> Result<()> {
        if self.table.is_empty() {
            return Ok(());
        }
        let width = self.table.iter().map(Vec::len).max().unwrap_or(0);
        let rows = std::mem::take(&mut self.table).into_iter().map(|mut row| {
            row.resize(width, String::new());
            row
        });
        self.doc.add_table(TableData::from_rows(rows), None)?;
        Ok(())
    }
}

fn indent_width(indent: &str) -> usize {
    indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

fn split_row(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeItem;

    fn convert(text: &str, name: &str) -> DoclingDocument {
        TextDocumentConverter::new()
            .convert_bytes(text.as_bytes(), name)
            .unwrap()
            .document
    }

    fn labels(doc: &DoclingDocument) -> Vec<(DocItemLabel, String)> {
        doc.iterate_items(None, false)
            .filter_map(|(node, _)| match node {
                NodeItem::Text(t) => Some((t.label, t.text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text_paragraphs() {
        let doc = convert("First line\nsame paragraph\n\n  \nSecond\r\n", "notes.txt");
        assert_eq!(doc.name, "notes");
        assert_eq!(
            labels(&doc),
            vec![
                (DocItemLabel::Paragraph, "First line same paragraph".to_string()),
                (DocItemLabel::Paragraph, "Second".to_string()),
            ]
        );
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_plain_text_keeps_markdown_syntax() {
        let doc = convert("# not a heading", "a.txt");
        assert_eq!(doc.texts[0].label, DocItemLabel::Paragraph);
        assert_eq!(doc.texts[0].text, "# not a heading");
    }

    #[test]
    fn test_origin() {
        let doc = convert("hello", "hello.md");
        let origin = doc.origin.unwrap();
        assert_eq!(origin.mimetype, "text/markdown");
        assert_eq!(origin.filename, "hello.md");
        // md5("hello") = 5d41402abc4b2a76...
        assert_eq!(origin.binary_hash, 0x5d41402abc4b2a76);
    }

    #[test]
    fn test_markdown_headings() {
        let doc = convert("# Title\n\n## Section ##\n\n### Sub\ntext", "a.md");
        assert_eq!(doc.texts[0].label, DocItemLabel::Title);
        assert_eq!(doc.texts[1].label, DocItemLabel::SectionHeader);
        assert_eq!(doc.texts[1].text, "Section");
        assert_eq!(doc.texts[1].level, Some(1));
        assert_eq!(doc.texts[2].level, Some(2));
        assert_eq!(doc.texts[3].text, "text");
    }

    #[test]
    fn test_markdown_lists() {
        let doc = convert("- a\n- b\n  - nested\n- c\n\n1. one\n2) two\n", "a.md");
        assert_eq!(doc.groups.len(), 3);
        assert_eq!(doc.groups[0].label, GroupLabel::List);
        assert_eq!(doc.groups[0].children.len(), 3);
        // The nested list hangs off item "b".
        assert_eq!(doc.groups[1].parent.as_ref().unwrap().as_str(), "#/texts/1");
        assert_eq!(doc.groups[2].label, GroupLabel::OrderedList);
        assert_eq!(doc.texts[5].marker.as_deref(), Some("2)"));
        assert_eq!(doc.texts[5].enumerated, Some(true));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_markdown_checkboxes() {
        let doc = convert("- [x] done\n- [ ] open", "a.md");
        assert_eq!(doc.texts[0].label, DocItemLabel::CheckboxSelected);
        assert_eq!(doc.texts[0].text, "done");
        assert_eq!(doc.texts[1].label, DocItemLabel::CheckboxUnselected);
    }

    #[test]
    fn test_markdown_code_fence() {
        let doc = convert("```rust\nfn main() {}\n\n# not heading\n```\nafter", "a.md");
        assert_eq!(doc.texts[0].label, DocItemLabel::Code);
        assert_eq!(doc.texts[0].code_language.as_deref(), Some("rust"));
        assert_eq!(doc.texts[0].text, "fn main() {}\n\n# not heading");
        assert_eq!(doc.texts[1].text, "after");
    }

    #[test]
    fn test_markdown_unclosed_fence() {
        let doc = convert("~~~\nline", "a.md");
        assert_eq!(doc.texts[0].label, DocItemLabel::Code);
        assert_eq!(doc.texts[0].code_language, None);
        assert_eq!(doc.texts[0].text, "line");
    }

    #[test]
    fn test_markdown_table() {
        let doc = convert("| Name | Qty |\n|---|:---:|\n| a \\| b | 3 |\n| c |\n", "a.md");
        let data = &doc.tables[0].data;
        assert_eq!(data.num_rows, 3);
        assert_eq!(data.num_cols, 2);
        assert_eq!(
            data.text_grid(),
            vec![
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["a | b".to_string(), "3".to_string()],
                vec!["c".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn test_markdown_formula_image_rule() {
        let doc = convert("$$E=mc^2$$\n\n---\n\n![A chart](chart.png)", "a.md");
        assert_eq!(doc.texts[0].label, DocItemLabel::Formula);
        assert_eq!(doc.texts[0].text, "E=mc^2");
        assert_eq!(doc.pictures.len(), 1);
        assert_eq!(doc.pictures[0].captions[0].as_str(), "#/texts/1");
        assert_eq!(doc.texts[1].label, DocItemLabel::Caption);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_remote_rejected() {
        let source = SourceLocator::parse("https://example.com/a.md").unwrap();
        assert!(TextDocumentConverter::new().convert(&source).is_err());
    }
}
