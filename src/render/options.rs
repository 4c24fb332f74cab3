//! Rendering options and configuration.

use std::ops::RangeInclusive;

/// Placeholder emitted for pictures by default.
pub const DEFAULT_IMAGE_PLACEHOLDER: &str = "<!-- image -->";

/// Options for Markdown rendering.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Text emitted for each picture (empty = emit nothing)
    pub image_placeholder: String,

    /// Render the furniture tree (page headers, footers) before the body
    pub include_furniture: bool,

    /// Escape `_` as `\_` outside code and formulas
    pub escape_underscores: bool,

    /// Character to use for unordered list markers
    pub list_marker: char,

    /// Spaces per nesting level of lists
    pub list_indent: usize,

    /// Maximum heading level (1-6)
    pub max_heading_level: u8,

    /// How to render tables with merged cells
    pub table_fallback: TableFallback,

    /// Pages whose items are rendered
    pub page_selection: PageSelection,
}

impl MarkdownOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the picture placeholder.
    pub fn with_image_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.image_placeholder = placeholder.into();
        self
    }

    /// Enable or disable furniture rendering.
    pub fn with_furniture(mut self, include: bool) -> Self {
        self.include_furniture = include;
        self
    }

    /// Enable or disable underscore escaping.
    pub fn with_escape_underscores(mut self, escape: bool) -> Self {
        self.escape_underscores = escape;
        self
    }

    /// Set the list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Set the list indentation width.
    pub fn with_list_indent(mut self, indent: usize) -> Self {
        self.list_indent = indent;
        self
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Set the table fallback mode.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.table_fallback = fallback;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            image_placeholder: DEFAULT_IMAGE_PLACEHOLDER.to_string(),
            include_furniture: false,
            escape_underscores: false,
            list_marker: '-',
            list_indent: 4,
            max_heading_level: 6,
            table_fallback: TableFallback::Markdown,
            page_selection: PageSelection::All,
        }
    }
}

/// How to render tables that plain pipe syntax can't express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFallback {
    /// Always use pipe tables; merged cells repeat their text
    #[default]
    Markdown,
    /// Use HTML table tags when a cell spans several rows or columns
    Html,
}

/// Page selection for rendering. Items without provenance are always kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
    /// Render several ranges (sorted, non-overlapping)
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Parse a page selection string (e.g., "all", "2-4", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let number = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("Invalid page number: {:?}", part.trim()))
        };

        let range = |part: &str| match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(format!("{:?} starts after it ends", part.trim()));
                }
                Ok(start..=end)
            }
            None => number(part).map(|page| page..=page),
        };

        if !s.contains(',') && s.contains('-') {
            return range(s).map(PageSelection::Range);
        }

        let mut ranges = s.split(',').map(range).collect::<Result<Vec<_>, _>>()?;
        ranges.sort_unstable_by_key(|r| *r.start());

        let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
        for next in ranges {
            match merged.last_mut() {
                Some(last) if *next.start() <= last.end().saturating_add(1) => {
                    let end = (*last.end()).max(*next.end());
                    *last = *last.start()..=end;
                }
                _ => merged.push(next),
            }
        }
        Ok(PageSelection::Ranges(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_options_builder() {
        let options = MarkdownOptions::new()
            .with_image_placeholder("")
            .with_furniture(true)
            .with_max_heading(9)
            .with_table_fallback(TableFallback::Html);

        assert!(options.image_placeholder.is_empty());
        assert!(options.include_furniture);
        assert_eq!(options.max_heading_level, 6);
        assert_eq!(options.table_fallback, TableFallback::Html);
    }

    #[test]
    fn test_markdown_options_default() {
        let options = MarkdownOptions::default();
        assert_eq!(options.image_placeholder, "<!-- image -->");
        assert!(!options.escape_underscores);
        assert!(!options.include_furniture);
        assert_eq!(options.list_marker, '-');
    }

    #[test]
    fn test_page_selection_includes() {
        assert!(PageSelection::All.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3]);
        assert!(pages.includes(3));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse(" ").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("2-4").unwrap(),
            PageSelection::Range(2..=4)
        );
        assert_eq!(
            PageSelection::parse("7,1,3-5,3").unwrap(),
            PageSelection::Ranges(vec![1..=1, 3..=5, 7..=7])
        );
        assert_eq!(PageSelection::parse("4").unwrap(), PageSelection::Ranges(vec![4..=4]));
        assert!(PageSelection::parse("1,x").is_err());
    }

    #[test]
    fn test_page_selection_huge_range_stays_compact() {
        let selection = PageSelection::parse("1,1-4294967295").unwrap();
        assert_eq!(selection, PageSelection::Ranges(vec![1..=u32::MAX]));
        assert!(selection.includes(u32::MAX));

        let selection = PageSelection::parse("3-4,5,9-9").unwrap();
        assert_eq!(selection, PageSelection::Ranges(vec![3..=5, 9..=9]));
        assert!(!selection.includes(6));
    }

    #[test]
    fn test_page_selection_rejects_reversed_range() {
        assert!(PageSelection::parse("5-2").is_err());
        assert!(PageSelection::parse("1,5-2").is_err());
    }
}
