//! Plain text rendering for structured documents.

use crate::error::Result;
use crate::model::DoclingDocument;

/// Convert a document to plain text: body texts and table rows in document
/// order, no markup, separated by blank lines.
pub fn to_text(doc: &DoclingDocument) -> Result<String> {
    Ok(doc.plain_text().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocItemLabel, GroupLabel};

    #[test]
    fn test_to_text() {
        let mut doc = DoclingDocument::new("sample");
        doc.add_title("Hello, world!", None).unwrap();
        let list = doc.add_group(GroupLabel::List, "list", None).unwrap();
        doc.add_list_item("item", false, None, Some(&list)).unwrap();
        doc.add_text(DocItemLabel::Paragraph, "Second paragraph.", None)
            .unwrap();

        let result = to_text(&doc).unwrap();
        assert_eq!(result, "Hello, world!\n\nitem\n\nSecond paragraph.");
        assert!(!result.contains('#'));
    }
}
