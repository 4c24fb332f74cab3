//! Table cell data.

use super::{BoundingBox, ItemRef};
use serde::{Deserialize, Serialize};

/// A table cell with its position in the row/column grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableCell {
    /// Cell location on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Number of rows spanned
    #[serde(default = "one")]
    pub row_span: usize,
    /// Number of columns spanned
    #[serde(default = "one")]
    pub col_span: usize,
    /// First row (inclusive)
    pub start_row_offset_idx: usize,
    /// Last row (exclusive)
    pub end_row_offset_idx: usize,
    /// First column (inclusive)
    pub start_col_offset_idx: usize,
    /// Last column (exclusive)
    pub end_col_offset_idx: usize,
    /// Cell text
    pub text: String,
    /// Whether the cell is a column header
    #[serde(default)]
    pub column_header: bool,
    /// Whether the cell is a row header
    #[serde(default)]
    pub row_header: bool,
    /// Whether the cell starts a row section
    #[serde(default)]
    pub row_section: bool,
    /// Whether the text came from OCR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_ocr: Option<bool>,
    /// OCR confidence in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Node holding rich cell content
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub cell_ref: Option<ItemRef>,
}

fn one() -> usize {
    1
}

impl TableCell {
    /// Create a single-span cell at `(row, col)`.
    pub fn new(row: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            bbox: None,
            row_span: 1,
            col_span: 1,
            start_row_offset_idx: row,
            end_row_offset_idx: row + 1,
            start_col_offset_idx: col,
            end_col_offset_idx: col + 1,
            text: text.into(),
            column_header: false,
            row_header: false,
            row_section: false,
            from_ocr: None,
            confidence: None,
            cell_ref: None,
        }
    }

    /// Mark the cell as a column header.
    pub fn header(mut self) -> Self {
        self.column_header = true;
        self
    }

    /// Extend the cell over `rows` x `cols`.
    pub fn with_span(mut self, rows: usize, cols: usize) -> Self {
        self.row_span = rows.max(1);
        self.col_span = cols.max(1);
        self.end_row_offset_idx = self.start_row_offset_idx + self.row_span;
        self.end_col_offset_idx = self.start_col_offset_idx + self.col_span;
        self
    }
}

/// Cells of a table plus its dimensions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableData {
    /// Cells in any order
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Row-major cell grid as written by the converter. Kept verbatim so
    /// the table re-serializes unchanged; see [`TableData::fill_grid`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<Vec<TableCell>>>,
}

impl TableData {
    /// Build table data from a row-major list of rows. The first row is
    /// marked as the column header.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table_cells = Vec::new();
        let mut num_rows = 0;
        let mut num_cols = 0;

        for (r, row) in rows.into_iter().enumerate() {
            num_rows = r + 1;
            for (c, text) in row.into_iter().enumerate() {
                num_cols = num_cols.max(c + 1);
                let cell = TableCell::new(r, c, text);
                table_cells.push(if r == 0 { cell.header() } else { cell });
            }
        }

        let mut data = Self {
            table_cells,
            num_rows,
            num_cols,
            grid: None,
        };
        data.fill_grid();
        data
    }

    /// Rebuild `grid` from `table_cells`. Spanning cells are repeated in
    /// every position they cover; uncovered positions get an empty cell.
    pub fn fill_grid(&mut self) {
        let mut grid: Vec<Vec<TableCell>> = (0..self.num_rows)
            .map(|row| (0..self.num_cols).map(|col| TableCell::new(row, col, "")).collect())
            .collect();

        for cell in &self.table_cells {
            for row in cell.start_row_offset_idx..cell.end_row_offset_idx.min(self.num_rows) {
                for col in cell.start_col_offset_idx..cell.end_col_offset_idx.min(self.num_cols) {
                    grid[row][col] = cell.clone();
                }
            }
        }

        self.grid = Some(grid);
    }

    /// Whether the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.table_cells.is_empty() || self.num_rows == 0 || self.num_cols == 0
    }

    /// Row-major text grid computed from `table_cells`. Spanning cells
    /// repeat their text in every position they cover; uncovered positions
    /// are empty strings.
    pub fn text_grid(&self) -> Vec<Vec<String>> {
        let mut grid = vec![vec![String::new(); self.num_cols]; self.num_rows];

        for cell in &self.table_cells {
            let rows = cell.start_row_offset_idx..cell.end_row_offset_idx.min(self.num_rows);
            for row in rows {
                let cols = cell.start_col_offset_idx..cell.end_col_offset_idx.min(self.num_cols);
                for col in cols {
                    grid[row][col] = cell.text.clone();
                }
            }
        }

        grid
    }

    /// Number of leading rows whose cells are all column headers.
    pub fn header_rows(&self) -> usize {
        (0..self.num_rows)
            .take_while(|&row| {
                let mut cells = self
                    .table_cells
                    .iter()
                    .filter(|c| c.start_row_offset_idx <= row && row < c.end_row_offset_idx)
                    .peekable();
                cells.peek().is_some() && cells.all(|c| c.column_header)
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let data = TableData::from_rows([["Name", "Qty"], ["apple", "3"]]);
        assert_eq!(data.num_rows, 2);
        assert_eq!(data.num_cols, 2);
        assert_eq!(data.table_cells.len(), 4);
        assert!(data.table_cells[0].column_header);
        assert!(!data.table_cells[2].column_header);
        assert_eq!(data.header_rows(), 1);

        let grid = data.grid.as_ref().unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1][0].text, "apple");
        assert!(grid[0][1].column_header);
    }

    #[test]
    fn test_fill_grid_repeats_spans() {
        let mut data = TableData {
            table_cells: vec![TableCell::new(0, 0, "Merged").with_span(1, 2)],
            num_rows: 2,
            num_cols: 2,
            grid: None,
        };
        data.fill_grid();

        let grid = data.grid.unwrap();
        assert_eq!(grid[0][0].text, "Merged");
        assert_eq!(grid[0][1].col_span, 2);
        assert_eq!(grid[1][1].text, "");
        assert_eq!(grid[1][1].start_row_offset_idx, 1);
    }

    #[test]
    fn test_grid_kept_verbatim() {
        let json = r#"{"table_cells":[],"num_rows":1,"num_cols":1,"grid":[[{"row_span":1,"col_span":1,"start_row_offset_idx":0,"end_row_offset_idx":1,"start_col_offset_idx":0,"end_col_offset_idx":1,"text":"x","column_header":false,"row_header":false,"row_section":false}]]}"#;
        let data: TableData = serde_json::from_str(json).unwrap();
        assert_eq!(data.grid.as_ref().unwrap()[0][0].text, "x");
        assert_eq!(serde_json::to_string(&data).unwrap(), json);
    }

    #[test]
    fn test_unknown_cell_field_rejected() {
        let json = r#"{"start_row_offset_idx":0,"end_row_offset_idx":1,"start_col_offset_idx":0,"end_col_offset_idx":1,"text":"x","shade":"grey"}"#;
        assert!(serde_json::from_str::<TableCell>(json).is_err());
    }

    #[test]
    fn test_grid_with_span() {
        let data = TableData {
            table_cells: vec![
                TableCell::new(0, 0, "Merged").header().with_span(1, 2),
                TableCell::new(1, 0, "a"),
                TableCell::new(1, 1, "b"),
            ],
            num_rows: 2,
            num_cols: 2,
            grid: None,
        };

        let grid = data.text_grid();
        assert_eq!(grid[0], vec!["Merged", "Merged"]);
        assert_eq!(grid[1], vec!["a", "b"]);
    }

    #[test]
    fn test_grid_ignores_out_of_range_cells() {
        let data = TableData {
            table_cells: vec![TableCell::new(0, 0, "x").with_span(5, 5)],
            num_rows: 1,
            num_cols: 2,
            grid: None,
        };
        assert_eq!(data.text_grid(), vec![vec!["x".to_string(), "x".to_string()]]);
    }

    #[test]
    fn test_empty_table() {
        let data = TableData::default();
        assert!(data.is_empty());
        assert!(data.text_grid().is_empty());
        assert!(data.grid.is_none());
        assert_eq!(data.header_rows(), 0);
    }

    #[test]
    fn test_cell_span_defaults_on_deserialize() {
        let json = r#"{"start_row_offset_idx":0,"end_row_offset_idx":1,"start_col_offset_idx":0,"end_col_offset_idx":1,"text":"x"}"#;
        let cell: TableCell = serde_json::from_str(json).unwrap();
        assert_eq!(cell.row_span, 1);
        assert_eq!(cell.col_span, 1);
        assert!(!cell.column_header);
    }
}
