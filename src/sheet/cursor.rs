use calamine::{Data, Range, Rows};
use tracing::info;

use super::common::{first_cell_str, SheetParseError};

/// Number of leading cells inspected when deciding whether a row is blank.
/// Page-break rows keep a page counter ("23 из 28") in far-right cells with
/// no blank separator row, so emptiness of the leading cells is what counts.
pub const BLANK_SCAN_CELLS: usize = 50;

/// Forward-only reader over the physical rows of a worksheet. Skips blank
/// rows and keeps a 1-based row counter for diagnostics.
pub struct RowCursor<'a> {
    rows: Rows<'a, Data>,
    row_num: usize,
}

impl<'a> RowCursor<'a> {
    pub fn new(sheet: &'a Range<Data>) -> Self {
        RowCursor { rows: sheet.rows(), row_num: 0 }
    }

    /// The physical row number of the most recently returned row.
    pub fn row_num(&self) -> usize {
        self.row_num
    }

    /// Returns the next non-blank row, or None at end of input.
    pub fn next_row(&mut self) -> Option<&'a [Data]> {
        for row in self.rows.by_ref() {
            self.row_num += 1;
            if !is_blank(row) {
                return Some(row);
            }
        }
        None
    }

    /// Discards rows until one whose first cell equals `section_header`
    /// exactly. Sections sit at varying offsets depending on report length
    /// and pagination, so this is how all section jumps are made.
    pub fn skip_until(
        &mut self,
        section_header: &str,
    ) -> Result<(), SheetParseError> {
        while let Some(row) = self.next_row() {
            if first_cell_str(row) == section_header {
                info!(
                    "Found section {} header at row {}",
                    section_header, self.row_num
                );
                return Ok(());
            }
        }
        Err(SheetParseError::new(
            self.row_num,
            format!("Section \"{section_header}\" not found"),
        ))
    }
}

fn is_blank(row: &[Data]) -> bool {
    row.iter()
        .take(BLANK_SCAN_CELLS)
        .all(|cell| matches!(cell, Data::Empty))
}

#[cfg(test)]
mod tests {
    use calamine::Data;

    use crate::testlib::sheet::{build_sheet, s};

    use super::RowCursor;

    #[test]
    fn test_blank_and_footer_rows_are_skipped() {
        let mut footer_row = vec![Data::Empty; 53];
        footer_row[52] = s("2 из 8");
        let sheet = build_sheet(vec![
            vec![s("first")],
            vec![],
            footer_row,
            vec![s("second")],
        ]);

        let mut cursor = RowCursor::new(&sheet);
        let row = cursor.next_row().unwrap();
        assert_eq!(row[0], s("first"));
        assert_eq!(cursor.row_num(), 1);

        // Rows 2 and 3 are blank for our purposes.
        let row = cursor.next_row().unwrap();
        assert_eq!(row[0], s("second"));
        assert_eq!(cursor.row_num(), 4);

        assert!(cursor.next_row().is_none());
    }

    #[test]
    fn test_skip_until() {
        let sheet = build_sheet(vec![
            vec![s("preamble")],
            vec![s("2. Операции с денежными средствами")],
            vec![s("data")],
        ]);

        let mut cursor = RowCursor::new(&sheet);
        cursor
            .skip_until("2. Операции с денежными средствами")
            .unwrap();
        assert_eq!(cursor.row_num(), 2);
        assert_eq!(cursor.next_row().unwrap()[0], s("data"));
    }

    #[test]
    fn test_skip_until_requires_exact_match() {
        let sheet = build_sheet(vec![vec![s("2.  Операции с денежными средствами")]]);
        let mut cursor = RowCursor::new(&sheet);
        let err = cursor
            .skip_until("2. Операции с денежными средствами")
            .unwrap_err();
        assert_eq!(err.row(), 1);
        assert!(err.to_string().contains("not found"));
    }
}
