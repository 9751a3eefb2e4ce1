use calamine::Data;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use tracing::warn;

use crate::util::decimal::parse_report_decimal;

use super::common::{cell_str, remove_whitespace, SheetParseError};

static EMPTY_CELL: Data = Data::Empty;

/// Maps a section's logical column names to physical cell indexes.
///
/// The same logical table reappears across printed pages, possibly with
/// column drift, so the map is rebuilt from each header row encountered at a
/// section (or sub-section) boundary. Header cells are matched after
/// stripping all whitespace, since long names arrive wrapped over several
/// lines. A column that never shows up is reported once and reads as empty
/// from then on.
pub struct ColumnMap {
    cols: Vec<(String, Option<usize>)>,
}

impl ColumnMap {
    pub fn from_header_row(header_row: &[Data], expected: &[&str]) -> ColumnMap {
        let mut cols: Vec<(String, Option<usize>)> =
            expected.iter().map(|name| (name.to_string(), None)).collect();

        for (idx, cell) in header_row.iter().enumerate() {
            if matches!(cell, Data::Empty) {
                continue;
            }
            let name = remove_whitespace(&cell_str(cell));
            // First match wins; repeated header cells are ignored.
            if let Some(slot) =
                cols.iter_mut().find(|(n, i)| *n == name && i.is_none())
            {
                slot.1 = Some(idx);
            }
        }

        for (name, idx) in &cols {
            if idx.is_none() {
                warn!("Couldn't find location of column {}", name);
            }
        }

        ColumnMap { cols }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.cols
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, idx)| *idx)
    }

    pub fn map_row<'m, 'r>(
        &'m self,
        row: &'r [Data],
        row_num: usize,
    ) -> MappedRow<'m, 'r> {
        MappedRow { map: self, row, row_num }
    }
}

/// One data row viewed through a ColumnMap: cells addressed by logical
/// column name. Unresolved columns read as empty cells.
pub struct MappedRow<'m, 'r> {
    map: &'m ColumnMap,
    row: &'r [Data],
    row_num: usize,
}

impl<'m, 'r> MappedRow<'m, 'r> {
    pub fn row_num(&self) -> usize {
        self.row_num
    }

    pub fn cell(&self, name: &str) -> &'r Data {
        self.map
            .index_of(name)
            .and_then(|idx| self.row.get(idx))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn get_str(&self, name: &str) -> String {
        cell_str(self.cell(name))
    }

    pub fn get_dec(&self, name: &str) -> Result<Decimal, SheetParseError> {
        match self.cell(name) {
            Data::Int(v) => Decimal::from_i64(*v).ok_or_else(|| {
                self.err(format!("{v} in {name} unconvertible to Decimal"))
            }),
            Data::Float(v) => Decimal::from_f64(*v).ok_or_else(|| {
                self.err(format!("{v} in {name} unconvertible to Decimal"))
            }),
            Data::String(s) => parse_report_decimal(s)
                .map_err(|e| self.err(format!("{e} in {name}"))),
            Data::Empty => self.err_res(format!("value in {name} was empty")),
            other => {
                self.err_res(format!("{other:?} in {name} is not a number"))
            }
        }
    }

    fn err(&self, msg: String) -> SheetParseError {
        SheetParseError::new(self.row_num, msg)
    }

    fn err_res(&self, msg: String) -> Result<Decimal, SheetParseError> {
        Err(self.err(msg))
    }
}

#[cfg(test)]
mod tests {
    use calamine::Data;
    use rust_decimal_macros::dec;

    use crate::testlib::sheet::{f, i, s};

    use super::ColumnMap;

    const COLS: &[&str] = &["Датаисполнения", "Операция", "Суммазачисления"];

    #[test]
    fn test_wrapped_and_reordered_headers() {
        // Columns arrive reordered, with names wrapped over multiple lines.
        let header = vec![
            s("Операция"),
            s("Дата\nисполнения"),
            s("Сумма зачисления"),
        ];
        let map = ColumnMap::from_header_row(&header, COLS);

        let row = vec![s("Налог"), s("21.01.2021"), s("11,5")];
        let mapped = map.map_row(&row, 7);
        assert_eq!(mapped.get_str("Датаисполнения"), "21.01.2021");
        assert_eq!(mapped.get_str("Операция"), "Налог");
        assert_eq!(mapped.get_dec("Суммазачисления").unwrap(), dec!(11.5));
        assert_eq!(mapped.row_num(), 7);
    }

    #[test]
    fn test_first_match_wins_on_duplicates() {
        let header = vec![s("Операция"), s("Операция"), s("x")];
        let map = ColumnMap::from_header_row(&header, &["Операция"]);
        let row = vec![s("first"), s("second"), s("y")];
        assert_eq!(map.map_row(&row, 1).get_str("Операция"), "first");
    }

    #[test]
    fn test_missing_column_reads_as_empty() {
        let header = vec![s("Операция")];
        let map = ColumnMap::from_header_row(&header, COLS);
        let row = vec![s("Налог")];
        let mapped = map.map_row(&row, 3);
        assert_eq!(mapped.get_str("Датаисполнения"), "");
        assert_eq!(*mapped.cell("Суммазачисления"), Data::Empty);

        let err = mapped.get_dec("Суммазачисления").unwrap_err();
        assert_eq!(err.row(), 3);
        assert!(err.to_string().contains("was empty"));
    }

    #[test]
    fn test_numeric_cells() {
        let header = vec![s("Суммазачисления")];
        let map = ColumnMap::from_header_row(&header, &["Суммазачисления"]);

        let float_row = vec![f(11956.0)];
        let mapped_f = map.map_row(&float_row, 1);
        assert_eq!(mapped_f.get_dec("Суммазачисления").unwrap(), dec!(11956));

        let int_row = vec![i(14)];
        let mapped_i = map.map_row(&int_row, 1);
        assert_eq!(mapped_i.get_dec("Суммазачисления").unwrap(), dec!(14));

        let bad = vec![s("abc")];
        let mapped_bad = map.map_row(&bad, 1);
        assert!(mapped_bad.get_dec("Суммазачисления").is_err());
    }
}
