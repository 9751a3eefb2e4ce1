use calamine::Data;

/// A structural failure while scanning the report sheet. Carries the
/// 1-based physical row at which the scan gave up.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SheetParseError {
    row: usize,
    msg: String,
}

impl SheetParseError {
    pub fn new(row: usize, msg: String) -> Self {
        SheetParseError { row, msg }
    }

    pub fn row(&self) -> usize {
        self.row
    }
}

impl std::fmt::Display for SheetParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row, self.msg)
    }
}

pub fn cell_str(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

pub fn first_cell_str(row: &[Data]) -> String {
    row.first().map(cell_str).unwrap_or_default()
}

/// Strips all whitespace, including newlines embedded in wrapped header
/// cells ("Номер\nсделки" -> "Номерсделки").
pub fn remove_whitespace(value: &str) -> String {
    value.split_whitespace().collect()
}
