use std::str::FromStr;

use rust_decimal::Decimal;

use crate::util::basic::SError;

/// Parses a number as rendered in the broker report, where the decimal
/// separator is a comma ("5,98").
pub fn parse_report_decimal(s: &str) -> Result<Decimal, SError> {
    let normalized = s.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .map_err(|e| format!("Unable to parse number from \"{s}\": {e}"))
}
