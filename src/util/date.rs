pub use time::{Date, PrimitiveDateTime};
use time::{macros::format_description, Time};

pub type StaticDateFormat<'a> =
    &'static [time::format_description::BorrowedFormatItem<'a>];

/// Date-only cells in the report ("21.01.2021").
pub const REPORT_DATE_FORMAT: StaticDateFormat =
    format_description!("[day].[month].[year]");

/// Trade rows carry the execution date and time in two adjacent cells,
/// joined with a space before parsing.
pub const REPORT_DATE_TIME_FORMAT: StaticDateFormat =
    format_description!("[day].[month].[year] [hour]:[minute]:[second]");

/// Rendering format for statement output and generated ids.
pub const RENDER_DATE_TIME_FORMAT: StaticDateFormat =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn parse_report_date(date_str: &str) -> Result<Date, time::error::Parse> {
    Date::parse(date_str, REPORT_DATE_FORMAT)
}

pub fn parse_report_date_time(
    dt_str: &str,
) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(dt_str, REPORT_DATE_TIME_FORMAT)
}

/// Cash-flow rows have no time component; they land on midnight.
pub fn date_at_midnight(d: Date) -> PrimitiveDateTime {
    PrimitiveDateTime::new(d, Time::MIDNIGHT)
}

pub fn render_date_time(dt: &PrimitiveDateTime) -> String {
    dt.format(RENDER_DATE_TIME_FORMAT)
        .unwrap_or_else(|_| dt.to_string())
}
