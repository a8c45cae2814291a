//! Parsing and formatting of the naive campus-local timestamps used throughout
//! the dataset and the API (`2026-04-03T14:00:00` and `2026-04-03`).

use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

/// Parses an ISO-style naive datetime (`YYYY-MM-DDTHH:MM:SS`).
pub fn parse_datetime(input: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(input, format)
}

/// Parses a date (`YYYY-MM-DD`).
pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(input, format)
}

pub fn format_datetime(dt: PrimitiveDateTime) -> Result<String, time::error::Format> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    dt.format(format)
}

/// 12-hour wall-clock rendering for peak-risk display, e.g. `02:30 PM`.
pub fn format_clock(dt: PrimitiveDateTime) -> Result<String, time::error::Format> {
    let format = format_description!("[hour repr:12 padding:zero]:[minute] [period]");
    dt.format(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_iso_datetime() {
        let dt = parse_datetime("2026-04-03T14:30:00").expect("parse datetime");
        assert_eq!(dt, datetime!(2026-04-03 14:30:00));
    }

    #[test]
    fn parses_date_only() {
        let date = parse_date("2026-04-03").expect("parse date");
        assert_eq!(date, datetime!(2026-04-03 00:00:00).date());
    }

    #[test]
    fn rejects_malformed_datetime() {
        assert!(parse_datetime("2026-04-03 14:30").is_err());
        assert!(parse_datetime("not a timestamp").is_err());
    }

    #[test]
    fn round_trips_datetime() {
        let dt = datetime!(2026-04-03 09:05:00);
        assert_eq!(format_datetime(dt).expect("format"), "2026-04-03T09:05:00");
    }

    #[test]
    fn formats_twelve_hour_clock() {
        assert_eq!(
            format_clock(datetime!(2026-04-03 14:30:00)).expect("format"),
            "02:30 PM"
        );
        assert_eq!(
            format_clock(datetime!(2026-04-03 09:05:00)).expect("format"),
            "09:05 AM"
        );
    }
}
