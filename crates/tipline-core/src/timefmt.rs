//! Timestamp formatting shared by every report section.
//!
//! The tipline emits `YYYY-MM-DDTHH:MM:SSZ`. Displayed timestamps use a
//! readable UTC form; anything that fails to parse is shown verbatim so
//! malformed provider data never blocks a report.

use chrono::NaiveDateTime;

pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const DISPLAY_FORMAT: &str = "%m/%d/%Y %H:%M:%S UTC";
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%Y";

/// Full timestamp for display, falling back to the raw string.
pub fn display_datetime(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, WIRE_FORMAT) {
        Ok(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Date-only form, used for the report's received date.
pub fn display_date(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, WIRE_FORMAT) {
        Ok(dt) => dt.format(DISPLAY_DATE_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_wire_timestamps() {
        assert_eq!(
            display_datetime("2024-03-01T10:05:09Z"),
            "03/01/2024 10:05:09 UTC"
        );
        assert_eq!(display_date("2024-03-01T10:05:09Z"), "03/01/2024");
    }

    #[test]
    fn unparseable_values_pass_through() {
        assert_eq!(display_datetime("yesterday"), "yesterday");
        assert_eq!(display_date("2024-03-01"), "2024-03-01");
    }
}
