use chrono::{DateTime, NaiveDateTime, Utc};

use crate::model::UserContext;

/// Per-request inputs the edit operation needs beyond the payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub user: UserContext,
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl RequestContext {
    pub fn new(user: UserContext) -> Self {
        Self {
            user,
            if_unmodified_since: None,
        }
    }

    pub fn with_if_unmodified_since(mut self, since: DateTime<Utc>) -> Self {
        self.if_unmodified_since = Some(since);
        self
    }
}

/// Parse an HTTP date in any of the three formats RFC 2616 requires
/// (RFC 1123, RFC 1036, asctime). Returns `None` for anything else.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Format a timestamp as an RFC 1123 HTTP date
pub fn format_http_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_http_date_formats() {
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(expected));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_format_http_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap();
        assert_eq!(format_http_date(&date), "Fri, 01 Mar 2024 12:00:05 GMT");
    }
}
