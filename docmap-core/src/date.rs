//! Date coercion for date attributes.

use bson::Bson;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::cast::to_host;

/// Interprets a stored value as a point in time.
///
/// Accepts native timestamps, integer or fractional seconds since the epoch, and strings
/// in `format`, `%Y-%m-%d` or RFC 3339.
pub fn as_date_time(value: &Bson, format: &str) -> Option<DateTime<Utc>> {
    match value {
        Bson::DateTime(dt) => to_host(*dt),
        Bson::Int32(secs) => DateTime::from_timestamp(i64::from(*secs), 0),
        Bson::Int64(secs) => DateTime::from_timestamp(*secs, 0),
        Bson::Double(secs) if secs.is_finite() => {
            DateTime::from_timestamp_millis((secs * 1000.0).trunc() as i64)
        }
        Bson::String(s) => parse_date_string(s, format),
        _ => None,
    }
}

fn parse_date_string(s: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
        return Some(naive.and_utc());
    }

    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());

    if let Ok(date) = NaiveDate::parse_from_str(s, format) {
        return midnight(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return midnight(date);
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a stored value as its canonical date string, if it denotes a point in time.
pub fn format_date(value: &Bson, format: &str) -> Option<String> {
    as_date_time(value, format).map(|dt| dt.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DEFAULT_DATE_FORMAT;
    use bson::DateTime as BsonDateTime;

    #[test]
    fn different_representations_format_alike() {
        let native = Bson::DateTime(BsonDateTime::from_millis(1_577_836_800_000));
        let seconds = Bson::Int64(1_577_836_800);
        let text = Bson::String("2020-01-01 00:00:00".into());
        let date_only = Bson::String("2020-01-01".into());
        let rfc = Bson::String("2020-01-01T01:00:00+01:00".into());

        let expected = Some("2020-01-01 00:00:00".to_string());

        for value in [native, seconds, text, date_only, rfc] {
            assert_eq!(format_date(&value, DEFAULT_DATE_FORMAT), expected);
        }
    }

    #[test]
    fn non_dates_do_not_format() {
        assert_eq!(format_date(&Bson::Boolean(true), DEFAULT_DATE_FORMAT), None);
        assert_eq!(format_date(&Bson::String("soon".into()), DEFAULT_DATE_FORMAT), None);
    }
}
