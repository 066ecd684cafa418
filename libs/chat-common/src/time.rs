use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp the way clients expect it on the wire:
/// RFC 3339 / ISO-8601 in UTC with millisecond precision and a `Z` suffix,
/// e.g. `2025-03-01T12:00:00.000Z`.
pub fn to_iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_z() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 5).unwrap();
        assert_eq!(to_iso8601(ts), "2025-03-01T12:00:05.000Z");
    }

    #[test]
    fn output_parses_back() {
        let now = Utc::now();
        let parsed = DateTime::parse_from_rfc3339(&to_iso8601(now)).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }
}
