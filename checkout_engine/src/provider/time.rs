use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

const PROVIDER_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Renders `t` as `yyyyMMddHHmmss` on the provider's wall clock.
pub fn format_provider_time(t: DateTime<Utc>, offset: FixedOffset) -> String {
    t.with_timezone(&offset).format(PROVIDER_TIME_FORMAT).to_string()
}

/// Parses a `yyyyMMddHHmmss` provider timestamp. Returns `None` for anything malformed.
pub fn parse_provider_time(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), PROVIDER_TIME_FORMAT).ok()?;
    offset.from_local_datetime(&naive).single().map(|t| t.with_timezone(&Utc))
}
