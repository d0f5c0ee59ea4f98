use chrono::{DateTime, SecondsFormat, Utc};

/// Format `DateTime<Utc>` as RFC 3339 with 3-digit fractional seconds and a `Z` suffix.
///
/// Stored timestamps use this form, so lexical order equals time order.
pub fn to_rfc3339_ms(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored timestamp format.
pub fn now_rfc3339_ms() -> String {
    to_rfc3339_ms(&Utc::now())
}
