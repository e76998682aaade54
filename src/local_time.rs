use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %I:%M %p %Z";

pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

// Unknown zone names fall back to UTC rather than failing the page.
pub fn timezone_or_utc(name: &str) -> Tz {
    parse_timezone(name).unwrap_or_else(|| {
        tracing::warn!(timezone = name, "unknown timezone, using UTC");
        Tz::UTC
    })
}

/// `2022-09-27T02:00:00Z` in `America/Los_Angeles` becomes
/// `2022-09-26 07:00 PM PDT`.
pub fn to_local_display(utc: &str, timezone: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(utc.trim()).ok()?;
    let tz = parse_timezone(timezone)?;
    Some(parsed.with_timezone(&tz).format(DISPLAY_FORMAT).to_string())
}

pub fn now_in(timezone: &str) -> String {
    let tz = timezone_or_utc(timezone);
    Utc::now()
        .with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::Micros, false)
}
