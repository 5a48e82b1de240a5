//! Value normalization
//!
//! Every parser returns `Option`: malformed input is an empty cell, never an
//! error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Display form of every timestamp column
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const AWARE_MINUTE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%z", "%Y-%m-%d %H:%M%z"];

/// A parsed timestamp, with or without timezone context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Carries an explicit offset (`Z` counts as `+00:00`)
    Aware(DateTime<FixedOffset>),
    /// No timezone information
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Parse an ISO-8601 timestamp
    ///
    /// Accepts RFC 3339 with `Z` or an offset, naive date-times separated by
    /// `T` or a space, minute precision with or without an offset, and bare
    /// dates (midnight).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::Aware(dt));
        }
        if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(Self::Aware(dt));
        }
        if let Some(dt) = raw
            .split_once(' ')
            .and_then(|(date, time)| DateTime::parse_from_rfc3339(&format!("{date}T{time}")).ok())
        {
            return Some(Self::Aware(dt));
        }

        if let Some(dt) = parse_aware_minutes(raw) {
            return Some(Self::Aware(dt));
        }

        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(Self::Naive(dt));
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Self::Naive)
    }

    /// `YYYY-MM-DD HH:MM:SS` in the timestamp's own offset
    pub fn display(&self) -> String {
        match self {
            Self::Aware(dt) => dt.format(DISPLAY_FORMAT).to_string(),
            Self::Naive(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        }
    }

    /// Wall time in UTC; naive timestamps are taken as UTC
    pub fn as_utc_naive(&self) -> NaiveDateTime {
        match self {
            Self::Aware(dt) => dt.naive_utc(),
            Self::Naive(dt) => *dt,
        }
    }

    /// Signed hours from `self` to `later`, unrounded
    pub fn hours_until(&self, later: &Timestamp) -> f64 {
        hours_between(self.as_utc_naive(), later.as_utc_naive())
    }
}

/// `YYYY-MM-DDTHH:MM` followed by `Z` or an offset
fn parse_aware_minutes(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(rest) => format!("{rest}+0000"),
        None => raw.to_string(),
    };
    AWARE_MINUTE_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&raw, format).ok())
}

pub(crate) fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Parse a timestamp, `None` when empty or malformed
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    Timestamp::parse(raw)
}

/// Reformat a raw timestamp for display, `None` when empty or malformed
pub fn format_timestamp(raw: &str) -> Option<String> {
    Timestamp::parse(raw).map(|ts| ts.display())
}

/// Parse a locale-flexible number
///
/// Whitespace (including non-breaking spaces) is removed. When both `,` and
/// `.` occur the right-most one is the decimal separator; a separator that
/// repeats on its own is a grouping separator; a lone separator is decimal.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, _) if dots <= 1 => cleaned,
        (0, _) => cleaned.replace('.', ""),
        (_, 0) if commas == 1 => cleaned.replace(',', "."),
        (_, 0) => cleaned.replace(',', ""),
        _ => {
            let last_comma = cleaned.rfind(',');
            let last_dot = cleaned.rfind('.');
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Milliseconds to minutes, rounded to 2 decimals
pub fn ms_to_minutes(raw: &str) -> Option<f64> {
    parse_number(raw).map(|ms| round2(ms / 60_000.0))
}
