//! # Temporal Text Parsing
//!
//! Many drivers hand date/time columns back as text (SQLite always does). This
//! module parses those spellings into chrono values with chrono's own format
//! parser, so the chrono leaf types can be scanned from text cells.
//!
//! ## Supported Formats
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Date | ISO 8601 | `2018-07-18` |
//! | Time | ISO 8601 | `13:59:59.250` |
//! | Timestamp | ISO 8601, `T` or space separator | `2018-07-18 13:59:59` |
//! | Timestamp with zone | trailing `Z`, `UTC` or `±HH[:MM]` | `2018-07-18T13:59:59+02:00` |
//! | UTC offset | `Z`, `UTC` or `±HH[:MM]` | `-05:30` |
//!
//! ## Error Handling
//!
//! All functions return `eyre::Result`; the context names the offending text
//! and the expected spelling, the root cause is chrono's `ParseError`:
//!
//! ```text
//! "invalid date '2018-13-01': expected YYYY-MM-DD"
//! ```

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use eyre::{bail, Result, WrapErr};

const DATE: &str = "%Y-%m-%d";
const TIME: &str = "%H:%M:%S%.f";
const DATE_T_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_SPACE_TIME: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_T_TIME_ZONE: &str = "%Y-%m-%dT%H:%M:%S%.f%#z";
const DATE_SPACE_TIME_ZONE: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// A parsed timestamp, with or without a zone designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLiteral {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl TimestampLiteral {
    /// The instant, reading a naive timestamp as UTC.
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            TimestampLiteral::Naive(naive) => Utc.from_utc_datetime(&naive),
            TimestampLiteral::Zoned(zoned) => zoned.with_timezone(&Utc),
        }
    }

    /// The wall clock as written, dropping any zone.
    pub fn to_naive_local(self) -> NaiveDateTime {
        match self {
            TimestampLiteral::Naive(naive) => naive,
            TimestampLiteral::Zoned(zoned) => zoned.naive_local(),
        }
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE)
        .wrap_err_with(|| format!("invalid date '{}': expected YYYY-MM-DD", s))
}

pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME)
        .wrap_err_with(|| format!("invalid time '{}': expected HH:MM:SS[.ffffff]", s))
}

/// Parses a timestamp. A trailing zone designator yields
/// `TimestampLiteral::Zoned`.
pub fn parse_timestamp(s: &str) -> Result<TimestampLiteral> {
    let s = s.trim();
    let Some(separator) = s.find(['T', ' ']) else {
        bail!(
            "invalid timestamp '{}': expected YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD HH:MM:SS",
            s
        );
    };
    let spaced = s[separator..].starts_with(' ');

    if let Some(local) = s
        .strip_suffix("UTC")
        .or_else(|| s.strip_suffix(['Z', 'z']))
    {
        let naive = parse_naive_timestamp(local.trim_end(), spaced)?;
        return Ok(TimestampLiteral::Zoned(Utc.fix().from_utc_datetime(&naive)));
    }

    if s[separator + 1..].contains(['+', '-']) {
        let format = if spaced { DATE_SPACE_TIME_ZONE } else { DATE_T_TIME_ZONE };
        return DateTime::parse_from_str(s, format)
            .map(TimestampLiteral::Zoned)
            .wrap_err_with(|| {
                format!("invalid timestamp '{}': expected a ±HH[:MM] zone suffix", s)
            });
    }

    parse_naive_timestamp(s, spaced).map(TimestampLiteral::Naive)
}

fn parse_naive_timestamp(s: &str, spaced: bool) -> Result<NaiveDateTime> {
    let format = if spaced { DATE_SPACE_TIME } else { DATE_T_TIME };
    NaiveDateTime::parse_from_str(s, format)
        .wrap_err_with(|| format!("invalid timestamp '{}': expected YYYY-MM-DD HH:MM:SS", s))
}

/// Parses a UTC offset.
pub fn parse_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    if !s.starts_with(['+', '-']) {
        bail!("invalid UTC offset '{}': expected Z or ±HH[:MM]", s);
    }

    let mut parsed = Parsed::new();
    format::parse(&mut parsed, s, StrftimeItems::new("%#z"))
        .and_then(|()| parsed.to_fixed_offset())
        .wrap_err_with(|| format!("invalid UTC offset '{}': expected Z or ±HH[:MM]", s))
}
