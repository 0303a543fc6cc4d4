//! Scanning of chrono types from temporal cells and ISO 8601 text.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::{text_of, FromCell};
use crate::error::ScanError;
use crate::parsing::{parse_date, parse_offset, parse_time, parse_timestamp};
use crate::types::OwnedValue;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const MICROS_PER_DAY: i64 = 86_400_000_000;

fn parse_text<T>(
    cell: &OwnedValue,
    into: &'static str,
    parse: fn(&str) -> eyre::Result<T>,
) -> Result<T, ScanError> {
    let text = text_of(cell, into)?;
    parse(text).map_err(|e| ScanError::Parse {
        value: text.to_string(),
        into,
        reason: format!("{:#}", e),
    })
}

fn utc_from_micros(micros: i64, into: &'static str) -> Result<DateTime<Utc>, ScanError> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| ScanError::OutOfRange {
        value: micros.to_string(),
        into,
    })
}

fn date_from_days(days: i32, into: &'static str) -> Result<NaiveDate, ScanError> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| ScanError::OutOfRange {
            value: days.to_string(),
            into,
        })
}

fn time_from_micros(micros: i64, into: &'static str) -> Result<NaiveTime, ScanError> {
    let out_of_range = || ScanError::OutOfRange {
        value: micros.to_string(),
        into,
    };
    if !(0..MICROS_PER_DAY).contains(&micros) {
        return Err(out_of_range());
    }
    let secs = (micros / 1_000_000) as u32;
    let nanos = (micros % 1_000_000) as u32 * 1_000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).ok_or_else(out_of_range)
}

fn offset_from_secs(secs: i32, into: &'static str) -> Result<FixedOffset, ScanError> {
    FixedOffset::east_opt(secs).ok_or_else(|| ScanError::OutOfRange {
        value: secs.to_string(),
        into,
    })
}

impl FromCell for DateTime<Utc> {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "DateTime<Utc>";
        match cell {
            OwnedValue::Timestamp(micros) | OwnedValue::TimestampTz(micros, _) => {
                utc_from_micros(*micros, into)
            }
            OwnedValue::Date(days) => {
                let micros = i64::from(*days)
                    .checked_mul(MICROS_PER_DAY)
                    .ok_or_else(|| ScanError::OutOfRange {
                        value: days.to_string(),
                        into,
                    })?;
                utc_from_micros(micros, into)
            }
            OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                parse_text(cell, into, parse_timestamp).map(|ts| ts.to_utc())
            }
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl FromCell for NaiveDateTime {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "NaiveDateTime";
        match cell {
            OwnedValue::TimestampTz(micros, offset) => {
                let local = utc_from_micros(*micros, into)?;
                Ok(local.with_timezone(&offset_from_secs(*offset, into)?).naive_local())
            }
            OwnedValue::Timestamp(_) | OwnedValue::Date(_) => {
                DateTime::<Utc>::from_cell(cell).map(|dt| dt.naive_utc())
            }
            OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                parse_text(cell, into, parse_timestamp).map(|ts| ts.to_naive_local())
            }
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl FromCell for NaiveDate {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "NaiveDate";
        match cell {
            OwnedValue::Date(days) => date_from_days(*days, into),
            OwnedValue::Timestamp(_) | OwnedValue::TimestampTz(_, _) => {
                NaiveDateTime::from_cell(cell).map(|dt| dt.date())
            }
            OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                parse_text(cell, into, parse_date)
            }
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl FromCell for NaiveTime {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "NaiveTime";
        match cell {
            OwnedValue::Time(micros) => time_from_micros(*micros, into),
            OwnedValue::Timestamp(_) | OwnedValue::TimestampTz(_, _) => {
                NaiveDateTime::from_cell(cell).map(|dt| dt.time())
            }
            OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                parse_text(cell, into, parse_time)
            }
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl FromCell for FixedOffset {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "FixedOffset";
        match cell {
            OwnedValue::TimestampTz(_, offset) => offset_from_secs(*offset, into),
            OwnedValue::Int(secs) => {
                let secs = i32::try_from(*secs).map_err(|_| ScanError::OutOfRange {
                    value: secs.to_string(),
                    into,
                })?;
                offset_from_secs(secs, into)
            }
            OwnedValue::Text(_) | OwnedValue::Blob(_) => parse_text(cell, into, parse_offset),
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}
