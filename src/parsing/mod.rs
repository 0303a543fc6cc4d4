//! # Text Parsing Helpers
//!
//! Parsing of textual cell spellings used by the scan capability.
//!
//! ## Module Structure
//!
//! - `literal`: ISO 8601 dates, times, timestamps and UTC offsets
//!
//! ## Error Handling
//!
//! All parsing functions return `eyre::Result` with context naming the
//! offending text. Parsing itself is delegated to chrono.

mod literal;

pub use literal::{parse_date, parse_offset, parse_time, parse_timestamp, TimestampLiteral};
