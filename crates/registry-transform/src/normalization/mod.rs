//! Field normalization.
//!
//! - **date**: `YYYYMMDD` and ISO date decoding
//! - **record**: raw tumor rows to typed tumor records

pub mod date;
pub mod record;

pub use date::{CalendarDate, encode_date, format_date, parse_registry_date};
pub use record::{NormalizationReport, NormalizedTable, normalize_tumor_row, normalize_tumor_rows};
