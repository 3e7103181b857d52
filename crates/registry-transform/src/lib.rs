//! Registry field transformations.
//!
//! This crate provides the first two pipeline stages:
//!
//! - **normalization**: date decoding and code canonicalization of raw rows
//! - **derive**: age at diagnosis and survival time from normalized dates

pub mod derive;
pub mod normalization;

pub use derive::{DeriveReport, DerivedTable, age_at, derive_fields, elapsed_days};
pub use normalization::{
    CalendarDate, NormalizationReport, NormalizedTable, encode_date, format_date,
    normalize_tumor_row, normalize_tumor_rows, parse_registry_date,
};
