//! Canonical code types.
//!
//! Registry exports mix numeric and text encodings for the same code: a
//! topography code may arrive as `339`, `"0339"`, `"33.9"`, `"C33.9"` or, after
//! a spreadsheet round-trip, `339.0`. Every code is canonicalized once at
//! ingestion and compared in canonical form afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodeError;

/// Strips a spreadsheet float suffix (`"2201.0"` -> `"2201"`).
///
/// Returns the input unchanged when the fractional part is not all zeros.
fn strip_float_artifact(value: &str) -> &str {
    match value.split_once('.') {
        Some((int, frac))
            if !int.is_empty()
                && !frac.is_empty()
                && int.chars().all(|ch| ch.is_ascii_digit())
                && frac.chars().all(|ch| ch == '0') =>
        {
            int
        }
        _ => value,
    }
}

fn strip_leading_zeros(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// ICD-O topography (anatomical site) code without the `C` prefix or the
/// decimal point, e.g. `339` for C33.9.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteCode(String);

impl SiteCode {
    /// Canonicalizes a raw site code; malformed input yields `None`.
    ///
    /// - an optional `C` prefix is dropped
    /// - with the prefix, or with a non-zero fraction, the decimal point is
    ///   removed (`C33.9`, `33.9` -> `339`)
    /// - without the prefix an all-zero fraction is a float artifact
    ///   (`339.0` -> `339`)
    /// - leading zeros are dropped (`0339` -> `339`)
    ///
    /// An unprefixed `34.0` is therefore `34`, not `340`; write `C34.0` or
    /// `340` for the decimal form. [`SiteCode::has_ambiguous_fraction`] flags
    /// such values.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (prefixed, body) = match trimmed.strip_prefix(['C', 'c']) {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return None;
        }
        let digits = match body.split_once('.') {
            Some((int, frac)) => {
                let all_digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
                if int.is_empty() || !all_digits(int) || !all_digits(frac) {
                    return None;
                }
                if !prefixed && !frac.is_empty() && frac.chars().all(|ch| ch == '0') {
                    int.to_string()
                } else {
                    format!("{int}{frac}")
                }
            }
            None => {
                if !body.chars().all(|ch| ch.is_ascii_digit()) {
                    return None;
                }
                body.to_string()
            }
        };
        Some(Self(strip_leading_zeros(&digits)))
    }

    /// True for an unprefixed two-digit code with an all-zero fraction
    /// (`34.0`), which `parse` reads as a float artifact.
    pub fn has_ambiguous_fraction(raw: &str) -> bool {
        let trimmed = raw.trim();
        match trimmed.split_once('.') {
            Some((int, frac)) => {
                int.len() == 2
                    && int.chars().all(|ch| ch.is_ascii_digit())
                    && !frac.is_empty()
                    && frac.chars().all(|ch| ch == '0')
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SiteCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CodeError::InvalidSite(s.to_string()))
    }
}

/// Administrative region (commune) code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = strip_float_artifact(raw.trim());
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Some(Self(strip_leading_zeros(trimmed)));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CodeError::InvalidRegion(s.to_string()))
    }
}

/// National person identifier shared by the tumor and mortality registries.
///
/// Thousands separators and whitespace are removed, the check digit is
/// uppercased, and leading zeros are dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonId(String);

impl PersonId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = strip_float_artifact(raw.trim());
        let cleaned: String = trimmed
            .chars()
            .filter(|ch| *ch != '.' && !ch.is_whitespace())
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        let cleaned = cleaned.trim_start_matches('0');
        if cleaned.is_empty() || !cleaned.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        {
            return None;
        }
        Some(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PersonId {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CodeError::InvalidPersonId(s.to_string()))
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(SiteCode);
string_serde!(RegionCode);
string_serde!(PersonId);
