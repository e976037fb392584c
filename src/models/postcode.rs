// src/models/postcode.rs

//! Postcode (POA) and range token types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

/// Sentinel meaning "every postcode in the region".
pub const ALL_SENTINEL: &str = "ALL";

/// Highest value representable as a 4-digit postcode.
const MAX_POSTCODE: u32 = 9999;

/// A 4-digit Australian postcode, always stored zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Postcode(String);

impl Postcode {
    /// Parse a literal postcode. Only exactly four ASCII digits are accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AppError::validation(format!(
                "'{raw}' is not a 4-digit postcode"
            )))
        }
    }

    /// Build a postcode from its numeric value, zero-padding to 4 digits.
    pub fn from_number(value: u32) -> Result<Self> {
        if value > MAX_POSTCODE {
            return Err(AppError::validation(format!(
                "{value} does not fit in a 4-digit postcode"
            )));
        }
        Ok(Self(format!("{value:04}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Postcode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Postcode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A parsed range token from the rules document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeToken {
    /// The "whole region" sentinel; contributes nothing when expanded.
    All,
    /// A single postcode, e.g. `"3139"`.
    Single(u32),
    /// An inclusive interval, e.g. `"2311-2312"`.
    Span(u32, u32),
}

impl RangeToken {
    /// Parse a token. Fails on non-numeric parts, values above 9999, or `B < A`.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw.trim();
        if token == ALL_SENTINEL {
            return Ok(Self::All);
        }

        match token.split_once('-') {
            Some((start, end)) => {
                let start = Self::parse_bound(raw, start)?;
                let end = Self::parse_bound(raw, end)?;
                if end < start {
                    return Err(AppError::range_token(
                        raw,
                        format!("end {end} is before start {start}"),
                    ));
                }
                Ok(Self::Span(start, end))
            }
            None => Ok(Self::Single(Self::parse_bound(raw, token)?)),
        }
    }

    fn parse_bound(raw: &str, part: &str) -> Result<u32> {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::range_token(raw, "expected digits"));
        }
        let value: u32 = part
            .parse()
            .map_err(|e| AppError::range_token(raw, e))?;
        if value > MAX_POSTCODE {
            return Err(AppError::range_token(raw, "value exceeds 9999"));
        }
        Ok(value)
    }

    /// Expand into zero-padded postcodes, adding them to `out`.
    pub fn expand_into(self, out: &mut BTreeSet<Postcode>) -> Result<()> {
        let (start, end) = match self {
            Self::All => return Ok(()),
            Self::Single(value) => (value, value),
            Self::Span(start, end) => (start, end),
        };
        for value in start..=end {
            out.insert(Postcode::from_number(value)?);
        }
        Ok(())
    }
}

/// Expand a list of range tokens into a deduplicated postcode set.
///
/// `ALL` sentinels are skipped; callers that need to report them should
/// inspect the tokens with [`RangeToken::parse`].
pub fn expand<S: AsRef<str>>(tokens: &[S]) -> Result<BTreeSet<Postcode>> {
    let mut out = BTreeSet::new();
    for token in tokens {
        RangeToken::parse(token.as_ref())?.expand_into(&mut out)?;
    }
    Ok(out)
}
