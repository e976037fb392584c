// src/models/rules.rs

//! Eligibility rules document.
//!
//! The document is kept as an order-preserving JSON value so that everything
//! except the derived flat sets is written back untouched. Typed views are
//! deserialized on demand from the `definitions` object.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::Postcode;

/// Category holding the northern Australia postcode list.
pub const NORTHERN_AUSTRALIA: &str = "northernAustralia";
/// Category holding per-state regional range tokens.
pub const REGIONAL_AUSTRALIA: &str = "regionalAustralia";
/// Category holding per-state remote/very remote range tokens.
pub const REMOTE_VERY_REMOTE_BY_STATE: &str = "remoteVeryRemoteByState";
/// Literal list of tourism special-case postcodes.
pub const TOURISM_EXTRA_POSTCODES: &str = "tourismExtraPostcodes";
/// Derived flat set for `regionalAustralia`.
pub const REGIONAL_AUSTRALIA_FLAT: &str = "regionalAustraliaFlat";
/// Derived flat set for `remoteVeryRemoteByState` plus tourism extras.
pub const REMOTE_VERY_REMOTE_FLAT: &str = "remoteVeryRemoteFlat";

/// Categories whose per-region tokens the resolver expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCategory {
    RegionalAustralia,
    RemoteVeryRemote,
}

impl RangeCategory {
    /// Key of the source definition.
    pub fn key(self) -> &'static str {
        match self {
            Self::RegionalAustralia => REGIONAL_AUSTRALIA,
            Self::RemoteVeryRemote => REMOTE_VERY_REMOTE_BY_STATE,
        }
    }

    /// Key of the derived flat set.
    pub fn flat_key(self) -> &'static str {
        match self {
            Self::RegionalAustralia => REGIONAL_AUSTRALIA_FLAT,
            Self::RemoteVeryRemote => REMOTE_VERY_REMOTE_FLAT,
        }
    }
}

impl fmt::Display for RangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Tokens for a single region: either a token list or a bare sentinel string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RegionSpec {
    Tokens(Vec<String>),
    Sentinel(String),
}

impl RegionSpec {
    /// Token list view; a bare string is treated as a single token.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Self::Tokens(tokens) => tokens.iter().map(String::as_str).collect(),
            Self::Sentinel(token) => vec![token.as_str()],
        }
    }
}

/// `northernAustralia` is either a flat list or an object with `postcodes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NorthernSpec {
    Flat(Vec<Postcode>),
    Object { postcodes: Vec<Postcode> },
}

/// An eligibility rules document.
#[derive(Debug, Clone, PartialEq)]
pub struct RulesDocument {
    raw: Value,
}

impl RulesDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Wrap an already parsed value, checking it has a `definitions` object.
    pub fn from_value(raw: Value) -> Result<Self> {
        if !raw.get("definitions").is_some_and(Value::is_object) {
            return Err(AppError::validation(
                "rules document has no 'definitions' object",
            ));
        }
        Ok(Self { raw })
    }

    /// The full document.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        self.raw
    }

    fn definitions(&self) -> Option<&Map<String, Value>> {
        self.raw.get("definitions").and_then(Value::as_object)
    }

    fn definition(&self, key: &str) -> Result<&Value> {
        self.definitions()
            .and_then(|definitions| definitions.get(key))
            .ok_or_else(|| AppError::validation(format!("definitions.{key} is missing")))
    }

    /// Per-region token lists for a range category, in document order.
    pub fn regions(&self, category: RangeCategory) -> Result<Vec<(String, RegionSpec)>> {
        let value = self.definition(category.key())?;
        let map = value.as_object().ok_or_else(|| {
            AppError::validation(format!("definitions.{category} must be an object"))
        })?;

        map.iter()
            .map(|(region, spec)| {
                let spec = RegionSpec::deserialize(spec).map_err(|e| {
                    AppError::validation(format!("definitions.{category}.{region}: {e}"))
                })?;
                Ok((region.clone(), spec))
            })
            .collect()
    }

    /// Literal northern Australia postcodes.
    pub fn northern_australia(&self) -> Result<BTreeSet<Postcode>> {
        let spec = NorthernSpec::deserialize(self.definition(NORTHERN_AUSTRALIA)?)
            .map_err(|e| AppError::validation(format!("definitions.{NORTHERN_AUSTRALIA}: {e}")))?;
        let postcodes = match spec {
            NorthernSpec::Flat(postcodes) | NorthernSpec::Object { postcodes } => postcodes,
        };
        Ok(postcodes.into_iter().collect())
    }

    /// Literal tourism special-case postcodes.
    pub fn tourism_extra_postcodes(&self) -> Result<BTreeSet<Postcode>> {
        self.postcode_list(TOURISM_EXTRA_POSTCODES)
    }

    /// A derived flat set, or `None` if the resolver has not written it yet.
    pub fn flat(&self, category: RangeCategory) -> Result<Option<BTreeSet<Postcode>>> {
        match self
            .definitions()
            .and_then(|definitions| definitions.get(category.flat_key()))
        {
            Some(_) => self.postcode_list(category.flat_key()).map(Some),
            None => Ok(None),
        }
    }

    fn postcode_list(&self, key: &str) -> Result<BTreeSet<Postcode>> {
        let postcodes = Vec::<Postcode>::deserialize(self.definition(key)?)
            .map_err(|e| AppError::validation(format!("definitions.{key}: {e}")))?;
        Ok(postcodes.into_iter().collect())
    }

    /// Replace a derived flat set, keeping every other field as is.
    pub fn set_flat(&mut self, category: RangeCategory, postcodes: &BTreeSet<Postcode>) {
        let list = postcodes
            .iter()
            .map(|p| Value::String(p.as_str().to_string()))
            .collect();
        if let Some(definitions) = self.raw.get_mut("definitions").and_then(Value::as_object_mut) {
            definitions.insert(category.flat_key().to_string(), Value::Array(list));
        }
    }
}
