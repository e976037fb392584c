//! Postcode set resolver.
//!
//! Expands the per-state range tokens of the eligibility rules into flat,
//! deduplicated postcode sets and builds the postcode universe the
//! aggregator queries.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{AppError, Result};
use crate::models::{ALL_SENTINEL, Postcode, RangeCategory, RangeToken, RulesDocument};

/// A region whose tokens include the `ALL` sentinel and were left unexpanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRegion {
    pub category: RangeCategory,
    pub region: String,
}

impl fmt::Display for UnresolvedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} is marked ALL and was not expanded; its postcodes are not counted",
            self.category, self.region
        )
    }
}

/// Output of a resolver run.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The input document with both flat sets replaced
    pub document: RulesDocument,
    pub regional_flat: BTreeSet<Postcode>,
    pub remote_flat: BTreeSet<Postcode>,
    pub unresolved: Vec<UnresolvedRegion>,
}

/// Resolve a rules document. Pure: the caller owns reading and writing it.
pub fn resolve(document: &RulesDocument) -> Result<Resolution> {
    let mut unresolved = Vec::new();

    let regional_flat =
        expand_category(document, RangeCategory::RegionalAustralia, &mut unresolved)?;

    let mut remote_flat =
        expand_category(document, RangeCategory::RemoteVeryRemote, &mut unresolved)?;
    // Tourism special cases are always eligible under remote/very remote.
    remote_flat.extend(document.tourism_extra_postcodes()?);

    for gap in &unresolved {
        log::warn!("{gap}");
    }

    let mut document = document.clone();
    document.set_flat(RangeCategory::RegionalAustralia, &regional_flat);
    document.set_flat(RangeCategory::RemoteVeryRemote, &remote_flat);

    log::info!(
        "Resolved {} regional and {} remote/very remote postcodes ({} unresolved regions)",
        regional_flat.len(),
        remote_flat.len(),
        unresolved.len()
    );

    Ok(Resolution {
        document,
        regional_flat,
        remote_flat,
        unresolved,
    })
}

fn expand_category(
    document: &RulesDocument,
    category: RangeCategory,
    unresolved: &mut Vec<UnresolvedRegion>,
) -> Result<BTreeSet<Postcode>> {
    let mut out = BTreeSet::new();

    for (region, spec) in document.regions(category)? {
        let mut saw_sentinel = false;
        for raw in spec.tokens() {
            let token = RangeToken::parse(raw).map_err(|e| match e {
                AppError::RangeToken { token, message } => AppError::RangeToken {
                    token,
                    message: format!("{message} (in {category}.{region})"),
                },
                other => other,
            })?;
            if token == RangeToken::All {
                saw_sentinel = true;
            }
            token.expand_into(&mut out)?;
        }

        if saw_sentinel {
            unresolved.push(UnresolvedRegion { category, region });
        }
    }

    Ok(out)
}

/// Regions marked `ALL`, found without expanding any token.
pub fn unresolved_regions(document: &RulesDocument) -> Result<Vec<UnresolvedRegion>> {
    let mut out = Vec::new();
    for category in [RangeCategory::RegionalAustralia, RangeCategory::RemoteVeryRemote] {
        for (region, spec) in document.regions(category)? {
            if spec.tokens().iter().any(|t| t.trim() == ALL_SENTINEL) {
                out.push(UnresolvedRegion { category, region });
            }
        }
    }
    Ok(out)
}

/// Every postcode the aggregator must query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostcodeUniverse {
    postcodes: BTreeSet<Postcode>,
}

impl PostcodeUniverse {
    /// Union of the northern list, both flat sets and the tourism extras.
    ///
    /// Fails if the document has not been resolved yet.
    pub fn from_rules(document: &RulesDocument) -> Result<Self> {
        let mut postcodes = document.northern_australia()?;
        for category in [RangeCategory::RegionalAustralia, RangeCategory::RemoteVeryRemote] {
            let flat = document.flat(category)?.ok_or_else(|| {
                AppError::config(format!(
                    "{} is missing; resolve the rules document first",
                    category.flat_key()
                ))
            })?;
            postcodes.extend(flat);
        }
        postcodes.extend(document.tourism_extra_postcodes()?);
        Ok(Self { postcodes })
    }

    pub fn len(&self) -> usize {
        self.postcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postcodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Postcode> {
        self.postcodes.iter()
    }

    pub fn contains(&self, postcode: &Postcode) -> bool {
        self.postcodes.contains(postcode)
    }

    /// Split into at most `parts` disjoint, non-empty subsets (round-robin).
    pub fn partition(&self, parts: usize) -> Vec<PostcodeUniverse> {
        let parts = parts.max(1).min(self.postcodes.len().max(1));
        let mut subsets = vec![PostcodeUniverse::default(); parts];
        for (i, postcode) in self.postcodes.iter().enumerate() {
            subsets[i % parts].postcodes.insert(postcode.clone());
        }
        subsets.retain(|s| !s.is_empty());
        subsets
    }
}

impl FromIterator<Postcode> for PostcodeUniverse {
    fn from_iter<I: IntoIterator<Item = Postcode>>(iter: I) -> Self {
        Self {
            postcodes: iter.into_iter().collect(),
        }
    }
}
