// src/models/keywords.rs

//! Industry keyword groups.

use serde::{Deserialize, Serialize};

/// Terms for one eligible industry, searched as a single OR query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    /// Industry name, used in logs
    pub name: String,

    /// Search terms
    pub terms: Vec<String>,
}

impl KeywordGroup {
    pub fn new(name: impl Into<String>, terms: &[&str]) -> Self {
        Self {
            name: name.into(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// The disjunctive query string sent to the job source.
    pub fn query(&self) -> String {
        self.terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_joins_terms_with_or() {
        let group = KeywordGroup::new("fishing", &["fishing", " deckhand ", "", "tree felling"]);
        assert_eq!(group.query(), "fishing OR deckhand OR tree felling");
    }
}
