// src/models/report.rs

//! Job count report document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CountPolicy, Postcode};

/// Count attributed to a single postcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoaCount {
    pub count: u64,
}

/// The report written after an aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCountReport {
    /// Time the report was created
    #[serde(rename = "generatedAtUTC")]
    pub generated_at_utc: DateTime<Utc>,

    /// External data sources used
    pub sources: Vec<String>,

    /// Recency window the counts were taken with
    #[serde(default)]
    pub window_days: u32,

    /// How postings matching several keyword groups were counted
    #[serde(default)]
    pub count_policy: CountPolicy,

    /// Known gaps in the postcode universe (e.g. unexpanded `ALL` regions)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// One entry per postcode in the universe
    #[serde(rename = "perPOA")]
    pub per_poa: BTreeMap<Postcode, PoaCount>,
}

impl JobCountReport {
    /// Sum of all per-postcode counts.
    pub fn total(&self) -> u64 {
        self.per_poa.values().map(|c| c.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_document_field_names() {
        let mut per_poa = BTreeMap::new();
        per_poa.insert(Postcode::parse("4870").unwrap(), PoaCount { count: 1 });
        per_poa.insert(Postcode::parse("6701").unwrap(), PoaCount { count: 0 });

        let report = JobCountReport {
            generated_at_utc: Utc::now(),
            sources: vec!["Workforce Australia".into()],
            window_days: 10,
            count_policy: CountPolicy::RawSum,
            warnings: Vec::new(),
            per_poa,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("generatedAtUTC").is_some());
        assert_eq!(value["perPOA"]["4870"]["count"], 1);
        assert_eq!(value["perPOA"]["6701"]["count"], 0);
        assert_eq!(value["countPolicy"], "raw_sum");
        assert!(value.get("warnings").is_none());
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_reads_report_without_metadata() {
        let json = r#"{
            "generatedAtUTC": "2025-08-01T00:00:00Z",
            "sources": ["Workforce Australia"],
            "perPOA": { "0800": { "count": 3 } }
        }"#;
        let report: JobCountReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(report.count_policy, CountPolicy::RawSum);
    }
}
