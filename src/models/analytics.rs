use serde::{Deserialize, Serialize};

/// Aggregated score for one standard across every stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStat {
    pub standard: String,
    pub avg_score: f64,
    pub total_reports: u32,
}

/// Improvement suggestion attached to a standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub standard: String,
    pub suggestion: String,
}
