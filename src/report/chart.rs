use serde::Serialize;

use crate::models::ReportRow;

/// Disclosures surfaced on the dashboard insights panel:
/// emissions (305-1..3), energy (302-1), water (303-5).
pub const INSIGHT_WATCH_LIST: &[&str] = &["305-1", "305-2", "305-3", "302-1", "303-5"];

/// Average score of one standard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub standard: String,
    pub avg_score: i64,
}

/// Per-standard average score over the full report, in the order each
/// standard first appears. Ignores display filters.
pub fn chart_series(rows: &[ReportRow]) -> Vec<ChartPoint> {
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(s, _, _)| *s == row.standard) {
            Some((_, total, count)) => {
                *total += row.compliance_score;
                *count += 1;
            }
            None => groups.push((row.standard.as_str(), row.compliance_score, 1)),
        }
    }

    groups
        .into_iter()
        .map(|(standard, total, count)| ChartPoint {
            standard: standard.to_string(),
            avg_score: (total / count as f64).round() as i64,
        })
        .collect()
}

/// Dashboard insight bar. The figures are display placeholders derived
/// from the compliance score, not measured metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub name: String,
    pub value: i64,
    pub change: i64,
    pub benchmark: &'static str,
}

/// Insights for rows whose requirement mentions a watch-listed disclosure.
pub fn insights(rows: &[ReportRow]) -> Vec<Insight> {
    rows.iter()
        .filter_map(|row| {
            let watched = INSIGHT_WATCH_LIST
                .iter()
                .find(|id| row.requirement.contains(**id))?;
            let score = row.compliance_score;
            // Requirements read "<id> <title>"; the insight takes the
            // first title word.
            let name = row
                .requirement
                .split(' ')
                .nth(1)
                .unwrap_or(*watched)
                .to_string();
            Some(Insight {
                name,
                value: if score > 0.0 { (score / 10.0).round() as i64 } else { 0 },
                change: if score > 50.0 { 10 } else { -5 },
                benchmark: if score > 75.0 { "High" } else { "Needs Improvement" },
            })
        })
        .collect()
}
