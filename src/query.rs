//! Ad-hoc questions over the loaded report.
//!
//! Matching is a case-insensitive substring search across every
//! non-empty text field of a row. Executed queries are kept in a short
//! most-recent-first history.

use std::collections::VecDeque;

use crate::models::ReportRow;

/// Executed queries kept in history.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Found { answer: String, details: String },
    NoMatch,
    EmptyQuery,
    NoReport,
}

impl QueryOutcome {
    /// User-facing headline.
    pub fn answer(&self) -> &str {
        match self {
            Self::Found { answer, .. } => answer,
            Self::NoMatch => "No matching data found for your query.",
            Self::EmptyQuery => "Please enter a query.",
            Self::NoReport => "No report data available. Please upload and analyze a document first.",
        }
    }

    pub fn details(&self) -> &str {
        match self {
            Self::Found { details, .. } => details,
            Self::NoMatch => {
                "Try different keywords, such as a standard name, disclosure id or score."
            }
            Self::EmptyQuery => "Type a standard, requirement, remark or score to search the report.",
            Self::NoReport => "No report is loaded yet, so there is nothing to search.",
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Searchable text of a row, empty fields left out.
fn haystack(row: &ReportRow) -> Vec<String> {
    let mut fields = vec![
        row.standard.clone(),
        row.requirement.clone(),
        row.remarks.clone(),
        row.score_label(),
    ];
    if let Some(omission) = &row.omission {
        fields.push(omission.label());
    }
    if let Some(sector_ref) = &row.sector_ref {
        fields.push(sector_ref.clone());
    }
    fields.retain(|f| !f.is_empty());
    fields
}

fn matches(row: &ReportRow, needle: &str) -> bool {
    haystack(row)
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Run one query against `rows` without touching any history.
pub fn search(text: &str, rows: &[ReportRow]) -> QueryOutcome {
    let text = text.trim();
    if text.is_empty() {
        return QueryOutcome::EmptyQuery;
    }
    if rows.is_empty() {
        return QueryOutcome::NoReport;
    }

    let needle = text.to_lowercase();
    let found: Vec<&ReportRow> = rows.iter().filter(|r| matches(r, &needle)).collect();
    if found.is_empty() {
        return QueryOutcome::NoMatch;
    }

    let mut details = format!("{} matching item(s) found:\n", found.len());
    for (i, row) in found.iter().enumerate() {
        details.push_str(&format!(
            "{}. Standard: {}, Requirement: {}, Score: {}\n",
            i + 1,
            row.standard,
            row.requirement,
            row.score_label()
        ));
    }

    QueryOutcome::Found {
        answer: format!("Found {} item(s) related to '{}'.", found.len(), text),
        details,
    }
}

/// Query box state: current text, last outcome, bounded history.
#[derive(Debug, Default)]
pub struct QueryEngine {
    text: String,
    history: VecDeque<String>,
    last: Option<QueryOutcome>,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn last_outcome(&self) -> Option<&QueryOutcome> {
        self.last.as_ref()
    }

    /// Most recent first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Run the current text. Only queries that actually executed
    /// (non-empty text, report loaded) enter the history.
    pub fn submit(&mut self, rows: &[ReportRow]) -> &QueryOutcome {
        let outcome = search(&self.text, rows);
        if !matches!(outcome, QueryOutcome::EmptyQuery | QueryOutcome::NoReport) {
            self.history.push_front(self.text.trim().to_string());
            self.history.truncate(HISTORY_LIMIT);
        }
        tracing::debug!(query = %self.text, found = outcome.is_found(), "Report query");
        self.last.insert(outcome)
    }

    /// Put a past query back in the box. Does not run it.
    pub fn select_history(&mut self, index: usize) -> Option<&str> {
        let entry = self.history.get(index)?.clone();
        self.text = entry;
        Some(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Omission;

    fn rows() -> Vec<ReportRow> {
        vec![
            ReportRow {
                standard: "GRI 305: Emissions 2016".into(),
                requirement: "305-1 Direct (Scope 1) GHG emissions".into(),
                compliance_score: 90.0,
                remarks: "Disclosure addressed in the document.".into(),
                omission: None,
                sector_ref: None,
            },
            ReportRow {
                standard: "GRI 2: General Disclosures 2021".into(),
                requirement: "2-1 Organizational details".into(),
                compliance_score: 45.5,
                remarks: String::new(),
                omission: Some(Omission {
                    reason: "confidential".into(),
                    explanation: "Withheld".into(),
                }),
                sector_ref: Some("GRI 11".into()),
            },
        ]
    }

    #[test]
    fn case_insensitive_match() {
        let rows = rows();
        let upper = search("EMISSIONS", &rows);
        let lower = search("emissions", &rows);
        assert_eq!(upper.details(), lower.details());
        assert!(upper.is_found());
    }

    #[test]
    fn details_enumerate_matches() {
        let outcome = search("gri", &rows());
        assert_eq!(
            outcome.details(),
            "2 matching item(s) found:\n\
             1. Standard: GRI 305: Emissions 2016, Requirement: 305-1 Direct (Scope 1) GHG emissions, Score: 90\n\
             2. Standard: GRI 2: General Disclosures 2021, Requirement: 2-1 Organizational details, Score: 45.5\n"
        );
    }

    #[test]
    fn matches_score_omission_and_sector_ref() {
        let rows = rows();
        assert!(search("45.5", &rows).is_found());
        assert!(search("confidential: withheld", &rows).is_found());
        assert!(search("gri 11", &rows).is_found());
        assert_eq!(search("scope 3", &rows), QueryOutcome::NoMatch);
    }

    #[test]
    fn empty_query_and_missing_report_are_distinct() {
        assert_eq!(search("   ", &rows()), QueryOutcome::EmptyQuery);
        assert_eq!(search("emissions", &[]), QueryOutcome::NoReport);
    }

    #[test]
    fn unanswered_outcomes_explain_themselves() {
        let rows = rows();
        let outcomes = [
            search("zzz", &rows),
            search("", &rows),
            search("emissions", &[]),
        ];
        let details: Vec<&str> = outcomes.iter().map(QueryOutcome::details).collect();

        assert!(details.iter().all(|d| !d.is_empty()));
        assert_ne!(details[0], details[1]);
        assert_ne!(details[0], details[2]);
        assert_ne!(details[1], details[2]);
        assert!(outcomes.iter().all(|o| o.answer() != o.details()));
    }

    #[test]
    fn history_is_bounded_most_recent_first() {
        let rows = rows();
        let mut engine = QueryEngine::new();
        for i in 0..12 {
            engine.set_text(format!("q{i}"));
            engine.submit(&rows);
        }
        let history: Vec<&str> = engine.history().collect();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "q11");
        assert_eq!(history[9], "q2");
    }

    #[test]
    fn unexecuted_queries_skip_history() {
        let mut engine = QueryEngine::new();
        engine.set_text("");
        engine.submit(&rows());
        engine.set_text("emissions");
        engine.submit(&[]);
        assert_eq!(engine.history().count(), 0);
        assert_eq!(engine.last_outcome(), Some(&QueryOutcome::NoReport));
    }

    #[test]
    fn selecting_history_does_not_rerun() {
        let rows = rows();
        let mut engine = QueryEngine::new();
        engine.set_text("emissions");
        engine.submit(&rows);
        engine.set_text("nothing here");
        engine.submit(&rows);

        assert_eq!(engine.select_history(1), Some("emissions"));
        assert_eq!(engine.text(), "emissions");
        assert_eq!(engine.last_outcome(), Some(&QueryOutcome::NoMatch));
        assert_eq!(engine.history().count(), 2);
        assert_eq!(engine.select_history(5), None);
    }
}
