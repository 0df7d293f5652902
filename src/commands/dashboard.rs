//! Dashboard controller: one loaded report and everything derived from it.
//!
//! Holds the report produced by the last analysis, the display
//! preferences, and the query box. Views (table, chart, insights) are
//! recomputed from the report on every call.

use std::path::{Path, PathBuf};

use crate::backend::{AnalysisParams, ComplianceBackend};
use crate::models::{ComplianceType, Locale, ReportColumn, ReportRow, Suggestion};
use crate::orchestrator::{AnalysisControl, AnalysisOutcome, AnalysisTicket, AnalyzeOrchestrator};
use crate::progress::ProgressReporter;
use crate::query::{QueryEngine, QueryOutcome};
use crate::report::{
    build_export_table, chart_series, export_pdf, export_xlsx, insights, write_export,
    ChartPoint, ExportFormat, ExportTable, Insight, ReportPreferences,
};
use crate::session::SessionContext;
use crate::workflow::GuidedCompletion;

use super::CommandError;

/// How an analysis request ended, as far as the dashboard is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisStatus {
    Completed { rows: usize, suggestions: usize },
    Cancelled,
    /// The report holds the single error row.
    Failed { message: String },
}

/// Result of [`Dashboard::run_analysis`], waiting to be published.
#[derive(Debug)]
pub struct FinishedAnalysis {
    generation: u64,
    compliance_type: ComplianceType,
    outcome: AnalysisOutcome,
}

impl FinishedAnalysis {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outcome(&self) -> &AnalysisOutcome {
        &self.outcome
    }
}

/// A file written by [`Dashboard::export`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

pub struct Dashboard<B> {
    session: SessionContext,
    orchestrator: AnalyzeOrchestrator<B>,
    locale: Locale,
    compliance_type: ComplianceType,
    report: Vec<ReportRow>,
    suggestions: Vec<Suggestion>,
    preferences: ReportPreferences,
    query: QueryEngine,
    control: AnalysisControl,
    exports_dir: PathBuf,
}

impl<B: ComplianceBackend> Dashboard<B> {
    /// Open the dashboard. Requires a logged-in session.
    pub fn open(
        session: SessionContext,
        orchestrator: AnalyzeOrchestrator<B>,
        locale: Locale,
        exports_dir: PathBuf,
    ) -> Result<Self, CommandError> {
        session.require_user()?;
        Ok(Self {
            session,
            orchestrator,
            locale,
            compliance_type: ComplianceType::default(),
            report: Vec::new(),
            suggestions: Vec::new(),
            preferences: ReportPreferences::default(),
            query: QueryEngine::new(),
            control: AnalysisControl::new(),
            exports_dir,
        })
    }

    pub fn username(&self) -> &str {
        self.session.username.as_deref().unwrap_or_default()
    }

    pub fn compliance_type(&self) -> ComplianceType {
        self.compliance_type
    }

    pub fn report(&self) -> &[ReportRow] {
        &self.report
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    // ── Analysis ─────────────────────────────────────────────────────────

    /// Start a new analysis. Supersedes any run still in flight and
    /// clears the current report.
    pub fn begin_analysis(&mut self) -> AnalysisTicket {
        self.report.clear();
        self.suggestions.clear();
        self.control.begin()
    }

    /// Cancel the run in flight, if any.
    pub fn cancel_analysis(&self) -> bool {
        self.control.cancel()
    }

    /// Handle for beginning or cancelling runs from another task while
    /// this dashboard is busy awaiting one.
    pub fn analysis_control(&self) -> AnalysisControl {
        self.control.clone()
    }

    /// Run the analysis for a finished guided workflow without touching
    /// the loaded report. Hand the result to [`Dashboard::publish`].
    pub async fn run_analysis(
        &self,
        ticket: AnalysisTicket,
        completion: GuidedCompletion,
        progress: &dyn ProgressReporter,
    ) -> FinishedAnalysis {
        let (generation, signal) = ticket.into_parts();
        let outcome = match completion.file.as_deref() {
            Some(file) => {
                let params = AnalysisParams {
                    compliance_type: completion.compliance_type,
                    locale: self.locale,
                    omissions: completion.omissions,
                };
                self.orchestrator.run(file, &params, signal, progress).await
            }
            None => {
                tracing::warn!("Guided workflow finished without a document");
                AnalysisOutcome::failed("No document selected")
            }
        };
        FinishedAnalysis {
            generation,
            compliance_type: completion.compliance_type,
            outcome,
        }
    }

    /// Load a finished run into the dashboard. The report is replaced
    /// only if the run is still current. A cancelled latest run leaves
    /// the report empty; a superseded run leaves it untouched.
    pub fn publish(&mut self, finished: FinishedAnalysis) -> AnalysisStatus {
        let FinishedAnalysis {
            generation,
            compliance_type,
            outcome,
        } = finished;

        if !self.control.finish(generation) {
            tracing::info!(generation, "Analysis result discarded");
            if self.control.is_latest(generation) {
                self.report.clear();
                self.suggestions.clear();
            }
            return AnalysisStatus::Cancelled;
        }

        self.compliance_type = compliance_type;
        match outcome {
            AnalysisOutcome::Completed {
                rows, suggestions, ..
            } => {
                let status = AnalysisStatus::Completed {
                    rows: rows.len(),
                    suggestions: suggestions.len(),
                };
                self.report = rows;
                self.suggestions = suggestions;
                status
            }
            AnalysisOutcome::Cancelled => {
                self.report.clear();
                self.suggestions.clear();
                AnalysisStatus::Cancelled
            }
            AnalysisOutcome::Failed { message, rows } => {
                self.report = rows;
                self.suggestions.clear();
                AnalysisStatus::Failed { message }
            }
        }
    }

    /// Run and publish in one step.
    pub async fn analyze(
        &mut self,
        ticket: AnalysisTicket,
        completion: GuidedCompletion,
        progress: &dyn ProgressReporter,
    ) -> AnalysisStatus {
        let finished = self.run_analysis(ticket, completion, progress).await;
        self.publish(finished)
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn preferences(&self) -> &ReportPreferences {
        &self.preferences
    }

    pub fn toggle_column(&mut self, column: ReportColumn) {
        self.preferences.toggle_column(column);
    }

    pub fn set_non_compliant_only(&mut self, enabled: bool) {
        self.preferences.non_compliant_only = enabled;
    }

    pub fn table(&self) -> ExportTable {
        build_export_table(&self.report, &self.preferences)
    }

    pub fn chart(&self) -> Vec<ChartPoint> {
        chart_series(&self.report)
    }

    pub fn insights(&self) -> Vec<Insight> {
        insights(&self.report)
    }

    // ── Query ────────────────────────────────────────────────────────────

    pub fn ask(&mut self, text: &str) -> &QueryOutcome {
        self.query.set_text(text);
        self.query.submit(&self.report)
    }

    pub fn query(&self) -> &QueryEngine {
        &self.query
    }

    pub fn select_history(&mut self, index: usize) -> Option<&str> {
        self.query.select_history(index)
    }

    // ── Export ───────────────────────────────────────────────────────────

    /// Render the current view and save it under `dir`, or the
    /// configured exports directory.
    pub fn export(
        &self,
        format: ExportFormat,
        dir: Option<&Path>,
    ) -> Result<ExportReceipt, CommandError> {
        if self.report.is_empty() {
            return Err(CommandError::NoReport);
        }
        let table = self.table();
        let artifact = match format {
            ExportFormat::Pdf => export_pdf(&table, self.compliance_type)?,
            ExportFormat::Xlsx => export_xlsx(&table, self.compliance_type)?,
        };
        let path = write_export(&artifact, dir.unwrap_or(self.exports_dir.as_path()))?;
        Ok(ExportReceipt {
            path,
            rows: artifact.rows,
            columns: artifact.columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::backend::{MockBackend, MockCall};
    use crate::models::Omission;
    use crate::progress::NoProgress;
    use crate::workflow::{GuidedWorkflow, Transition};

    fn rows() -> Vec<ReportRow> {
        vec![
            ReportRow {
                standard: "GRI 305: Emissions 2016".into(),
                requirement: "305-1 Direct (Scope 1) GHG emissions".into(),
                compliance_score: 80.0,
                remarks: "Disclosure addressed in the document.".into(),
                omission: None,
                sector_ref: None,
            },
            ReportRow {
                standard: "GRI 305: Emissions 2016".into(),
                requirement: "305-2 Energy indirect (Scope 2) GHG emissions".into(),
                compliance_score: 60.0,
                remarks: "Disclosure mentioned but not fully addressed.".into(),
                omission: None,
                sector_ref: None,
            },
            ReportRow {
                standard: "GRI 2: General Disclosures 2021".into(),
                requirement: "2-1 Organizational details".into(),
                compliance_score: 100.0,
                remarks: "Disclosure addressed in the document.".into(),
                omission: None,
                sector_ref: None,
            },
            ReportRow {
                standard: "GRI 2: General Disclosures 2021".into(),
                requirement: "2-2 Entities included".into(),
                compliance_score: 0.0,
                remarks: "Disclosure omitted with reason: not applicable.".into(),
                omission: Some(Omission {
                    reason: "not applicable".into(),
                    explanation: "User specified 'not applicable' as the reason for omission."
                        .into(),
                }),
                sector_ref: None,
            },
        ]
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        file: PathBuf,
        exports: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("esg_2024.pdf");
        std::fs::write(&file, b"%PDF-1.4 sustainability report").unwrap();
        let exports = tmp.path().join("exports");
        Fixture {
            _tmp: tmp,
            file,
            exports,
        }
    }

    fn dashboard(backend: MockBackend, exports: &Path) -> Dashboard<MockBackend> {
        Dashboard::open(
            SessionContext::logged_in("ada"),
            AnalyzeOrchestrator::new(Arc::new(backend), Duration::from_millis(5)),
            Locale::En,
            exports.to_path_buf(),
        )
        .unwrap()
    }

    fn completion(file: &Path, compliance_type: ComplianceType) -> GuidedCompletion {
        let mut wizard = GuidedWorkflow::new();
        wizard.set_compliance_type(compliance_type);
        wizard.next();
        wizard.select_file(Some(file.to_path_buf()));
        wizard.next();
        wizard
            .add_omission("GRI 2: General Disclosures 2021_2-2", "not applicable")
            .unwrap();
        wizard.next();
        match wizard.next() {
            Transition::Completed(done) => done,
            other => panic!("wizard did not complete: {other:?}"),
        }
    }

    #[test]
    fn requires_login() {
        let result = Dashboard::open(
            SessionContext::anonymous(),
            AnalyzeOrchestrator::new(
                Arc::new(MockBackend::new(Vec::new())),
                Duration::from_millis(5),
            ),
            Locale::En,
            PathBuf::from("exports"),
        );
        assert!(matches!(result, Err(CommandError::Session(_))));
    }

    #[tokio::test]
    async fn guided_analysis_populates_views() {
        let fx = fixture();
        let mut dash = dashboard(MockBackend::new(rows()), &fx.exports);

        let ticket = dash.begin_analysis();
        let status = dash
            .analyze(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;

        assert_eq!(status, AnalysisStatus::Completed { rows: 3, suggestions: 0 });
        assert_eq!(
            dash.chart(),
            vec![
                ChartPoint { standard: "GRI 305: Emissions 2016".into(), avg_score: 70 },
                ChartPoint { standard: "GRI 2: General Disclosures 2021".into(), avg_score: 100 },
            ]
        );
        assert_eq!(dash.insights().len(), 2);
    }

    #[tokio::test]
    async fn omissions_are_forwarded() {
        let fx = fixture();
        let backend = MockBackend::new(rows());
        let orchestrator = AnalyzeOrchestrator::new(Arc::new(backend), Duration::from_millis(5));
        let backend = Arc::clone(orchestrator.backend());
        let mut dash = Dashboard::open(
            SessionContext::logged_in("ada"),
            orchestrator,
            Locale::Fr,
            fx.exports.clone(),
        )
        .unwrap();

        let ticket = dash.begin_analysis();
        dash.analyze(ticket, completion(&fx.file, ComplianceType::Ifrs), &NoProgress)
            .await;

        let analyze = backend
            .calls()
            .into_iter()
            .find_map(|c| match c {
                MockCall::Analyze { query, .. } => Some(query),
                _ => None,
            })
            .unwrap();
        assert!(analyze.contains(&("compliance_type", "IFRS".to_string())));
        assert!(analyze.contains(&("lang", "fr".to_string())));
        assert!(analyze.iter().any(|(k, v)| *k == "omissions" && v.contains("not applicable")));
        assert_eq!(dash.compliance_type(), ComplianceType::Ifrs);
    }

    #[tokio::test]
    async fn cancelled_run_leaves_report_empty() {
        let fx = fixture();
        let backend = MockBackend::new(rows()).with_analyze_delay(Duration::from_millis(500));
        let mut dash = dashboard(backend, &fx.exports);

        let ticket = dash.begin_analysis();
        let handle = ticket.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });
        let status = dash
            .analyze(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;

        assert_eq!(status, AnalysisStatus::Cancelled);
        assert!(dash.report().is_empty());
        assert!(dash.chart().is_empty());
    }

    #[tokio::test]
    async fn superseded_ticket_never_publishes() {
        let fx = fixture();
        let mut dash = dashboard(MockBackend::new(rows()), &fx.exports);

        let stale = dash.begin_analysis();
        let _current = dash.begin_analysis();
        let status = dash
            .analyze(stale, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;

        assert_eq!(status, AnalysisStatus::Cancelled);
        assert!(dash.report().is_empty());
    }

    #[tokio::test]
    async fn new_run_mid_flight_supersedes_the_first() {
        let fx = fixture();
        let backend = MockBackend::new(rows()).with_analyze_delay(Duration::from_millis(200));
        let mut dash = dashboard(backend, &fx.exports);
        let control = dash.analysis_control();

        let first = dash.begin_analysis();
        let first_cancel = first.cancel_handle();
        let (stale, fresh) = tokio::join!(
            dash.run_analysis(first, completion(&fx.file, ComplianceType::Gri), &NoProgress),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let second = control.begin();
                dash.run_analysis(second, completion(&fx.file, ComplianceType::Ifrs), &NoProgress)
                    .await
            }
        );

        assert!(first_cancel.is_cancelled());
        assert!(stale.outcome().is_cancelled());
        assert!(stale.generation() < fresh.generation());

        assert_eq!(
            dash.publish(fresh),
            AnalysisStatus::Completed { rows: 3, suggestions: 0 }
        );
        assert_eq!(dash.publish(stale), AnalysisStatus::Cancelled);
        assert_eq!(dash.report().len(), 3);
        assert_eq!(dash.compliance_type(), ComplianceType::Ifrs);
    }

    #[tokio::test]
    async fn cancel_analysis_stops_run_in_flight() {
        let fx = fixture();
        let backend = MockBackend::new(rows()).with_analyze_delay(Duration::from_millis(500));
        let mut dash = dashboard(backend, &fx.exports);

        let ticket = dash.begin_analysis();
        let (finished, was_running) = tokio::join!(
            dash.run_analysis(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                dash.cancel_analysis()
            }
        );

        assert!(was_running);
        assert!(finished.outcome().is_cancelled());
        assert_eq!(dash.publish(finished), AnalysisStatus::Cancelled);
        assert!(dash.report().is_empty());
        assert!(!dash.cancel_analysis());
    }

    #[tokio::test]
    async fn analysis_suggestions_reach_the_dashboard() {
        let fx = fixture();
        let suggestions = vec![
            Suggestion {
                standard: "GRI 305: Emissions 2016".into(),
                suggestion: "Report Scope 2 emissions with both location and market methods."
                    .into(),
            },
            Suggestion {
                standard: "GRI 2: General Disclosures 2021".into(),
                suggestion: "List every entity included in sustainability reporting.".into(),
            },
        ];
        let backend = MockBackend::new(rows()).with_suggestions(suggestions.clone());
        let mut dash = dashboard(backend, &fx.exports);

        let ticket = dash.begin_analysis();
        let status = dash
            .analyze(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;
        assert_eq!(status, AnalysisStatus::Completed { rows: 3, suggestions: 2 });
        assert_eq!(dash.suggestions(), suggestions.as_slice());

        // A later failed run replaces the report and drops the suggestions.
        let ticket = dash.analysis_control().begin();
        let no_file = GuidedCompletion {
            file: None,
            compliance_type: ComplianceType::Gri,
            omissions: Default::default(),
        };
        let finished = dash.run_analysis(ticket, no_file, &NoProgress).await;
        assert!(matches!(dash.publish(finished), AnalysisStatus::Failed { .. }));
        assert!(dash.suggestions().is_empty());
        assert_eq!(dash.report()[0].standard, "Error");
    }

    #[tokio::test]
    async fn failure_shows_error_row() {
        let fx = fixture();
        let backend = MockBackend::new(Vec::new()).failing_upload("Failed to upload file to MinIO.");
        let mut dash = dashboard(backend, &fx.exports);

        let ticket = dash.begin_analysis();
        let status = dash
            .analyze(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;

        assert_eq!(
            status,
            AnalysisStatus::Failed {
                message: "Failed to upload file to MinIO.".into()
            }
        );
        assert_eq!(dash.report().len(), 1);
        assert_eq!(dash.report()[0].standard, "Error");
    }

    #[tokio::test]
    async fn missing_document_fails_without_backend_call() {
        let fx = fixture();
        let orchestrator = AnalyzeOrchestrator::new(
            Arc::new(MockBackend::new(rows())),
            Duration::from_millis(5),
        );
        let backend = Arc::clone(orchestrator.backend());
        let mut dash = Dashboard::open(
            SessionContext::logged_in("ada"),
            orchestrator,
            Locale::En,
            fx.exports.clone(),
        )
        .unwrap();

        let completion = GuidedCompletion {
            file: None,
            compliance_type: ComplianceType::Gri,
            omissions: Default::default(),
        };
        let ticket = dash.begin_analysis();
        let status = dash.analyze(ticket, completion, &NoProgress).await;

        assert!(matches!(status, AnalysisStatus::Failed { .. }));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn exports_share_filtered_projection() {
        let fx = fixture();
        let mut dash = dashboard(MockBackend::new(rows()), &fx.exports);
        let ticket = dash.begin_analysis();
        dash.analyze(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;

        dash.set_non_compliant_only(false);
        dash.toggle_column(ReportColumn::SectorRef);

        let pdf = dash.export(ExportFormat::Pdf, None).unwrap();
        let xlsx = dash.export(ExportFormat::Xlsx, None).unwrap();
        assert_eq!(pdf.rows, xlsx.rows);
        assert_eq!(pdf.columns, xlsx.columns);
        assert_eq!(pdf.rows, 3);
        assert_eq!(pdf.columns, 5);
        assert_eq!(pdf.path, fx.exports.join("GRI_compliance_report.pdf"));
        assert!(xlsx.path.exists());
    }

    #[test]
    fn export_without_report_is_rejected() {
        let fx = fixture();
        let dash = dashboard(MockBackend::new(Vec::new()), &fx.exports);
        assert!(matches!(
            dash.export(ExportFormat::Pdf, None),
            Err(CommandError::NoReport)
        ));
    }

    #[tokio::test]
    async fn queries_run_against_loaded_report() {
        let fx = fixture();
        let mut dash = dashboard(MockBackend::new(rows()), &fx.exports);
        assert_eq!(dash.ask("emissions"), &QueryOutcome::NoReport);

        let ticket = dash.begin_analysis();
        dash.analyze(ticket, completion(&fx.file, ComplianceType::Gri), &NoProgress)
            .await;

        assert!(dash.ask("SCOPE").is_found());
        assert_eq!(dash.query().history().collect::<Vec<_>>(), vec!["SCOPE"]);
        assert_eq!(dash.select_history(0), Some("SCOPE"));
    }
}
