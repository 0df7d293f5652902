//! `sait` command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use crate::backend::{Credentials, HttpBackend};
use crate::commands::analytics::{load_analytics, AnalyticsView};
use crate::commands::dashboard::{AnalysisStatus, Dashboard};
use crate::commands::{auth, CommandError};
use crate::config::AppConfig;
use crate::models::{ComplianceType, Locale, ReportColumn};
use crate::orchestrator::AnalyzeOrchestrator;
use crate::progress::{ProgressReporter, SimulatedProgress, Stage};
use crate::report::{ExportFormat, ExportTable};
use crate::session::SessionContext;
use crate::workflow::{GuidedWorkflow, Transition, DISCLOSURE_CATALOG};

#[derive(Parser, Debug)]
#[command(name = "sait", version)]
#[command(about = "Sustainability reporting client: GRI/IFRS compliance analysis and exports")]
pub struct Cli {
    /// Analysis API base URL (overrides SAIT_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session.
    Login(AuthArgs),
    /// Register a new account.
    Signup(AuthArgs),
    /// Forget the current session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Upload a document, analyze it and show the report.
    Analyze(AnalyzeArgs),
    /// Aggregated scores and suggestions across stored reports.
    Analytics {
        #[arg(long, default_value = "GRI")]
        framework: ComplianceType,
        #[arg(long, default_value = "en")]
        lang: Locale,
    },
}

#[derive(clap::Args, Debug)]
pub struct AuthArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Document to analyze (PDF, DOCX, ...).
    pub file: PathBuf,
    #[arg(long, default_value = "GRI")]
    pub framework: ComplianceType,
    #[arg(long, default_value = "en")]
    pub lang: Locale,
    /// Declare an omission, e.g. "GRI 305: Emissions 2016_305-1=confidential".
    #[arg(long = "omit", value_name = "ID=REASON", value_parser = parse_omission)]
    pub omit: Vec<(String, String)>,
    /// Hide a report column (repeatable).
    #[arg(long = "hide-column", value_name = "COLUMN", value_parser = parse_column)]
    pub hide_column: Vec<ReportColumn>,
    /// Show only rows scoring 0.
    #[arg(long, default_value_t = false)]
    pub non_compliant_only: bool,
    /// Write the filtered report in this format (repeatable).
    #[arg(long, value_enum)]
    pub export: Vec<ExportFormatCli>,
    /// Export directory (defaults to the data directory's exports/).
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Ask a question about the report (repeatable).
    #[arg(long)]
    pub ask: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormatCli {
    Pdf,
    Xlsx,
}

impl From<ExportFormatCli> for ExportFormat {
    fn from(value: ExportFormatCli) -> Self {
        match value {
            ExportFormatCli::Pdf => ExportFormat::Pdf,
            ExportFormatCli::Xlsx => ExportFormat::Xlsx,
        }
    }
}

fn parse_omission(s: &str) -> Result<(String, String), String> {
    let (id, reason) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ID=REASON, got {s:?}"))?;
    Ok((id.trim().to_string(), reason.trim().to_string()))
}

/// Column names are matched case-insensitively; `-` and `_` stand for spaces.
fn parse_column(s: &str) -> Result<ReportColumn, String> {
    let wanted = s.trim().replace(['-', '_'], " ");
    ReportColumn::ALL
        .iter()
        .copied()
        .find(|c| c.as_str().eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| {
            let known: Vec<&str> = ReportColumn::ALL.iter().map(|c| c.as_str()).collect();
            format!("unknown column {s:?} (expected one of: {})", known.join(", "))
        })
}

// ═══════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════

pub async fn dispatch(cli: Cli, config: AppConfig) -> Result<(), CommandError> {
    let session_path = config.session_path();
    match cli.command {
        Command::Login(args) => {
            let backend = HttpBackend::from_config(&config)?;
            let creds = Credentials::new(args.username, args.email, args.password);
            let session = auth::login(&backend, &session_path, &creds).await?;
            println!("Logged in as {}", session.require_user()?);
        }
        Command::Signup(args) => {
            let backend = HttpBackend::from_config(&config)?;
            let creds = Credentials::new(args.username, args.email, args.password);
            let message = auth::signup(&backend, &creds).await?;
            println!("{message}. You can now log in.");
        }
        Command::Logout => {
            auth::logout(&session_path)?;
            println!("Logged out");
        }
        Command::Whoami => match SessionContext::load(&session_path)?.require_user() {
            Ok(name) => println!("{name}"),
            Err(_) => println!("Not logged in"),
        },
        Command::Analyze(args) => analyze(args, &config, cli.json).await?,
        Command::Analytics { framework, lang } => {
            let backend = HttpBackend::from_config(&config)?;
            let session = SessionContext::load(&session_path)?;
            let view = load_analytics(&backend, &session, framework, lang).await?;
            if cli.json {
                print_json(&json!({ "analytics": &view, "chart": view.chart() }));
            } else {
                if let Some(error) = &view.error {
                    eprintln!("Analytics unavailable: {error}");
                }
                println!("{framework} compliance across stored reports");
                print!("{}", render_analytics(&view));
                print_suggestions(view.ai_suggestions.iter().map(|s| (&s.standard, &s.suggestion)));
            }
        }
    }
    Ok(())
}

async fn analyze(args: AnalyzeArgs, config: &AppConfig, json: bool) -> Result<(), CommandError> {
    let session = SessionContext::load(&config.session_path())?;
    let backend = Arc::new(HttpBackend::from_config(config)?);
    let orchestrator = AnalyzeOrchestrator::new(backend, config.progress_tick);
    let mut dashboard = Dashboard::open(session, orchestrator, args.lang, config.exports_dir())?;

    // Walk the guided setup with the values given on the command line.
    let mut wizard = GuidedWorkflow::new();
    wizard.set_compliance_type(args.framework);
    wizard.next();
    wizard.select_file(Some(args.file.clone()));
    wizard.next();
    for (id, reason) in &args.omit {
        wizard.add_omission(id, reason).map_err(|e| {
            CommandError::Validation(format!(
                "{e}. Known disclosures: {}",
                DISCLOSURE_CATALOG.join("; ")
            ))
        })?;
    }
    wizard.next();
    let Transition::Completed(completion) = wizard.next() else {
        return Err(CommandError::Validation("Guided setup did not complete".into()));
    };

    let ticket = dashboard.begin_analysis();
    let control = dashboard.analysis_control();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling analysis");
            control.cancel();
        }
    });

    let progress = ConsoleProgress::new(!json);
    let status = dashboard.analyze(ticket, completion, &progress).await;
    interrupt.abort();

    match &status {
        AnalysisStatus::Completed { rows, .. } => {
            tracing::debug!(rows, "Report ready");
        }
        AnalysisStatus::Cancelled => {
            eprintln!("Analysis cancelled.");
            return Ok(());
        }
        AnalysisStatus::Failed { message } => eprintln!("Analysis failed: {message}"),
    }

    for column in &args.hide_column {
        if dashboard.preferences().is_visible(*column) {
            dashboard.toggle_column(*column);
        }
    }
    dashboard.set_non_compliant_only(args.non_compliant_only);

    let answers: Vec<(String, String, String)> = args
        .ask
        .iter()
        .map(|q| {
            let outcome = dashboard.ask(q);
            (q.clone(), outcome.answer().to_string(), outcome.details().to_string())
        })
        .collect();

    let mut exports = Vec::new();
    for format in &args.export {
        exports.push(dashboard.export((*format).into(), args.out.as_deref())?);
    }

    if json {
        print_json(&json!({
            "framework": dashboard.compliance_type(),
            "table": dashboard.table(),
            "chart": dashboard.chart(),
            "insights": dashboard.insights(),
            "suggestions": dashboard.suggestions(),
            "answers": answers
                .iter()
                .map(|(q, a, d)| json!({ "query": q, "answer": a, "details": d }))
                .collect::<Vec<_>>(),
            "exports": exports.iter().map(|e| e.path.display().to_string()).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("{} Compliance Report", dashboard.compliance_type());
    println!("{}", render_table(&dashboard.table()));

    println!("\nAverage score by standard");
    for point in dashboard.chart() {
        println!("  {:<45} {:>3}", point.standard, point.avg_score);
    }

    let insights = dashboard.insights();
    if !insights.is_empty() {
        println!("\nKey metrics");
        for insight in insights {
            println!(
                "  {:<8} {:>3}  ({:+})  {}",
                insight.name, insight.value, insight.change, insight.benchmark
            );
        }
    }

    print_suggestions(dashboard.suggestions().iter().map(|s| (&s.standard, &s.suggestion)));

    for (query, answer, details) in &answers {
        println!("\n> {query}\n{answer}");
        if !details.is_empty() {
            print!("{details}");
        }
    }

    for receipt in &exports {
        println!(
            "\nExported {} rows x {} columns to {}",
            receipt.rows,
            receipt.columns,
            receipt.path.display()
        );
    }
    Ok(())
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!(error = %e, "Cannot serialize output"),
    }
}

fn print_suggestions<'a>(suggestions: impl Iterator<Item = (&'a String, &'a String)>) {
    let mut suggestions = suggestions.peekable();
    if suggestions.peek().is_none() {
        return;
    }
    println!("\nSuggestions");
    for (standard, suggestion) in suggestions {
        println!("  [{standard}] {suggestion}");
    }
}

/// Rounded average per standard, with the number of report rows behind it.
pub fn render_analytics(view: &AnalyticsView) -> String {
    if view.compliance_stats.is_empty() {
        return "  (no stored reports)\n".to_string();
    }
    view.chart()
        .iter()
        .zip(&view.compliance_stats)
        .map(|(point, stat)| {
            format!(
                "  {:<45} {:>3}  ({} report rows)\n",
                point.standard, point.avg_score, stat.total_reports
            )
        })
        .collect()
}

/// Plain-text table with columns padded to their widest cell.
pub fn render_table(table: &ExportTable) -> String {
    let headers = table.headers();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(&row.cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.clone())];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &table.rows {
        out.push(line(row.cells.iter().map(String::as_str).collect()));
    }
    if table.is_empty() {
        out.push("(no rows)".to_string());
    }
    out.join("\n")
}

/// Simulated progress rendered on stderr.
struct ConsoleProgress {
    inner: SimulatedProgress,
    visible: bool,
}

impl ConsoleProgress {
    fn new(visible: bool) -> Self {
        Self {
            inner: SimulatedProgress::new(),
            visible,
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn stage_started(&self, stage: Stage) {
        self.inner.stage_started(stage);
    }

    fn tick(&self, stage: Stage) {
        self.inner.tick(stage);
        if self.visible {
            let label = match stage {
                Stage::Upload => "Uploading",
                Stage::Analysis => "Analyzing",
            };
            eprint!("\r{label}... {:>3}%", self.inner.percent());
        }
    }

    fn finished(&self) {
        let shown = self.inner.percent() > 0;
        self.inner.finished();
        if self.visible && shown {
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComplianceStat, ReportRow};
    use crate::report::{build_export_table, ReportPreferences};

    #[test]
    fn parses_analyze_command() {
        let cli = Cli::try_parse_from([
            "sait",
            "analyze",
            "report.pdf",
            "--framework",
            "ifrs",
            "--lang",
            "french",
            "--omit",
            "GRI 305: Emissions 2016_305-1=confidential",
            "--hide-column",
            "sector-ref",
            "--non-compliant-only",
            "--export",
            "pdf",
            "--export",
            "xlsx",
            "--ask",
            "emissions",
        ])
        .unwrap();

        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.framework, ComplianceType::Ifrs);
        assert_eq!(args.lang, Locale::Fr);
        assert_eq!(
            args.omit,
            vec![(
                "GRI 305: Emissions 2016_305-1".to_string(),
                "confidential".to_string()
            )]
        );
        assert_eq!(args.hide_column, vec![ReportColumn::SectorRef]);
        assert!(args.non_compliant_only);
        assert_eq!(args.export.len(), 2);
        assert_eq!(args.ask, vec!["emissions".to_string()]);
    }

    #[test]
    fn analyze_defaults() {
        let cli = Cli::try_parse_from(["sait", "analyze", "report.pdf"]).unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.framework, ComplianceType::Gri);
        assert_eq!(args.lang, Locale::En);
        assert!(args.export.is_empty());
    }

    #[test]
    fn rejects_unknown_framework() {
        assert!(Cli::try_parse_from(["sait", "analyze", "r.pdf", "--framework", "SASB"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sait", "whoami", "--api-url", "http://api:9000", "--json"])
            .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://api:9000"));
        assert!(cli.json);
    }

    #[test]
    fn omission_argument_format() {
        assert!(parse_omission("no-separator").is_err());
        assert_eq!(
            parse_omission("GRI 2: General Disclosures 2021_2-1 = not applicable").unwrap(),
            (
                "GRI 2: General Disclosures 2021_2-1".to_string(),
                "not applicable".to_string()
            )
        );
    }

    #[test]
    fn column_argument_is_forgiving() {
        assert_eq!(parse_column("Compliance Score"), Ok(ReportColumn::ComplianceScore));
        assert_eq!(parse_column("compliance_score"), Ok(ReportColumn::ComplianceScore));
        assert_eq!(parse_column("remarks"), Ok(ReportColumn::Remarks));
        assert!(parse_column("score").is_err());
    }

    #[test]
    fn table_rendering_pads_columns() {
        let rows = vec![ReportRow {
            standard: "GRI 2".into(),
            requirement: "2-1 Organizational details".into(),
            compliance_score: 45.5,
            remarks: String::new(),
            omission: None,
            sector_ref: None,
        }];
        let prefs = ReportPreferences {
            visible_columns: [ReportColumn::Standard, ReportColumn::ComplianceScore]
                .into_iter()
                .collect(),
            non_compliant_only: false,
        };
        let text = render_table(&build_export_table(&rows, &prefs));
        assert_eq!(
            text,
            "Standard | Compliance Score\n\
             ---------+-----------------\n\
             GRI 2    | 45.5"
        );
    }

    #[test]
    fn empty_table_says_so() {
        let text = render_table(&build_export_table(&[], &ReportPreferences::default()));
        assert!(text.ends_with("(no rows)"));
    }

    #[test]
    fn analytics_rendering_rounds_scores() {
        let view = AnalyticsView {
            compliance_type: ComplianceType::Gri,
            compliance_stats: vec![
                ComplianceStat {
                    standard: "GRI 305: Emissions 2016".into(),
                    avg_score: 72.6,
                    total_reports: 4,
                },
                ComplianceStat {
                    standard: "GRI 2: General Disclosures 2021".into(),
                    avg_score: 40.25,
                    total_reports: 9,
                },
            ],
            ai_suggestions: Vec::new(),
            error: None,
        };
        let lines: Vec<String> = render_analytics(&view)
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(
            lines,
            vec![
                "GRI 305: Emissions 2016 73 (4 report rows)",
                "GRI 2: General Disclosures 2021 40 (9 report rows)",
            ]
        );
        assert_eq!(render_analytics(&AnalyticsView::default()), "  (no stored reports)\n");
    }
}
