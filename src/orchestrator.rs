//! Upload-then-analyze sequencing.
//!
//! A run uploads the selected document, waits for its id, then asks the
//! backend for the analysis. Both suspension points race a cancel
//! signal, and a progress ticker runs while either is in flight.
//! Every run ends in exactly one [`AnalysisOutcome`].

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::backend::{AnalysisParams, AnalyzeReply, BackendError, ComplianceBackend, DocumentUpload};
use crate::models::{ReportRow, Suggestion};
use crate::progress::{ProgressReporter, Stage};

// ═══════════════════════════════════════════
// Cancellation
// ═══════════════════════════════════════════

/// Requests cancellation of one run. Cloneable; any clone can cancel.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observed by the run. Resolves once cancelled, or once every
/// [`CancelHandle`] is gone.
#[derive(Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&mut self) {
        // Err means every sender was dropped.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// One started run: its generation and cancel plumbing.
#[derive(Debug)]
pub struct AnalysisTicket {
    generation: u64,
    handle: CancelHandle,
    signal: CancelSignal,
}

impl AnalysisTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn into_parts(self) -> (u64, CancelSignal) {
        (self.generation, self.signal)
    }
}

/// Keeps at most one run outstanding.
///
/// Starting a run cancels the previous one; a run may only publish its
/// result while it is still the current generation.
#[derive(Debug, Default)]
pub struct AnalysisSlot {
    generation: u64,
    current: Option<CancelHandle>,
}

impl AnalysisSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> AnalysisTicket {
        if let Some(previous) = self.current.take() {
            previous.cancel();
            tracing::debug!(generation = self.generation, "Superseded analysis cancelled");
        }
        self.generation += 1;
        let (handle, signal) = cancel_pair();
        self.current = Some(handle.clone());
        AnalysisTicket {
            generation: self.generation,
            handle,
            signal,
        }
    }

    /// Cancel the current run, if any. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                handle.cancel();
                tracing::info!(generation = self.generation, "Analysis cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
            && self.current.as_ref().is_some_and(|h| !h.is_cancelled())
    }

    /// True while no later run has begun, cancelled or not.
    pub fn is_latest(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Close `generation`. True when the caller may publish its result.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

/// Shared handle on an [`AnalysisSlot`].
///
/// Clones can begin or cancel runs while another task is awaiting one.
#[derive(Debug, Clone, Default)]
pub struct AnalysisControl {
    slot: Arc<Mutex<AnalysisSlot>>,
}

impl AnalysisControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut AnalysisSlot) -> T) -> T {
        // The slot holds no invariant a panicking holder could break.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut slot)
    }

    /// Start a run, cancelling the one in flight.
    pub fn begin(&self) -> AnalysisTicket {
        self.with_slot(AnalysisSlot::begin)
    }

    pub fn cancel(&self) -> bool {
        self.with_slot(AnalysisSlot::cancel)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.with_slot(|slot| slot.is_current(generation))
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        self.with_slot(|slot| slot.is_latest(generation))
    }

    pub fn finish(&self, generation: u64) -> bool {
        self.with_slot(|slot| slot.finish(generation))
    }
}

// ═══════════════════════════════════════════
// Outcome
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed {
        doc_id: String,
        rows: Vec<ReportRow>,
        suggestions: Vec<Suggestion>,
    },
    /// Stopped on request. Leaves no report behind.
    Cancelled,
    /// `rows` holds the single synthetic error row.
    Failed { message: String, rows: Vec<ReportRow> },
}

impl AnalysisOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Failed {
            rows: vec![ReportRow::error(message.clone())],
            message,
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        match self {
            Self::Completed { rows, .. } | Self::Failed { rows, .. } => rows,
            Self::Cancelled => &[],
        }
    }

    pub fn into_report(self) -> Vec<ReportRow> {
        match self {
            Self::Completed { rows, .. } | Self::Failed { rows, .. } => rows,
            Self::Cancelled => Vec::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

enum Interrupt {
    Cancelled,
    Failed(BackendError),
}

/// Drop rows the organization declared "not applicable".
pub fn drop_not_applicable(rows: Vec<ReportRow>) -> Vec<ReportRow> {
    rows.into_iter()
        .filter(|row| !row.is_omitted_as_not_applicable())
        .collect()
}

// ═══════════════════════════════════════════
// Orchestrator
// ═══════════════════════════════════════════

pub struct AnalyzeOrchestrator<B> {
    backend: Arc<B>,
    tick: Duration,
}

impl<B: ComplianceBackend> AnalyzeOrchestrator<B> {
    pub fn new(backend: Arc<B>, tick: Duration) -> Self {
        Self {
            backend,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub async fn run(
        &self,
        file: &Path,
        params: &AnalysisParams,
        mut signal: CancelSignal,
        progress: &dyn ProgressReporter,
    ) -> AnalysisOutcome {
        let outcome = match self.stages(file, params, &mut signal, progress).await {
            Ok((doc_id, rows, suggestions)) => {
                let total = rows.len();
                let rows = drop_not_applicable(rows);
                tracing::info!(
                    doc_id = %doc_id,
                    rows = rows.len(),
                    dropped = total - rows.len(),
                    "Analysis complete"
                );
                AnalysisOutcome::Completed {
                    doc_id,
                    rows,
                    suggestions,
                }
            }
            Err(Interrupt::Cancelled) => {
                tracing::info!(file = %file.display(), "Analysis run cancelled");
                AnalysisOutcome::Cancelled
            }
            Err(Interrupt::Failed(e)) => {
                tracing::error!(file = %file.display(), error = %e, "Analysis run failed");
                AnalysisOutcome::failed(e.user_message())
            }
        };
        progress.finished();
        outcome
    }

    async fn stages(
        &self,
        file: &Path,
        params: &AnalysisParams,
        signal: &mut CancelSignal,
        progress: &dyn ProgressReporter,
    ) -> Result<(String, Vec<ReportRow>, Vec<Suggestion>), Interrupt> {
        progress.stage_started(Stage::Upload);
        let backend = &self.backend;
        let doc_id = self
            .guarded(Stage::Upload, signal, progress, async {
                let document = DocumentUpload::from_path(file).await?;
                backend.upload(document).await
            })
            .await?;

        progress.stage_started(Stage::Analysis);
        let reply = self
            .guarded(Stage::Analysis, signal, progress, backend.analyze(&doc_id, params))
            .await?;

        match reply {
            AnalyzeReply::Report { rows, suggestions } => Ok((doc_id, rows, suggestions)),
            AnalyzeReply::Cancelled { message } => {
                tracing::debug!(doc_id = %doc_id, %message, "Server reported cancellation");
                Err(Interrupt::Cancelled)
            }
        }
    }

    /// Drive `fut` to completion unless cancelled first, ticking
    /// progress meanwhile.
    async fn guarded<T>(
        &self,
        stage: Stage,
        signal: &mut CancelSignal,
        progress: &dyn ProgressReporter,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, Interrupt> {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Consume initial immediate tick

        tokio::pin!(fut);
        loop {
            tokio::select! {
                biased;
                () = signal.cancelled() => return Err(Interrupt::Cancelled),
                result = &mut fut => return result.map_err(Interrupt::Failed),
                _ = ticker.tick() => progress.tick(stage),
            }
        }
    }
}
