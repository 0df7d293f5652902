//! Cosmetic progress for the analyze run.
//!
//! The backend reports no real progress, so the indicator is simulated:
//! each tick of the orchestrator's interval nudges the value toward the
//! current stage's ceiling.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Analysis,
}

impl Stage {
    /// (step per tick, ceiling)
    fn climb(self) -> (u8, u8) {
        match self {
            Self::Upload => (5, 30),
            Self::Analysis => (10, 100),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, stage: Stage);
    fn tick(&self, stage: Stage);
    fn finished(&self);
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn stage_started(&self, _stage: Stage) {}
    fn tick(&self, _stage: Stage) {}
    fn finished(&self) {}
}

/// Percentage that climbs per tick and never exceeds the stage ceiling.
#[derive(Debug, Default)]
pub struct SimulatedProgress {
    percent: AtomicU8,
}

impl SimulatedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for SimulatedProgress {
    fn stage_started(&self, stage: Stage) {
        match stage {
            Stage::Upload => self.percent.store(0, Ordering::Relaxed),
            // Upload has returned: jump to its ceiling.
            Stage::Analysis => {
                let (_, upload_ceiling) = Stage::Upload.climb();
                self.percent.fetch_max(upload_ceiling, Ordering::Relaxed);
            }
        }
    }

    fn tick(&self, stage: Stage) {
        let (step, ceiling) = stage.climb();
        let _ = self
            .percent
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| {
                (p < ceiling).then(|| p.saturating_add(step).min(ceiling))
            });
    }

    fn finished(&self) {
        self.percent.store(0, Ordering::Relaxed);
    }
}
