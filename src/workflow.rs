//! Guided report setup: a four-step wizard.
//!
//! Framework selection → document selection → omission registry →
//! confirmation. Finishing the last step hands a single
//! [`GuidedCompletion`] to the caller and closes the wizard.
//!
//! The wizard does not require a document before leaving step 2;
//! callers decide whether a missing file is acceptable.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{ComplianceType, OmissionReason};

/// Disclosures the wizard offers for omission, keyed the way the analysis
/// API looks them up: `"<standard>_<disclosure>"`.
pub const DISCLOSURE_CATALOG: &[&str] = &[
    "GRI 2: General Disclosures 2021_2-1",
    "GRI 2: General Disclosures 2021_2-2",
    "GRI 3: Material Topics 2021_3-1",
    "GRI 3: Material Topics 2021_3-2",
    "GRI 101: Biodiversity 2024_101-1",
    "GRI 305: Emissions 2016_305-1",
];

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Select a disclosure to omit")]
    MissingDisclosure,
    #[error("Select a reason for the omission")]
    MissingReason,
    #[error("Unknown disclosure: {0}")]
    UnknownDisclosure(String),
    #[error("Unknown omission reason: {0}")]
    UnknownReason(String),
}

// ═══════════════════════════════════════════════════════════
// OmissionRegistry
// ═══════════════════════════════════════════════════════════

/// Disclosure id → omission reason. One reason per disclosure;
/// re-adding overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OmissionRegistry {
    entries: BTreeMap<String, OmissionReason>,
}

impl OmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an omission. Both values must come from the catalogs;
    /// on error the registry is left untouched.
    pub fn add(&mut self, disclosure_id: &str, reason: &str) -> Result<(), WorkflowError> {
        let disclosure_id = disclosure_id.trim();
        let reason = reason.trim();
        if disclosure_id.is_empty() {
            return Err(WorkflowError::MissingDisclosure);
        }
        if reason.is_empty() {
            return Err(WorkflowError::MissingReason);
        }
        if !DISCLOSURE_CATALOG.contains(&disclosure_id) {
            return Err(WorkflowError::UnknownDisclosure(disclosure_id.to_string()));
        }
        let reason: OmissionReason = reason
            .parse()
            .map_err(|_| WorkflowError::UnknownReason(reason.to_string()))?;

        self.entries.insert(disclosure_id.to_string(), reason);
        Ok(())
    }

    /// Remove an omission; absent ids are ignored.
    pub fn remove(&mut self, disclosure_id: &str) {
        self.entries.remove(disclosure_id);
    }

    pub fn get(&self, disclosure_id: &str) -> Option<OmissionReason> {
        self.entries.get(disclosure_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OmissionReason)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// JSON object form sent to the analysis API.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }
}

// ═══════════════════════════════════════════════════════════
// Wizard
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStep {
    Framework = 1,
    Upload = 2,
    Omissions = 3,
    Confirm = 4,
}

impl WorkflowStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Framework => Some(Self::Upload),
            Self::Upload => Some(Self::Omissions),
            Self::Omissions => Some(Self::Confirm),
            Self::Confirm => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            Self::Framework => None,
            Self::Upload => Some(Self::Framework),
            Self::Omissions => Some(Self::Upload),
            Self::Confirm => Some(Self::Omissions),
        }
    }
}

/// Payload emitted when the wizard is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidedCompletion {
    pub file: Option<PathBuf>,
    pub compliance_type: ComplianceType,
    pub omissions: OmissionRegistry,
}

/// Result of pressing Next.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Advanced(WorkflowStep),
    Completed(GuidedCompletion),
    /// The wizard already finished; nothing happened.
    Closed,
}

#[derive(Debug, Clone)]
pub struct GuidedWorkflow {
    step: WorkflowStep,
    file: Option<PathBuf>,
    compliance_type: ComplianceType,
    omissions: OmissionRegistry,
    finished: bool,
}

impl GuidedWorkflow {
    pub fn new() -> Self {
        Self {
            step: WorkflowStep::Framework,
            file: None,
            compliance_type: ComplianceType::default(),
            omissions: OmissionRegistry::new(),
            finished: false,
        }
    }

    /// Current step, or `None` once the wizard has finished.
    pub fn step(&self) -> Option<WorkflowStep> {
        (!self.finished).then_some(self.step)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn compliance_type(&self) -> ComplianceType {
        self.compliance_type
    }

    pub fn set_compliance_type(&mut self, compliance_type: ComplianceType) {
        self.compliance_type = compliance_type;
    }

    pub fn selected_file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn select_file(&mut self, file: Option<PathBuf>) {
        self.file = file;
    }

    pub fn omissions(&self) -> &OmissionRegistry {
        &self.omissions
    }

    pub fn add_omission(&mut self, disclosure_id: &str, reason: &str) -> Result<(), WorkflowError> {
        self.omissions.add(disclosure_id, reason)
    }

    pub fn remove_omission(&mut self, disclosure_id: &str) {
        self.omissions.remove(disclosure_id);
    }

    /// Advance one step, or finish from the confirmation step.
    pub fn next(&mut self) -> Transition {
        if self.finished {
            return Transition::Closed;
        }
        let current = self.step;
        match current.next() {
            Some(step) => {
                if current == WorkflowStep::Upload && self.file.is_none() {
                    tracing::debug!("Leaving document step without a file");
                }
                self.step = step;
                Transition::Advanced(step)
            }
            None => {
                self.finished = true;
                tracing::info!(
                    compliance_type = %self.compliance_type,
                    omissions = self.omissions.len(),
                    has_file = self.file.is_some(),
                    "Guided setup completed"
                );
                Transition::Completed(GuidedCompletion {
                    file: self.file.take(),
                    compliance_type: self.compliance_type,
                    omissions: std::mem::take(&mut self.omissions),
                })
            }
        }
    }

    /// Go back one step. No-op on the first step and after finishing.
    pub fn previous(&mut self) -> Option<WorkflowStep> {
        if self.finished {
            return None;
        }
        self.step = self.step.previous().unwrap_or(self.step);
        Some(self.step)
    }
}

impl Default for GuidedWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMISSIONS: &str = "GRI 305: Emissions 2016_305-1";

    #[test]
    fn starts_on_framework_with_gri() {
        let wizard = GuidedWorkflow::new();
        assert_eq!(wizard.step(), Some(WorkflowStep::Framework));
        assert_eq!(wizard.compliance_type(), ComplianceType::Gri);
        assert!(wizard.omissions().is_empty());
    }

    #[test]
    fn previous_on_first_step_is_noop() {
        let mut wizard = GuidedWorkflow::new();
        assert_eq!(wizard.previous(), Some(WorkflowStep::Framework));
        assert_eq!(wizard.step().unwrap().number(), 1);
    }

    #[test]
    fn previous_goes_back_one_step() {
        let mut wizard = GuidedWorkflow::new();
        wizard.next();
        wizard.next();
        assert_eq!(wizard.step(), Some(WorkflowStep::Omissions));
        assert_eq!(wizard.previous(), Some(WorkflowStep::Upload));
    }

    #[test]
    fn four_nexts_complete_exactly_once() {
        let mut wizard = GuidedWorkflow::new();
        wizard.set_compliance_type(ComplianceType::Ifrs);
        wizard.select_file(Some(PathBuf::from("report.pdf")));
        wizard.add_omission(EMISSIONS, "confidential").unwrap();

        let mut completions = Vec::new();
        for _ in 0..6 {
            if let Transition::Completed(done) = wizard.next() {
                completions.push(done);
            }
        }

        assert_eq!(completions.len(), 1);
        let done = &completions[0];
        assert_eq!(done.file, Some(PathBuf::from("report.pdf")));
        assert_eq!(done.compliance_type, ComplianceType::Ifrs);
        assert_eq!(done.omissions.get(EMISSIONS), Some(OmissionReason::Confidential));
        assert_eq!(done.omissions.len(), 1);
        assert!(wizard.is_finished());
        assert_eq!(wizard.step(), None);
        assert_eq!(wizard.previous(), None);
    }

    #[test]
    fn next_sequence_visits_every_step() {
        let mut wizard = GuidedWorkflow::new();
        assert_eq!(wizard.next(), Transition::Advanced(WorkflowStep::Upload));
        assert_eq!(wizard.next(), Transition::Advanced(WorkflowStep::Omissions));
        assert_eq!(wizard.next(), Transition::Advanced(WorkflowStep::Confirm));
        assert!(matches!(wizard.next(), Transition::Completed(_)));
        assert_eq!(wizard.next(), Transition::Closed);
    }

    #[test]
    fn file_is_optional() {
        let mut wizard = GuidedWorkflow::new();
        let mut last = Transition::Closed;
        for _ in 0..4 {
            last = wizard.next();
        }
        match last {
            Transition::Completed(done) => assert!(done.file.is_none()),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn compliance_type_persists_across_steps() {
        let mut wizard = GuidedWorkflow::new();
        wizard.set_compliance_type(ComplianceType::Ifrs);
        wizard.next();
        wizard.next();
        wizard.previous();
        assert_eq!(wizard.compliance_type(), ComplianceType::Ifrs);
    }

    #[test]
    fn add_omission_overwrites_existing_reason() {
        let mut registry = OmissionRegistry::new();
        registry.add(EMISSIONS, "confidential").unwrap();
        registry.add(EMISSIONS, "legal prohibition").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(EMISSIONS), Some(OmissionReason::LegalProhibition));
    }

    #[test]
    fn add_omission_rejects_incomplete_or_unknown_entries() {
        let mut registry = OmissionRegistry::new();
        assert_eq!(registry.add("", "confidential"), Err(WorkflowError::MissingDisclosure));
        assert_eq!(registry.add(EMISSIONS, ""), Err(WorkflowError::MissingReason));
        assert!(matches!(
            registry.add("GRI 999: Made Up_999-1", "confidential"),
            Err(WorkflowError::UnknownDisclosure(_))
        ));
        assert!(matches!(
            registry.add(EMISSIONS, "too expensive"),
            Err(WorkflowError::UnknownReason(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_omission_is_idempotent() {
        let mut registry = OmissionRegistry::new();
        registry.add(EMISSIONS, "confidential").unwrap();
        registry.remove(EMISSIONS);
        registry.remove(EMISSIONS);
        registry.remove("never added");
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_serializes_as_plain_object() {
        let mut registry = OmissionRegistry::new();
        registry.add(EMISSIONS, "not applicable").unwrap();
        assert_eq!(
            registry.to_json(),
            r#"{"GRI 305: Emissions 2016_305-1":"not applicable"}"#
        );
    }

    #[test]
    fn every_catalog_entry_is_accepted() {
        let mut registry = OmissionRegistry::new();
        for id in DISCLOSURE_CATALOG {
            for reason in OmissionReason::ALL {
                registry.add(id, reason.as_str()).unwrap();
            }
        }
        assert_eq!(registry.len(), DISCLOSURE_CATALOG.len());
    }
}
