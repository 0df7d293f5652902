//! Page-level controllers driven by the CLI.
//!
//! Each controller takes its session and backend explicitly; nothing is
//! looked up from ambient state.

pub mod analytics;
pub mod auth;
pub mod dashboard;

use thiserror::Error;

use crate::backend::BackendError;
use crate::report::ExportError;
use crate::session::SessionError;
use crate::workflow::WorkflowError;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{0}")]
    Validation(String),
    #[error("No report data available. Please upload and analyze a document first.")]
    NoReport,
}

impl CommandError {
    /// Inline message for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
