//! Analysis API access.
//!
//! [`ComplianceBackend`] is the seam between the application and the
//! remote service: [`HttpBackend`] talks to the real API, [`MockBackend`]
//! serves canned replies for tests and offline runs.

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

use std::future::Future;

pub use client::HttpBackend;
pub use error::BackendError;
pub use mock::{MockBackend, MockCall};
pub use types::{AnalysisParams, AnalyticsReply, AnalyzeReply, AuthReply, Credentials, DocumentUpload};

use crate::models::{ComplianceType, Locale};

/// Operations offered by the analysis API.
pub trait ComplianceBackend: Send + Sync {
    /// Store a document and return its opaque id.
    fn upload(
        &self,
        document: DocumentUpload,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Analyze a previously uploaded document.
    fn analyze(
        &self,
        doc_id: &str,
        params: &AnalysisParams,
    ) -> impl Future<Output = Result<AnalyzeReply, BackendError>> + Send;

    /// Aggregated scores and suggestions over every stored report.
    fn analytics(
        &self,
        compliance_type: ComplianceType,
        locale: Locale,
    ) -> impl Future<Output = Result<AnalyticsReply, BackendError>> + Send;

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthReply, BackendError>> + Send;

    fn signup(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthReply, BackendError>> + Send;
}
