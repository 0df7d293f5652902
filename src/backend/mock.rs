use std::sync::Mutex;
use std::time::Duration;

use super::types::{
    AnalysisParams, AnalyticsReply, AnalyzeReply, AuthReply, Credentials, DocumentUpload,
};
use super::{BackendError, ComplianceBackend};
use crate::models::{ComplianceType, Locale, ReportRow, Suggestion};

/// A call observed by [`MockBackend`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    UploadStarted(String),
    UploadFinished(String),
    Analyze {
        doc_id: String,
        query: Vec<(&'static str, String)>,
    },
    Analytics(ComplianceType, Locale),
    Login(String),
    Signup(String),
}

/// Backend serving canned replies, with optional delays and failures.
pub struct MockBackend {
    rows: Vec<ReportRow>,
    suggestions: Vec<Suggestion>,
    analytics: AnalyticsReply,
    upload_delay: Duration,
    analyze_delay: Duration,
    upload_failure: Option<String>,
    analyze_failure: Option<String>,
    server_cancels: bool,
    auth_rejection: Option<(u16, String)>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockBackend {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self {
            rows,
            suggestions: Vec::new(),
            analytics: AnalyticsReply::default(),
            upload_delay: Duration::ZERO,
            analyze_delay: Duration::ZERO,
            upload_failure: None,
            analyze_failure: None,
            server_cancels: false,
            auth_rejection: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_analytics(mut self, analytics: AnalyticsReply) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn with_analyze_delay(mut self, delay: Duration) -> Self {
        self.analyze_delay = delay;
        self
    }

    /// Upload answers with a 500 carrying `detail`.
    pub fn failing_upload(mut self, detail: &str) -> Self {
        self.upload_failure = Some(detail.to_string());
        self
    }

    /// Analyze answers with a 500 carrying `detail`.
    pub fn failing_analyze(mut self, detail: &str) -> Self {
        self.analyze_failure = Some(detail.to_string());
        self
    }

    /// Analyze answers `{"message": "Analysis cancelled"}`.
    pub fn cancelling_on_server(mut self) -> Self {
        self.server_cancels = true;
        self
    }

    /// Login and signup answer `status` with `detail`.
    pub fn rejecting_auth(mut self, status: u16, detail: &str) -> Self {
        self.auth_rejection = Some((status, detail.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().clone()
    }

    fn record(&self, call: MockCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failure(detail: &str) -> BackendError {
        BackendError::Status {
            status: 500,
            detail: detail.to_string(),
        }
    }

    fn auth(&self, credentials: &Credentials) -> Result<AuthReply, BackendError> {
        match &self.auth_rejection {
            Some((status, detail)) => Err(BackendError::Status {
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(AuthReply {
                message: "ok".into(),
                username: Some(credentials.username.clone()),
            }),
        }
    }
}

impl ComplianceBackend for MockBackend {
    async fn upload(&self, document: DocumentUpload) -> Result<String, BackendError> {
        self.record(MockCall::UploadStarted(document.file_name.clone()));
        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }
        if let Some(detail) = &self.upload_failure {
            return Err(Self::failure(detail));
        }
        self.record(MockCall::UploadFinished(document.file_name.clone()));
        Ok(document.file_name)
    }

    async fn analyze(
        &self,
        doc_id: &str,
        params: &AnalysisParams,
    ) -> Result<AnalyzeReply, BackendError> {
        self.record(MockCall::Analyze {
            doc_id: doc_id.to_string(),
            query: params.query_pairs(),
        });
        if !self.analyze_delay.is_zero() {
            tokio::time::sleep(self.analyze_delay).await;
        }
        if let Some(detail) = &self.analyze_failure {
            return Err(Self::failure(detail));
        }
        if self.server_cancels {
            return Ok(AnalyzeReply::Cancelled {
                message: "Analysis cancelled".into(),
            });
        }
        Ok(AnalyzeReply::Report {
            rows: self.rows.clone(),
            suggestions: self.suggestions.clone(),
        })
    }

    async fn analytics(
        &self,
        compliance_type: ComplianceType,
        locale: Locale,
    ) -> Result<AnalyticsReply, BackendError> {
        self.record(MockCall::Analytics(compliance_type, locale));
        Ok(self.analytics.clone())
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthReply, BackendError> {
        self.record(MockCall::Login(credentials.username.clone()));
        self.auth(credentials)
    }

    async fn signup(&self, credentials: &Credentials) -> Result<AuthReply, BackendError> {
        self.record(MockCall::Signup(credentials.username.clone()));
        self.auth(credentials)
    }
}
