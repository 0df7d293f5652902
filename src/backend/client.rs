use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::types::{
    error_detail, AnalysisParams, AnalyticsReply, AnalyzeReply, AuthReply, Credentials,
    DocumentUpload, RawAnalyzeReply, RawUploadReply,
};
use super::{BackendError, ComplianceBackend};
use crate::config::AppConfig;
use crate::models::{ComplianceType, Locale};

/// HTTP client for the analysis API.
///
/// Only the connect phase is bounded: analysis of a large document can
/// legitimately take minutes, and the caller cancels when it wants to.
/// A connect timeout therefore surfaces as [`BackendError::Connection`].
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        Self::new(&config.api_base_url, config.connect_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            BackendError::HttpClient(format!("Invalid API URL {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| BackendError::HttpClient(format!("Invalid API URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Connection(self.base_url.clone())
        } else {
            BackendError::HttpClient(e.to_string())
        }
    }

    /// Send, check the status, decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }
}

impl ComplianceBackend for HttpBackend {
    async fn upload(&self, document: DocumentUpload) -> Result<String, BackendError> {
        let size = document.bytes.len();
        let part = Part::bytes(document.bytes).file_name(document.file_name.clone());
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["upload"])?;
        let reply: RawUploadReply = self.execute(self.client.post(url).multipart(form)).await?;
        let doc_id = reply.into_doc_id()?;

        tracing::info!(file = %document.file_name, bytes = size, doc_id = %doc_id, "Document uploaded");
        Ok(doc_id)
    }

    async fn analyze(
        &self,
        doc_id: &str,
        params: &AnalysisParams,
    ) -> Result<AnalyzeReply, BackendError> {
        let url = self.endpoint(&["analyze", doc_id])?;
        let request = self.client.get(url).query(&params.query_pairs());
        let raw: RawAnalyzeReply = self.execute(request).await?;
        let reply = raw.into_reply()?;

        match &reply {
            AnalyzeReply::Report { rows, suggestions } => tracing::info!(
                doc_id = %doc_id,
                framework = %params.compliance_type,
                rows = rows.len(),
                suggestions = suggestions.len(),
                "Analysis received"
            ),
            AnalyzeReply::Cancelled { message } => {
                tracing::info!(doc_id = %doc_id, %message, "Analysis cancelled by server")
            }
        }
        Ok(reply)
    }

    async fn analytics(
        &self,
        compliance_type: ComplianceType,
        locale: Locale,
    ) -> Result<AnalyticsReply, BackendError> {
        let url = self.endpoint(&["analytics"])?;
        let request = self.client.get(url).query(&[
            ("compliance_type", compliance_type.as_str()),
            ("lang", locale.code()),
        ]);
        let reply: AnalyticsReply = self.execute(request).await?;
        reply.validated()
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthReply, BackendError> {
        let url = self.endpoint(&["login"])?;
        self.execute(self.client.post(url).json(credentials)).await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<AuthReply, BackendError> {
        let url = self.endpoint(&["signup"])?;
        self.execute(self.client.post(url).json(credentials)).await
    }
}
