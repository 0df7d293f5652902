//! Request and response schemas of the analysis API.
//!
//! Replies are decoded into private raw structs first, then checked and
//! converted, so malformed data surfaces as a typed error at the
//! boundary instead of deep inside the report views.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::models::{ComplianceStat, ComplianceType, Locale, ReportRow, Suggestion};
use crate::workflow::OmissionRegistry;

// ═══════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════

/// A document read into memory, ready for multipart upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub async fn from_path(path: &Path) -> Result<Self, BackendError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                BackendError::InvalidData(format!("no file name in {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }
}

/// Everything the analyze call is keyed on besides the document id.
#[derive(Debug, Clone, Default)]
pub struct AnalysisParams {
    pub compliance_type: ComplianceType,
    pub locale: Locale,
    pub omissions: OmissionRegistry,
}

impl AnalysisParams {
    /// Query string pairs. `omissions` is sent as a JSON object and only
    /// when at least one was declared.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("compliance_type", self.compliance_type.as_str().to_string()),
            ("lang", self.locale.code().to_string()),
        ];
        if !self.omissions.is_empty() {
            pairs.push(("omissions", self.omissions.to_json()));
        }
        pairs
    }
}

/// Body of `POST /login` and `POST /signup`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

// ═══════════════════════════════════════════
// Replies
// ═══════════════════════════════════════════

#[derive(Deserialize)]
pub(crate) struct RawUploadReply {
    doc_id: Option<String>,
}

impl RawUploadReply {
    pub(crate) fn into_doc_id(self) -> Result<String, BackendError> {
        match self.doc_id {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(BackendError::InvalidData("upload reply has no doc_id".into())),
        }
    }
}

/// Decoded `GET /analyze/{doc_id}` reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeReply {
    Report {
        rows: Vec<ReportRow>,
        suggestions: Vec<Suggestion>,
    },
    /// The server gave up on the request, e.g. after the client went away.
    Cancelled { message: String },
}

#[derive(Deserialize)]
pub(crate) struct RawAnalyzeReply {
    report: Option<Vec<ReportRow>>,
    #[serde(default)]
    suggestions: Vec<Suggestion>,
    message: Option<String>,
}

impl RawAnalyzeReply {
    pub(crate) fn into_reply(self) -> Result<AnalyzeReply, BackendError> {
        match (self.report, self.message) {
            (Some(rows), _) => {
                for row in &rows {
                    row.validate().map_err(BackendError::InvalidData)?;
                }
                Ok(AnalyzeReply::Report {
                    rows,
                    suggestions: self.suggestions,
                })
            }
            (None, Some(message)) => Ok(AnalyzeReply::Cancelled { message }),
            (None, None) => Err(BackendError::InvalidData(
                "analyze reply has neither report nor message".into(),
            )),
        }
    }
}

/// Decoded `GET /analytics` reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReply {
    #[serde(default)]
    pub compliance_stats: Vec<ComplianceStat>,
    #[serde(default)]
    pub ai_suggestions: Vec<Suggestion>,
}

impl AnalyticsReply {
    pub(crate) fn validated(self) -> Result<Self, BackendError> {
        if let Some(bad) = self
            .compliance_stats
            .iter()
            .find(|s| !s.avg_score.is_finite() || !(0.0..=100.0).contains(&s.avg_score))
        {
            return Err(BackendError::InvalidData(format!(
                "average score {} out of range for {:?}",
                bad.avg_score, bad.standard
            )));
        }
        Ok(self)
    }
}

/// Successful login or signup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub message: String,
    pub username: Option<String>,
}

/// FastAPI-style error body. `detail` is usually a string but
/// validation failures send a list.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    detail: serde_json::Value,
}

/// Extract a readable detail from an error response body.
pub(crate) fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
