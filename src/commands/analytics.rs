use serde::Serialize;

use crate::backend::{AnalyticsReply, ComplianceBackend};
use crate::models::{ComplianceStat, ComplianceType, Locale, Suggestion};
use crate::report::ChartPoint;
use crate::session::SessionContext;

use super::CommandError;

/// Analytics page data. A backend failure yields an empty view carrying
/// the message instead of an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub compliance_type: ComplianceType,
    pub compliance_stats: Vec<ComplianceStat>,
    pub ai_suggestions: Vec<Suggestion>,
    pub error: Option<String>,
}

impl AnalyticsView {
    /// Average score per standard, rounded for display.
    pub fn chart(&self) -> Vec<ChartPoint> {
        self.compliance_stats
            .iter()
            .map(|s| ChartPoint {
                standard: s.standard.clone(),
                avg_score: s.avg_score.round() as i64,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.compliance_stats.is_empty() && self.ai_suggestions.is_empty()
    }
}

pub async fn load_analytics<B: ComplianceBackend>(
    backend: &B,
    session: &SessionContext,
    compliance_type: ComplianceType,
    locale: Locale,
) -> Result<AnalyticsView, CommandError> {
    session.require_user()?;

    match backend.analytics(compliance_type, locale).await {
        Ok(AnalyticsReply {
            compliance_stats,
            ai_suggestions,
        }) => {
            tracing::debug!(
                framework = %compliance_type,
                standards = compliance_stats.len(),
                "Analytics loaded"
            );
            Ok(AnalyticsView {
                compliance_type,
                compliance_stats,
                ai_suggestions,
                error: None,
            })
        }
        Err(e) => {
            tracing::warn!(framework = %compliance_type, error = %e, "Analytics unavailable");
            Ok(AnalyticsView {
                compliance_type,
                error: Some(e.user_message()),
                ..AnalyticsView::default()
            })
        }
    }
}
