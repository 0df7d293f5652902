use serde::{Deserialize, Serialize};

/// Standard label of the synthetic row produced when analysis fails.
pub const ERROR_STANDARD: &str = "Error";

/// Remarks of the synthetic error row.
pub const ERROR_REMARKS: &str = "Failed to process the document.";

/// Declared omission of a disclosure, as reported by the analysis API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omission {
    pub reason: String,
    #[serde(default)]
    pub explanation: String,
}

impl Omission {
    /// `"<reason>: <explanation>"`, the form used in tables, exports and search.
    pub fn label(&self) -> String {
        format!("{}: {}", self.reason, self.explanation)
    }
}

/// One compliance-requirement assessment line.
///
/// Field names on the wire match the analysis API's report table
/// headers ("Compliance Score", "Sector Ref", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Standard")]
    pub standard: String,
    #[serde(rename = "Requirement")]
    pub requirement: String,
    #[serde(rename = "Compliance Score")]
    pub compliance_score: f64,
    #[serde(rename = "Remarks", default)]
    pub remarks: String,
    #[serde(rename = "Omission", default)]
    pub omission: Option<Omission>,
    #[serde(rename = "Sector Ref", default)]
    pub sector_ref: Option<String>,
}

impl ReportRow {
    /// Synthetic row standing in for a failed analysis, so views always
    /// have something to render.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            standard: ERROR_STANDARD.to_string(),
            requirement: message.into(),
            compliance_score: 0.0,
            remarks: ERROR_REMARKS.to_string(),
            omission: None,
            sector_ref: None,
        }
    }

    /// Score 0 is the non-compliant sentinel.
    pub fn is_non_compliant(&self) -> bool {
        self.compliance_score == 0.0
    }

    /// Decimal string form of the score; whole numbers carry no decimal part.
    pub fn score_label(&self) -> String {
        format_score(self.compliance_score)
    }

    /// Whether the row declares an omission with reason "not applicable"
    /// (case-insensitive).
    pub fn is_omitted_as_not_applicable(&self) -> bool {
        self.omission
            .as_ref()
            .is_some_and(|o| o.reason.eq_ignore_ascii_case("not applicable"))
    }

    /// Boundary check for rows decoded from the API.
    pub fn validate(&self) -> Result<(), String> {
        if !self.compliance_score.is_finite()
            || !(0.0..=100.0).contains(&self.compliance_score)
        {
            return Err(format!(
                "compliance score {} out of range for requirement {:?}",
                self.compliance_score, self.requirement
            ));
        }
        Ok(())
    }
}

/// Render a score the way a person would write it: `80`, `45.5`.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}
