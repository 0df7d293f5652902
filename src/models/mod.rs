pub mod analytics;
pub mod enums;
pub mod report;

pub use analytics::{ComplianceStat, Suggestion};
pub use enums::{ComplianceType, Locale, OmissionReason, ParseEnumError, ReportColumn};
pub use report::{format_score, Omission, ReportRow};
