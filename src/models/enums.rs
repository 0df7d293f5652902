use serde::{Deserialize, Serialize};

/// A string did not name any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value:?}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same strings as `as_str`.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Reasons a disclosure may be formally omitted.
    OmissionReason {
        NotApplicable => "not applicable",
        Confidential => "confidential",
        LegalProhibition => "legal prohibition",
        InformationUnavailable => "information unavailable",
    }
);

str_enum!(
    /// Report table columns. Declaration order is the canonical display
    /// and export order, so `Ord` sorts columns correctly.
    ReportColumn {
        Standard => "Standard",
        Requirement => "Requirement",
        ComplianceScore => "Compliance Score",
        Remarks => "Remarks",
        Omission => "Omission",
        SectorRef => "Sector Ref",
    }
);

/// Compliance framework a document is analyzed against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceType {
    #[default]
    #[serde(rename = "GRI")]
    Gri,
    #[serde(rename = "IFRS")]
    Ifrs,
}

impl ComplianceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gri => "GRI",
            Self::Ifrs => "IFRS",
        }
    }
}

impl std::fmt::Display for ComplianceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplianceType {
    type Err = ParseEnumError;

    /// Case-insensitive: the backend upper-cases the value anyway.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GRI" => Ok(Self::Gri),
            "IFRS" => Ok(Self::Ifrs),
            _ => Err(ParseEnumError {
                field: "ComplianceType".into(),
                value: s.into(),
            }),
        }
    }
}

/// Output language requested from the analysis API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "fr", alias = "french")]
    Fr,
    #[serde(rename = "ar")]
    Ar,
}

impl Locale {
    pub const ALL: &'static [Locale] = &[Self::En, Self::Es, Self::Fr, Self::Ar];

    /// ISO 639-1 code sent as the `lang` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::Ar => "ar",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = ParseEnumError;

    /// Accepts the canonical codes plus the legacy `"french"` spelling,
    /// which is normalized to `fr`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            "fr" | "french" => Ok(Self::Fr),
            "ar" => Ok(Self::Ar),
            _ => Err(ParseEnumError {
                field: "Locale".into(),
                value: s.into(),
            }),
        }
    }
}
