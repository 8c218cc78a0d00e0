use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Placeholder written into missing cells of retail surveys.
pub const MISSING_CELL: &str = "--";

/// The two supported survey layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFamily {
    /// Family A: retail price survey, products by supermarket.
    Retail,
    /// Family B: pharmacy price survey with generic and commercial listings.
    Pharmacy,
}

impl ReportFamily {
    #[must_use]
    pub const fn identity_fields(self) -> &'static [&'static str] {
        match self {
            Self::Retail => &["description", "unit"],
            Self::Pharmacy => &["medication_name", "dosage", "maker", "unit"],
        }
    }

    /// Output header row, in column order.
    #[must_use]
    pub fn record_headers(self) -> Vec<String> {
        let mut headers = vec!["id".to_string(), "file_id".to_string()];
        headers.extend(self.identity_fields().iter().map(|field| (*field).to_string()));
        headers.extend(
            ["vendor", "price", "currency", "start_date", "end_date"]
                .iter()
                .map(|field| (*field).to_string()),
        );
        headers
    }

    /// Channels this family may write, in output order.
    #[must_use]
    pub const fn channels(self) -> &'static [Channel] {
        match self {
            Self::Retail => &[Channel::Single],
            Self::Pharmacy => &[Channel::Single, Channel::Generic, Channel::Commercial],
        }
    }

    pub(crate) const fn strips_newlines(self) -> bool {
        matches!(self, Self::Retail)
    }

    pub(crate) const fn missing_cell(self) -> Option<&'static str> {
        match self {
            Self::Retail => Some(MISSING_CELL),
            Self::Pharmacy => None,
        }
    }

    /// Whether the family writes its single channel even with no records.
    pub(crate) const fn always_writes_single(self) -> bool {
        matches!(self, Self::Retail)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retail => "retail",
            Self::Pharmacy => "pharmacy",
        }
    }
}

impl Display for ReportFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFamily {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" | "retail" => Ok(Self::Retail),
            "b" | "pharmacy" | "pharma" => Ok(Self::Pharmacy),
            other => Err(format!(
                "unknown report family '{other}', expected a|retail or b|pharmacy"
            )),
        }
    }
}

/// Output report bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Single,
    Generic,
    Commercial,
}

impl Channel {
    /// Suffix appended to the input stem for this channel's CSV.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Single => "",
            Self::Generic => "-generic",
            Self::Commercial => "-commercial",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Generic => "generic",
            Self::Commercial => "commercial",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
