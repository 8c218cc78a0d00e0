use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ConvertError;
use crate::table_detect::DEFAULT_SNAP_TOLERANCE;

pub const DEFAULT_CURRENCY: &str = "DOP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub pages: Option<PageSelection>,
    pub delimiter: u8,
    /// ISO currency code stamped on every record.
    pub currency: String,
    /// Distance under which ruling lines are treated as touching.
    pub snap_tolerance: f32,
    /// Reprocess even when the outputs already exist.
    pub force: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            pages: None,
            delimiter: b',',
            currency: DEFAULT_CURRENCY.to_string(),
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            force: false,
        }
    }
}

impl ConvertOptions {
    pub(crate) fn validate(&self) -> Result<(), ConvertError> {
        if self.currency.trim().is_empty() {
            return Err(ConvertError::InvalidOption(
                "currency code cannot be empty".to_string(),
            ));
        }
        if !self.snap_tolerance.is_finite() || self.snap_tolerance < 0.0 {
            return Err(ConvertError::InvalidOption(format!(
                "snap tolerance must be a non-negative number, got {}",
                self.snap_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConvertOptions, PageSelection};
    use crate::error::ConvertError;
    use std::str::FromStr;

    #[test]
    fn parse_page_selection_range_and_single() {
        let selection = PageSelection::from_str("1-3,5").expect("selection should parse");
        assert!(selection.contains(1));
        assert!(selection.contains(2));
        assert!(selection.contains(3));
        assert!(selection.contains(5));
        assert!(!selection.contains(4));
    }

    #[test]
    fn reject_invalid_page_selection() {
        let err = PageSelection::from_str("3-1").expect_err("invalid range should fail");
        assert!(err.contains("invalid range"));
    }

    #[test]
    fn selection_is_deduplicated_and_ordered() {
        let selection = PageSelection::from_str("4, 2-3,3").expect("selection should parse");
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn default_options_are_valid() {
        let options = ConvertOptions::default();
        assert_eq!(options.currency, "DOP");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_negative_tolerance() {
        let options = ConvertOptions {
            snap_tolerance: -1.0,
            ..ConvertOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConvertError::InvalidOption(message)) if message.contains("snap tolerance")
        ));
    }
}
