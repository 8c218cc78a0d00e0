use std::collections::BTreeMap;

use crate::family::{Channel, ReportFamily};
use crate::model::CsvTable;
use crate::reshape::PriceRecord;

/// Finished records for one output channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub channel: Channel,
    pub records: Vec<PriceRecord>,
}

impl Report {
    #[must_use]
    pub fn to_table(&self, family: ReportFamily) -> CsvTable {
        CsvTable {
            headers: family.record_headers(),
            rows: self.records.iter().map(PriceRecord::to_row).collect(),
        }
    }
}

/// Collects per-page record batches; batches are only concatenated once the
/// whole document has been read.
#[derive(Debug)]
pub struct ReportAggregator {
    family: ReportFamily,
    batches: BTreeMap<Channel, Vec<Vec<PriceRecord>>>,
}

impl ReportAggregator {
    #[must_use]
    pub fn new(family: ReportFamily) -> Self {
        Self {
            family,
            batches: BTreeMap::new(),
        }
    }

    pub fn add_page(&mut self, channel: Channel, records: Vec<PriceRecord>) {
        if records.is_empty() {
            return;
        }
        self.batches.entry(channel).or_default().push(records);
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.batches.values().flatten().map(Vec::len).sum()
    }

    /// Reports in channel order. Retail surveys always yield their single
    /// report, even when empty; other channels appear only with records.
    #[must_use]
    pub fn finalize(mut self) -> Vec<Report> {
        if self.family.always_writes_single() {
            self.batches.entry(Channel::Single).or_default();
        }

        self.batches
            .into_iter()
            .map(|(channel, batches)| Report {
                channel,
                records: batches.into_iter().flatten().collect(),
            })
            .collect()
    }
}
