use chrono::DateTime;
use serde::{Deserialize, Serialize};

pub const REPORTS_BUCKET_BINDING: &str = "REPORTS";
pub const REPORT_FAMILY_VAR: &str = "REPORT_FAMILY";
pub const DEFAULT_REPORT_FAMILY: &str = "a";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Object notification delivered by the storage queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    pub bucket: String,
    pub object: StoredObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    /// Every output was already stored; the PDF was not read.
    Existing,
    Converted,
    /// The object is not a PDF.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionResponse {
    pub bucket: String,
    pub key: String,
    pub family: String,
    pub status: ConversionStatus,
    pub outputs: Vec<String>,
    pub records: usize,
    pub processed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// RFC 3339 rendering of a millisecond Unix timestamp.
pub fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|instant| instant.to_rfc3339())
        .unwrap_or_default()
}
