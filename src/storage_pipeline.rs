use std::str::FromStr;

use precios_to_csv::{ConvertOptions, ReportFamily, convert_pdf_bytes, output_key};
use worker::{Bucket, Date, Env, HttpMetadata};

use crate::error::ApiError;
use crate::keys::{decode_object_key, is_pdf_key, output_keys};
use crate::models::{
    CSV_CONTENT_TYPE, ConversionResponse, ConversionStatus, DEFAULT_REPORT_FAMILY,
    REPORT_FAMILY_VAR, REPORTS_BUCKET_BINDING, StorageEvent, format_timestamp,
};

pub fn parse_family(value: &str) -> Result<ReportFamily, ApiError> {
    ReportFamily::from_str(value).map_err(ApiError::Validation)
}

/// Family configured for this deployment, `a` when unset.
pub fn configured_family(env: &Env) -> Result<ReportFamily, ApiError> {
    let value = env
        .var(REPORT_FAMILY_VAR)
        .map(|value| value.to_string())
        .unwrap_or_else(|_| DEFAULT_REPORT_FAMILY.to_string());
    parse_family(&value)
}

fn response(
    event: &StorageEvent,
    key: &str,
    family: ReportFamily,
    status: ConversionStatus,
    outputs: Vec<String>,
    records: usize,
) -> ConversionResponse {
    ConversionResponse {
        bucket: event.bucket.clone(),
        key: key.to_string(),
        family: family.to_string(),
        status,
        outputs,
        records,
        processed_at: format_timestamp(Date::now().as_millis()),
    }
}

async fn existing_outputs(
    bucket: &Bucket,
    key: &str,
    family: ReportFamily,
) -> Result<Vec<String>, ApiError> {
    let mut existing = Vec::new();
    for (_, output) in output_keys(key, family) {
        if bucket.head(output.as_str()).await?.is_some() {
            existing.push(output);
        }
    }
    Ok(existing)
}

async fn fetch_pdf_bytes(bucket: &Bucket, key: &str) -> Result<Vec<u8>, ApiError> {
    let object = bucket
        .get(key)
        .execute()
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("object '{key}' not found")))?;
    let body = object
        .body()
        .ok_or_else(|| ApiError::NotFound(format!("object '{key}' has no body")))?;
    let bytes = body.bytes().await?;
    if bytes.is_empty() {
        return Err(ApiError::Conversion(format!("object '{key}' is empty")));
    }
    Ok(bytes)
}

/// Converts the PDF named by `event` and stores its CSV reports next to it
/// in the reports bucket.
pub async fn process_event(
    env: &Env,
    event: &StorageEvent,
    family: ReportFamily,
    force: bool,
) -> Result<ConversionResponse, ApiError> {
    let key = decode_object_key(&event.object.key);
    if !is_pdf_key(&key) {
        worker::console_log!("ignoring non-PDF object '{key}'");
        return Ok(response(event, &key, family, ConversionStatus::Skipped, Vec::new(), 0));
    }

    let bucket = env.bucket(REPORTS_BUCKET_BINDING)?;
    if !force {
        let existing = existing_outputs(&bucket, &key, family).await?;
        if !existing.is_empty() {
            worker::console_log!("outputs for '{key}' already exist, skipping");
            return Ok(response(event, &key, family, ConversionStatus::Existing, existing, 0));
        }
    }

    let pdf_bytes = fetch_pdf_bytes(&bucket, &key).await?;
    let options = ConvertOptions {
        force,
        ..ConvertOptions::default()
    };
    let (channel_csvs, report) = convert_pdf_bytes(&pdf_bytes, &key, family, &options)?;

    for warning in &report.warnings {
        worker::console_log!(
            "'{key}' page {:?}: {:?} {}",
            warning.page,
            warning.code,
            warning.message
        );
    }

    let mut outputs = Vec::with_capacity(channel_csvs.len());
    for channel_csv in channel_csvs {
        let output = output_key(&key, channel_csv.channel);
        bucket
            .put(output.as_str(), channel_csv.csv.into_bytes())
            .http_metadata(HttpMetadata {
                content_type: Some(CSV_CONTENT_TYPE.to_string()),
                ..HttpMetadata::default()
            })
            .execute()
            .await?;
        outputs.push(output);
    }

    worker::console_log!(
        "converted '{key}': family={family}, pages={}, records={}, outputs={}",
        report.page_count,
        report.record_count,
        outputs.len()
    );

    Ok(response(
        event,
        &key,
        family,
        ConversionStatus::Converted,
        outputs,
        report.record_count,
    ))
}
