mod classify;
mod csv_out;
mod date_range;
mod error;
mod family;
mod grid;
mod header;
mod merge;
mod model;
mod options;
mod pdf_reader;
mod price;
mod report;
mod reshape;
mod table_detect;
mod warning;

use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, info, warn};

use crate::csv_out::{stage_csv, write_csv_to_string};
use crate::header::{HEADER_ROWS, build_page_grid};
use crate::merge::concat_columns;
use crate::pdf_reader::{load_document, load_document_from_bytes, read_page_layout};
use crate::report::{Report, ReportAggregator};
use crate::table_detect::detect_tables;

pub use classify::{ChannelView, ColumnRole, IdentityKind, classify_columns, split_page};
pub use date_range::{DateRange, date_range_from_text, month_number};
pub use error::ConvertError;
pub use family::{Channel, MISSING_CELL, ReportFamily};
pub use grid::PageGrid;
pub use model::CsvTable;
pub use options::{ConvertOptions, DEFAULT_CURRENCY, PageSelection};
pub use price::parse_price;
pub use reshape::{PriceRecord, RecordContext, clean_vendor_label, reshape, vendor_labels};
pub use warning::{ConvertWarning, WarningCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    /// Outputs were already present and nothing was reprocessed.
    Existing,
    Converted,
}

impl ConversionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Converted => "converted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub status: ConversionStatus,
    pub family: ReportFamily,
    /// Written (or already present) outputs in channel order.
    pub outputs: Vec<PathBuf>,
    pub file_id: Option<String>,
    pub range: Option<DateRange>,
    pub page_count: usize,
    pub record_count: usize,
    pub warnings: Vec<ConvertWarning>,
}

impl ConversionReport {
    fn existing(family: ReportFamily, outputs: Vec<PathBuf>) -> Self {
        Self {
            status: ConversionStatus::Existing,
            family,
            outputs,
            file_id: None,
            range: None,
            page_count: 0,
            record_count: 0,
            warnings: Vec::new(),
        }
    }
}

/// One serialized output report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCsv {
    pub channel: Channel,
    pub file_name: String,
    pub record_count: usize,
    pub csv: String,
}

struct Extraction {
    reports: Vec<Report>,
    context: RecordContext,
    page_count: usize,
    warnings: Vec<ConvertWarning>,
}

impl Extraction {
    fn record_count(&self) -> usize {
        self.reports.iter().map(|report| report.records.len()).sum()
    }

    fn into_report(self, family: ReportFamily, outputs: Vec<PathBuf>) -> ConversionReport {
        let record_count = self.record_count();
        ConversionReport {
            status: ConversionStatus::Converted,
            family,
            outputs,
            range: Some(self.context.range),
            file_id: Some(self.context.file_id),
            page_count: self.page_count,
            record_count,
            warnings: self.warnings,
        }
    }
}

/// Splits a file name or storage key into the part before its extension.
fn strip_extension(name: &str) -> &str {
    let file_start = name.rfind(['/', '\\']).map_or(0, |index| index + 1);
    match name[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &name[..file_start + dot],
        _ => name,
    }
}

/// File name of `name` without directories.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Storage key of the CSV written for `channel` next to the source `key`.
#[must_use]
pub fn output_key(key: &str, channel: Channel) -> String {
    format!("{}{}.csv", strip_extension(key), channel.file_suffix())
}

fn output_path(input_pdf: &Path, channel: Channel) -> PathBuf {
    let stem = input_pdf
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input_pdf.with_file_name(format!("{stem}{}.csv", channel.file_suffix()))
}

/// Every output path `family` may write for `input_pdf`, in channel order.
#[must_use]
pub fn output_paths(input_pdf: &Path, family: ReportFamily) -> Vec<PathBuf> {
    family
        .channels()
        .iter()
        .map(|channel| output_path(input_pdf, *channel))
        .collect()
}

fn extract_reports(
    document: &Document,
    source_name: &str,
    family: ReportFamily,
    options: &ConvertOptions,
) -> Result<Extraction, ConvertError> {
    let context = RecordContext {
        file_id: strip_extension(base_name(source_name)).to_string(),
        range: date_range_from_text(source_name)?,
        currency: options.currency.clone(),
    };

    let pages = document
        .get_pages()
        .into_iter()
        .filter(|(page_number, _)| {
            options
                .pages
                .as_ref()
                .is_none_or(|selection| selection.contains(*page_number))
        })
        .collect::<Vec<_>>();
    if pages.is_empty() {
        return Err(ConvertError::NoPagesSelected);
    }

    let total = document.get_pages().len();
    let mut aggregator = ReportAggregator::new(family);
    let mut warnings = Vec::new();

    for (page_number, page_id) in &pages {
        info!("parsing page {page_number} of {total}");

        let layout = match read_page_layout(document, *page_number, *page_id) {
            Ok(layout) => layout,
            Err(error) => {
                warn!(page = page_number, %error, "skipping page with unreadable content");
                warnings.push(
                    ConvertWarning::new(
                        WarningCode::UnreadablePageContent,
                        format!("page content could not be decoded: {error}"),
                    )
                    .with_page(*page_number),
                );
                continue;
            }
        };

        let tables = detect_tables(&layout, options.snap_tolerance);
        if tables.is_empty() {
            debug!(page = page_number, "no ruled tables on page");
            warnings.push(
                ConvertWarning::new(WarningCode::NoTablesDetected, "no ruled tables found")
                    .with_page(*page_number),
            );
            continue;
        }

        let merged = concat_columns(&tables);
        let Some(grid) = build_page_grid(&merged, family) else {
            debug!(page = page_number, rows = merged.rows.len(), "table too short");
            warnings.push(
                ConvertWarning::new(
                    WarningCode::TooFewRows,
                    format!("table has fewer than {HEADER_ROWS} rows"),
                )
                .with_page(*page_number),
            );
            continue;
        };
        if grid.rows.is_empty() {
            debug!(page = page_number, "table holds only header rows");
            warnings.push(
                ConvertWarning::new(WarningCode::HeaderOnlyPage, "table holds only header rows")
                    .with_page(*page_number),
            );
            continue;
        }

        for view in split_page(family, &grid) {
            let records = reshape(&view, family, &context);
            debug!(
                page = page_number,
                channel = %view.channel,
                records = records.len(),
                "page reshaped"
            );
            aggregator.add_page(view.channel, records);
        }
    }

    Ok(Extraction {
        reports: aggregator.finalize(),
        context,
        page_count: pages.len(),
        warnings,
    })
}

/// Converts a survey PDF on disk into CSV files written next to it.
///
/// When any output of the family already exists the document is not read
/// again and the existing paths are reported, unless `options.force` is set.
/// Outputs become visible only once every page has been processed.
///
/// # Errors
///
/// Returns an error when the options are invalid, the file name carries an
/// impossible date, the PDF cannot be loaded or an output cannot be written.
pub fn convert_pdf_file(
    input_pdf: &Path,
    family: ReportFamily,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    options.validate()?;

    if !options.force {
        let existing = output_paths(input_pdf, family)
            .into_iter()
            .filter(|path| path.exists())
            .collect::<Vec<_>>();
        if !existing.is_empty() {
            info!(input = %input_pdf.display(), "outputs already exist, skipping");
            return Ok(ConversionReport::existing(family, existing));
        }
    }

    let source_name = input_pdf
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let document = load_document(input_pdf)?;
    let extraction = extract_reports(&document, &source_name, family, options)?;
    drop(document);

    let staged = extraction
        .reports
        .iter()
        .map(|report| {
            stage_csv(
                &output_path(input_pdf, report.channel),
                &report.to_table(family),
                options.delimiter,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    let outputs = staged
        .into_iter()
        .map(csv_out::StagedCsv::persist)
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        input = %input_pdf.display(),
        outputs = outputs.len(),
        records = extraction.record_count(),
        "conversion finished"
    );
    Ok(extraction.into_report(family, outputs))
}

/// Converts an in-memory survey PDF. `file_name` supplies the period and
/// the output names; nothing touches the filesystem.
///
/// # Errors
///
/// Same conditions as [`convert_pdf_file`], minus file output.
pub fn convert_pdf_bytes(
    input_pdf: &[u8],
    file_name: &str,
    family: ReportFamily,
    options: &ConvertOptions,
) -> Result<(Vec<ChannelCsv>, ConversionReport), ConvertError> {
    options.validate()?;

    let document = load_document_from_bytes(input_pdf)?;
    let extraction = extract_reports(&document, file_name, family, options)?;
    drop(document);

    let outputs = extraction
        .reports
        .iter()
        .map(|report| {
            Ok(ChannelCsv {
                channel: report.channel,
                file_name: output_key(base_name(file_name), report.channel),
                record_count: report.records.len(),
                csv: write_csv_to_string(&report.to_table(family), options.delimiter)?,
            })
        })
        .collect::<Result<Vec<_>, ConvertError>>()?;

    let names = outputs
        .iter()
        .map(|output| PathBuf::from(&output.file_name))
        .collect();
    Ok((outputs, extraction.into_report(family, names)))
}

/// Converts a retail survey (family A) and returns the CSV path.
///
/// # Errors
///
/// See [`convert_pdf_file`].
pub fn pdf_to_csv_a(input_pdf: &Path) -> Result<PathBuf, ConvertError> {
    convert_pdf_file(input_pdf, ReportFamily::Retail, &ConvertOptions::default())?;
    Ok(output_path(input_pdf, Channel::Single))
}

/// Converts a pharmacy survey (family B) and returns the CSV paths written.
///
/// # Errors
///
/// See [`convert_pdf_file`].
pub fn pdf_to_csv_b(input_pdf: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let report = convert_pdf_file(input_pdf, ReportFamily::Pharmacy, &ConvertOptions::default())?;
    Ok(report.outputs)
}
