use std::collections::BTreeSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::classify::ChannelView;
use crate::date_range::DateRange;
use crate::family::{MISSING_CELL, ReportFamily};
use crate::grid::PageGrid;
use crate::price::parse_price;

/// Values shared by every record of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    /// Source file name without directories or extension.
    pub file_id: String,
    pub range: DateRange,
    pub currency: String,
}

/// One (product, vendor, price) observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub id: Uuid,
    pub file_id: String,
    /// Values for the family's identity fields, in field order.
    pub identity: Vec<Option<String>>,
    pub vendor: String,
    pub price: Decimal,
    pub currency: String,
    pub range: DateRange,
}

impl PriceRecord {
    /// CSV cells in the family's header order.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![self.id.to_string(), self.file_id.clone()];
        row.extend(
            self.identity
                .iter()
                .map(|value| value.clone().unwrap_or_default()),
        );
        row.extend([
            self.vendor.clone(),
            self.price.to_string(),
            self.currency.clone(),
            self.range.start.format("%Y-%m-%d").to_string(),
            self.range.end.format("%Y-%m-%d").to_string(),
        ]);
        row
    }
}

/// Vendor name from a composite column header: empty header parts and the
/// missing-cell placeholder are dropped, whitespace is collapsed.
#[must_use]
pub fn clean_vendor_label(column: &str) -> String {
    column
        .split_whitespace()
        .filter(|part| *part != MISSING_CELL)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Vendor names for the given columns of `grid`.
///
/// Header rows are read top-down until the row where every column differs;
/// rows below it (price kind, sample notes) are not part of the name. With a
/// single column, or when no row tells the columns apart, all header rows
/// are used.
#[must_use]
pub fn vendor_labels(grid: &PageGrid, columns: &[usize]) -> Vec<String> {
    let stacked = columns
        .iter()
        .map(|&column| grid.header_parts(column))
        .collect::<Vec<_>>();
    let height = stacked.iter().map(|parts| parts.len()).max().unwrap_or(0);

    let distinct_at = |row: usize| {
        let values = stacked
            .iter()
            .map(|parts| clean_vendor_label(parts.get(row).map_or("", String::as_str)))
            .collect::<BTreeSet<_>>();
        values.len() == stacked.len()
    };
    let depth = if stacked.len() > 1 {
        (0..height).find(|&row| distinct_at(row)).map_or(height, |row| row + 1)
    } else {
        height
    };

    columns
        .iter()
        .zip(&stacked)
        .map(|(&column, parts)| {
            let label = clean_vendor_label(&parts[..depth.min(parts.len())].join(" "));
            if label.is_empty() {
                clean_vendor_label(&grid.columns[column])
            } else {
                label
            }
        })
        .collect()
}

fn identity_value(cell: Option<&str>) -> Option<String> {
    let text = cell?.trim();
    if text.is_empty() || text == MISSING_CELL {
        return None;
    }
    Some(text.to_string())
}

/// Pivots every data row of `view` into one record per vendor cell holding
/// a price. Rows with no identity value at all are skipped.
#[must_use]
pub fn reshape(view: &ChannelView, family: ReportFamily, ctx: &RecordContext) -> Vec<PriceRecord> {
    let field_count = family.identity_fields().len();
    let identity_columns = view.identity_columns();
    let vendor_columns = view.vendor_columns();
    let vendors = vendor_columns
        .iter()
        .copied()
        .zip(vendor_labels(&view.grid, &vendor_columns))
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for row in 0..view.grid.rows.len() {
        let mut identity = identity_columns
            .iter()
            .take(field_count)
            .map(|&column| identity_value(view.grid.cell(row, column)))
            .collect::<Vec<_>>();
        if identity.iter().all(Option::is_none) {
            continue;
        }
        identity.resize(field_count, None);

        for (column, vendor) in &vendors {
            let Some(price) = view.grid.cell(row, *column).and_then(parse_price) else {
                continue;
            };
            records.push(PriceRecord {
                id: Uuid::new_v4(),
                file_id: ctx.file_id.clone(),
                identity: identity.clone(),
                vendor: vendor.clone(),
                price,
                currency: ctx.currency.clone(),
                range: ctx.range,
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::{RecordContext, clean_vendor_label, reshape, vendor_labels};
    use crate::classify::split_page;
    use crate::date_range::DateRange;
    use crate::family::ReportFamily;
    use crate::grid::PageGrid;

    fn context() -> RecordContext {
        RecordContext {
            file_id: "precios-05-al-11-de-marzo-2018".to_string(),
            range: DateRange {
                start: NaiveDate::from_ymd_opt(2018, 3, 5).expect("valid date"),
                end: NaiveDate::from_ymd_opt(2018, 3, 11).expect("valid date"),
            },
            currency: "DOP".to_string(),
        }
    }

    fn grid(columns: &[&str], rows: &[&[&str]]) -> PageGrid {
        PageGrid {
            columns: columns.iter().map(|name| (*name).to_string()).collect(),
            headers: Vec::new(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| Some((*cell).to_string())).collect())
                .collect(),
        }
    }

    #[test]
    fn cleans_vendor_labels() {
        assert_eq!(clean_vendor_label("SuperNacional -- "), "SuperNacional");
        assert_eq!(clean_vendor_label(" A  Precio X"), "A Precio X");
    }

    fn stacked(headers: &[[&str; 3]]) -> PageGrid {
        PageGrid {
            columns: headers.iter().map(|parts| parts.join(" ")).collect(),
            headers: headers
                .iter()
                .map(|parts| parts.iter().map(|part| (*part).to_string()).collect())
                .collect(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn vendor_labels_stop_at_the_first_distinguishing_header_row() {
        let retail = stacked(&[["A", "Precio", "X"], ["B", "Precio", "Y"]]);
        assert_eq!(vendor_labels(&retail, &[0, 1]), ["A", "B"]);

        let pharmacy = stacked(&[
            ["Farmacia", "Carol", ""],
            ["Farmacia", "Los Hidalgos", ""],
            ["Farmacia\nGBC", "--", "Precio"],
        ]);
        assert_eq!(
            vendor_labels(&pharmacy, &[0, 1, 2]),
            ["Farmacia Carol", "Farmacia Los Hidalgos", "Farmacia GBC"]
        );
    }

    #[test]
    fn single_vendor_keeps_every_header_row() {
        let grid = stacked(&[["Bravo", "Precio", "Libra"]]);
        assert_eq!(vendor_labels(&grid, &[0]), ["Bravo Precio Libra"]);

        let identical = stacked(&[["Bravo", "", ""], ["Bravo", "", ""]]);
        assert_eq!(vendor_labels(&identical, &[0, 1]), ["Bravo", "Bravo"]);
    }

    #[test]
    fn pivots_rows_against_vendor_columns() {
        let page = grid(
            &["Producto  ", "Unidad  ", "Bravo  ", "Jumbo  "],
            &[&["Arroz", "Libra", "$25.00", "24,50"], &["Leche", "Litro", "--", "$60"]],
        );
        let ctx = context();
        let views = split_page(ReportFamily::Retail, &page);
        let records = reshape(&views[0], ReportFamily::Retail, &ctx);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].identity, vec![Some("Arroz".to_string()), Some("Libra".to_string())]);
        assert_eq!(records[0].vendor, "Bravo");
        assert_eq!(records[0].price, dec!(25.00));
        assert_eq!(records[1].price, dec!(24.50));
        assert_eq!(records[2].vendor, "Jumbo");
        assert_eq!(records[2].price, dec!(60));
        assert!(records.iter().all(|record| record.file_id == ctx.file_id));
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn skips_rows_without_identity_and_cells_without_price() {
        let page = grid(
            &["Producto  ", "Unidad  ", "Bravo  "],
            &[&["--", "", "$25.00"], &["Azucar", "--", "n/d"], &["Sal", "--", "$0.00"]],
        );
        let views = split_page(ReportFamily::Retail, &page);
        let records = reshape(&views[0], ReportFamily::Retail, &context());
        assert!(records.is_empty());
    }

    #[test]
    fn pads_missing_identity_fields() {
        let page = grid(
            &["Principio Activo  ", "Concentración  ", "Farmacia Carol "],
            &[&["Ibuprofeno", "400mg", "RD$ 120.00"]],
        );
        let views = split_page(ReportFamily::Pharmacy, &page);
        let records = reshape(&views[0], ReportFamily::Pharmacy, &context());

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].identity,
            vec![Some("Ibuprofeno".to_string()), Some("400mg".to_string()), None, None]
        );
        let row = records[0].to_row();
        assert_eq!(row.len(), ReportFamily::Pharmacy.record_headers().len());
        assert_eq!(&row[6..], ["Farmacia Carol", "120.00", "DOP", "2018-03-05", "2018-03-11"]);
    }
}
