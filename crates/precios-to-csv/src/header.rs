use crate::family::ReportFamily;
use crate::grid::PageGrid;
use crate::model::RawTable;

/// Survey tables stack exactly this many header rows.
pub(crate) const HEADER_ROWS: usize = 3;

fn normalize_cell(cell: Option<&String>, family: ReportFamily) -> Option<String> {
    match cell {
        Some(text) if family.strips_newlines() => Some(text.replace(['\n', '\r'], "")),
        Some(text) => Some(text.clone()),
        None => family.missing_cell().map(str::to_string),
    }
}

/// Joins a column's stacked header cells into one name.
fn composite_name(parts: &[Option<String>]) -> String {
    parts
        .iter()
        .map(|part| part.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
        .replace("\r\n", "|")
        .replace('\n', "|")
}

/// Applies the composite header to a merged page table. Returns `None` when
/// the table does not even hold the header rows.
pub(crate) fn build_page_grid(table: &RawTable, family: ReportFamily) -> Option<PageGrid> {
    if table.rows.len() < HEADER_ROWS {
        return None;
    }

    let width = table.width();
    let normalized = table
        .rows
        .iter()
        .map(|row| {
            (0..width)
                .map(|index| normalize_cell(row.get(index).and_then(Option::as_ref), family))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let (header, data) = normalized.split_at(HEADER_ROWS);
    let stacked = (0..width)
        .map(|index| {
            header
                .iter()
                .map(|row| row[index].clone())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let columns = stacked.iter().map(|parts| composite_name(parts)).collect();
    let headers = stacked
        .into_iter()
        .map(|parts| parts.into_iter().map(Option::unwrap_or_default).collect())
        .collect();

    Some(PageGrid {
        columns,
        headers,
        rows: data.to_vec(),
    })
}
