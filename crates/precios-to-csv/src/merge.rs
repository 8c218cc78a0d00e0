use crate::model::RawTable;

/// Concatenates tables side by side, aligning rows by index. Tables shorter
/// than the tallest one are padded with missing cells.
pub(crate) fn concat_columns(tables: &[RawTable]) -> RawTable {
    let height = tables.iter().map(|table| table.rows.len()).max().unwrap_or(0);
    let widths = tables.iter().map(RawTable::width).collect::<Vec<_>>();

    let rows = (0..height)
        .map(|row_index| {
            let mut row = Vec::with_capacity(widths.iter().sum());
            for (table, width) in tables.iter().zip(&widths) {
                let mut cells = table.rows.get(row_index).cloned().unwrap_or_default();
                cells.resize(*width, None);
                row.extend(cells);
            }
            row
        })
        .collect();

    RawTable { rows }
}

#[cfg(test)]
mod tests {
    use crate::merge::concat_columns;
    use crate::model::RawTable;

    fn cell(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn concatenates_and_pads_shorter_tables() {
        let left = RawTable {
            rows: vec![vec![cell("a"), cell("b")], vec![cell("c")], vec![cell("d"), None]],
        };
        let right = RawTable {
            rows: vec![vec![cell("x")], vec![cell("y")]],
        };

        let merged = concat_columns(&[left, right]);
        assert_eq!(merged.rows.len(), 3);
        assert_eq!(merged.rows[0], vec![cell("a"), cell("b"), cell("x")]);
        assert_eq!(merged.rows[1], vec![cell("c"), None, cell("y")]);
        assert_eq!(merged.rows[2], vec![cell("d"), None, None]);
    }
}
