use std::collections::BTreeSet;

/// A page table with composite column names applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageGrid {
    pub columns: Vec<String>,
    /// Stacked header cells per column, top row first. Empty when the grid
    /// was not built from header rows.
    pub headers: Vec<Vec<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl PageGrid {
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Copy of the grid without the given columns.
    #[must_use]
    pub fn drop_columns(&self, dropped: &BTreeSet<usize>) -> Self {
        let keep = |index: &usize| !dropped.contains(index);
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(index, _)| keep(index))
            .map(|(_, name)| name.clone())
            .collect();
        let headers = self
            .headers
            .iter()
            .enumerate()
            .filter(|(index, _)| keep(index))
            .map(|(_, parts)| parts.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(index, _)| keep(index))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();
        Self {
            columns,
            headers,
            rows,
        }
    }

    /// Header cells of `column`, empty when unknown.
    #[must_use]
    pub fn header_parts(&self, column: usize) -> &[String] {
        self.headers.get(column).map_or(&[], Vec::as_slice)
    }

    /// Cell text, or `None` when the row is too short or the cell is missing.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::PageGrid;

    fn grid() -> PageGrid {
        PageGrid {
            columns: vec!["Producto".into(), "Nacional".into(), "Media".into()],
            headers: vec![
                vec!["Producto".into()],
                vec!["Nacional".into()],
                vec!["Media".into()],
            ],
            rows: vec![
                vec![Some("Arroz".into()), Some("45".into()), Some("44".into())],
                vec![Some("Leche".into())],
            ],
        }
    }

    #[test]
    fn drops_columns_by_index() {
        let grid = grid();
        let dropped = grid.drop_columns(&BTreeSet::from([2]));
        assert_eq!(dropped.columns, vec!["Producto", "Nacional"]);
        assert_eq!(dropped.header_parts(1), ["Nacional"]);
        assert!(dropped.header_parts(2).is_empty());
        assert_eq!(
            dropped.rows[0],
            vec![Some("Arroz".to_string()), Some("45".to_string())]
        );
        assert_eq!(dropped.rows[1], vec![Some("Leche".to_string())]);
    }

    #[test]
    fn bounds_checked_cell_access() {
        let grid = grid();
        assert_eq!(grid.cell(0, 1), Some("45"));
        assert_eq!(grid.cell(1, 2), None);
        assert_eq!(grid.cell(9, 0), None);
    }
}
