// ============================================================
// RAW GRID
// ============================================================
// Rectangular rows x columns view of a source file, no header semantics

use super::RawCell;

static NULL_CELL: RawCell = RawCell::Null;

/// Untyped grid of cells. Short rows are padded with nulls on construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGrid {
    rows: Vec<Vec<RawCell>>,
    width: usize,
}

impl RawGrid {
    /// Build a grid, padding every row to the widest one
    pub fn from_rows(mut rows: Vec<Vec<RawCell>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in rows.iter_mut() {
            row.resize(width, RawCell::Null);
        }
        Self { rows, width }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[RawCell]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Cell at (row, column); out-of-range positions read as null
    pub fn cell(&self, row: usize, column: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL_CELL)
    }

    pub fn is_row_empty(&self, index: usize) -> bool {
        self.rows
            .get(index)
            .map(|r| r.iter().all(RawCell::is_null))
            .unwrap_or(true)
    }

    /// Non-null cells of `column` from row `from_row` downwards
    pub fn column_values(
        &self,
        column: usize,
        from_row: usize,
    ) -> impl Iterator<Item = &RawCell> + '_ {
        self.rows
            .iter()
            .skip(from_row)
            .filter_map(move |r| r.get(column))
            .filter(|c| !c.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_rows_are_padded() {
        let grid = RawGrid::from_rows(vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec!["1".into()],
        ]);

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.rows()[1].len(), 3);
        assert!(grid.cell(1, 2).is_null());
    }

    #[test]
    fn test_empty_rows_and_column_values() {
        let grid = RawGrid::from_rows(vec![
            vec!["h1".into(), "h2".into()],
            vec![RawCell::Null, RawCell::Null],
            vec!["x".into(), RawCell::Null],
        ]);

        assert!(grid.is_row_empty(1));
        assert!(!grid.is_row_empty(2));
        assert_eq!(grid.column_values(0, 1).count(), 1);
        assert_eq!(grid.column_values(1, 1).count(), 0);
        assert!(grid.cell(10, 10).is_null());
    }

    #[test]
    fn test_empty_grid() {
        assert!(RawGrid::from_rows(Vec::new()).is_empty());
        assert!(RawGrid::from_rows(vec![Vec::new()]).is_empty());
    }
}
