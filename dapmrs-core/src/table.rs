/// Column-oriented table of named values.
///
/// Rows are addressed by position; position doubles as the agent id on both
/// sides of the market. Columns keep insertion order so exported tables list
/// input columns first and derived columns after them.
use crate::error::{MarketError, Result};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnValues {
    Float(Vec<f64>),
    /// Counterpart ids. `None` marks an unmatched agent.
    Id(Vec<Option<usize>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Id(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell rendered for export. Unmatched ids and NaN render as an empty field.
    pub fn cell(&self, row: usize) -> String {
        match self {
            ColumnValues::Float(v) if v[row].is_nan() => String::new(),
            ColumnValues::Float(v) => v[row].to_string(),
            ColumnValues::Id(v) => v[row].map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataTable {
    columns: Vec<Column>,
}

impl DataTable {
    pub fn new() -> Self {
        DataTable::default()
    }

    /// Build a table from `(name, values)` pairs of float columns.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let mut table = DataTable::new();
        for (name, values) in columns {
            table.push_float(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows. An empty table has zero rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Float column by name. Id columns and absent columns yield `None`.
    pub fn float_column(&self, name: &str) -> Option<&[f64]> {
        match self.column(name).map(|c| &c.values) {
            Some(ColumnValues::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn id_column(&self, name: &str) -> Option<&[Option<usize>]> {
        match self.column(name).map(|c| &c.values) {
            Some(ColumnValues::Id(v)) => Some(v),
            _ => None,
        }
    }

    /// Float column by name, or `MissingColumn`.
    pub fn require_float(&self, name: &str) -> Result<&[f64]> {
        self.float_column(name).ok_or_else(|| MarketError::MissingColumn {
            column: name.to_string(),
        })
    }

    pub fn push_float(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        self.push(Column {
            name: name.into(),
            values: ColumnValues::Float(values),
        })
    }

    pub fn push_ids(&mut self, name: impl Into<String>, values: Vec<Option<usize>>) -> Result<()> {
        self.push(Column {
            name: name.into(),
            values: ColumnValues::Id(values),
        })
    }

    fn push(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(MarketError::DuplicateColumn(column.name));
        }
        if !self.columns.is_empty() && column.values.len() != self.n_rows() {
            return Err(MarketError::ColumnLengthMismatch {
                expected: self.n_rows(),
                actual: column.values.len(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Rows rendered as strings, in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        (0..self.n_rows()).map(move |row| self.columns.iter().map(|c| c.values.cell(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_keeps_order() {
        let table = DataTable::from_columns(vec![("b", vec![1.0, 2.0]), ("a", vec![3.0, 4.0])]).unwrap();
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.float_column("a"), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let mut table = DataTable::from_columns(vec![("x", vec![1.0, 2.0])]).unwrap();
        let err = table.push_float("y", vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            MarketError::ColumnLengthMismatch { column: "y".to_string(), expected: 2, actual: 1 }
        );
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut table = DataTable::from_columns(vec![("x", vec![1.0])]).unwrap();
        assert_eq!(
            table.push_float("x", vec![2.0]).unwrap_err(),
            MarketError::DuplicateColumn("x".to_string())
        );
    }

    #[test]
    fn test_require_float_reports_missing_column() {
        let table = DataTable::new();
        assert_eq!(
            table.require_float("A_char_1").unwrap_err(),
            MarketError::MissingColumn { column: "A_char_1".to_string() }
        );
    }

    #[test]
    fn test_rows_render_unmatched_as_empty() {
        let mut table = DataTable::from_columns(vec![("u", vec![1.5, f64::NAN])]).unwrap();
        table.push_ids("match", vec![Some(1), None]).unwrap();
        let rows: Vec<Vec<String>> = table.rows().collect();
        assert_eq!(rows, vec![vec!["1.5".to_string(), "1".to_string()], vec![String::new(), String::new()]]);
        assert!(table.float_column("match").is_none());
        assert_eq!(table.id_column("match"), Some(&[Some(1), None][..]));
    }
}
