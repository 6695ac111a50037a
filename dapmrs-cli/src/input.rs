/// CSV input: one row per applicant/reviewer pair, one column per field.
///
/// A leading column with an empty header (a saved dataframe index) is ignored.
use dapmrs_core::DataTable;
use std::io::Read;
use std::path::Path;

use crate::bail;

/// Parse a CSV stream into a float table.
pub fn parse_table<R: Read>(reader: R) -> Result<DataTable, String> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| format!("Failed to read CSV header: {e}"))?.clone();

    let skip_index = headers.get(0).is_some_and(str::is_empty);
    let names: Vec<String> = headers.iter().skip(usize::from(skip_index)).map(String::from).collect();
    if names.is_empty() {
        return Err("CSV has no columns".to_string());
    }

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("Failed to read CSV row {}: {e}", row + 1))?;
        for (col, cell) in record.iter().skip(usize::from(skip_index)).enumerate() {
            let value: f64 = cell
                .parse()
                .map_err(|_| format!("Row {}, column \"{}\": \"{cell}\" is not a number", row + 1, names[col]))?;
            values[col].push(value);
        }
    }

    DataTable::from_columns(names.into_iter().zip(values).collect()).map_err(|e| e.to_string())
}

/// Read a CSV file into a table.
pub fn read_table(path: &Path) -> DataTable {
    let file = std::fs::File::open(path)
        .unwrap_or_else(|e| bail(format!("Failed to open data file {}: {e}", path.display())));
    parse_table(file).unwrap_or_else(|e| bail(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_table() {
        let csv = "A_char_1,A_char_2\n40,12\n55.5,3\n";
        let table = parse_table(csv.as_bytes()).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.float_column("A_char_1").unwrap(), &[40.0, 55.5]);
        assert_eq!(table.float_column("A_char_2").unwrap(), &[12.0, 3.0]);
    }

    #[test]
    fn test_leading_index_column_ignored() {
        let csv = ",A_char_1,B_char_1\n0,1.0,2.0\n1,3.0,4.0\n";
        let table = parse_table(csv.as_bytes()).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["A_char_1", "B_char_1"]);
        assert_eq!(table.float_column("B_char_1").unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn test_non_numeric_cell_reported() {
        let csv = "A_char_1\n1.0\nabc\n";
        let err = parse_table(csv.as_bytes()).unwrap_err();
        assert!(err.contains("Row 2"));
        assert!(err.contains("A_char_1"));
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let csv = "A_char_1,A_char_1\n1,2\n";
        assert!(parse_table(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let csv = "A_char_1,A_char_2\n1,2\n3\n";
        assert!(parse_table(csv.as_bytes()).is_err());
    }
}
