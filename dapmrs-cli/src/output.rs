/// Output: CSV files for the data and log tables, terminal summary, JSON.
use dapmrs_core::{DataTable, IterationLog, MarketReport, PayoffSummary, SideSummary};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Serialize)]
struct JsonOutput<'a> {
    market_size: usize,
    iterations: usize,
    converged: bool,
    degenerate_columns: &'a [String],
    summary: PayoffSummary,
    final_state: Option<&'a IterationLog>,
}

/// Write a table as CSV: header row, then one line per row. Missing cells are empty.
pub fn write_table<W: Write>(writer: W, table: &DataTable) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the iteration log as CSV, one row per iteration.
pub fn write_log<W: Write>(writer: W, log: &[IterationLog]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for entry in log {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Save `<files_name>_data_output.csv` and `<files_name>_log.csv` into `dir`.
pub fn save_report(dir: &Path, files_name: &str, report: &MarketReport) -> (PathBuf, PathBuf) {
    std::fs::create_dir_all(dir)
        .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", dir.display())));

    let data_path = dir.join(format!("{files_name}_data_output.csv"));
    let log_path = dir.join(format!("{files_name}_log.csv"));

    let data_file = std::fs::File::create(&data_path)
        .unwrap_or_else(|e| bail(format!("Failed to create {}: {e}", data_path.display())));
    write_table(data_file, report.data_output())
        .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", data_path.display())));

    let log_file = std::fs::File::create(&log_path)
        .unwrap_or_else(|e| bail(format!("Failed to create {}: {e}", log_path.display())));
    write_log(log_file, report.log())
        .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", log_path.display())));

    (data_path, log_path)
}

fn summary_row(label: &str, width: usize, side: &SideSummary) {
    println!(
        "{:<width$} | {:>9.3} | {:>9.3} | {:>9.3} | {:>9.1}% | {:>9.1}%",
        label,
        side.mean_observed,
        side.mean_dap,
        side.mean_diff,
        side.share_above_one_sd * 100.0,
        side.share_below_minus_one_sd * 100.0,
    );
}

/// Print the payoff summary as a formatted terminal table.
pub fn print_table(report: &MarketReport, applicant_label: &str, reviewer_label: &str) {
    let summary = report.summary();
    let width = applicant_label.len().max(reviewer_label.len()).max(4);

    println!("{:<width$} |  Observed |       DAP |      Diff | Above 1 SD | Below -1 SD", "Side");
    println!("{}-|-----------|-----------|-----------|------------|------------", "-".repeat(width));
    summary_row(applicant_label, width, &summary.applicants);
    summary_row(reviewer_label, width, &summary.reviewers);

    if let Some(effect) = summary.bias_effect {
        println!("\n{applicant_label} by bias characteristic:");
        for (label, group) in [("unmarked", effect.unmarked), ("marked", effect.marked)] {
            println!(
                "  {:<8} n={:<5} observed {:>8.3}  dap {:>8.3}  diff {:>8.3}",
                label, group.count, group.mean_observed, group.mean_dap, group.mean_diff,
            );
        }
    }

    let status = if report.converged() { "converged" } else { "hit the iteration cap" };
    println!(
        "\n{} pairs, {} iterations ({status})",
        report.data_output().n_rows(),
        report.iterations(),
    );
    if !report.degenerate_columns().is_empty() {
        println!("Zero-variance columns (z-scores set to 0): {}", report.degenerate_columns().join(", "));
    }
}

/// Print the run summary as JSON.
pub fn print_json(report: &MarketReport) {
    let output = JsonOutput {
        market_size: report.data_output().n_rows(),
        iterations: report.iterations(),
        converged: report.converged(),
        degenerate_columns: report.degenerate_columns(),
        summary: report.summary(),
        final_state: report.log().last(),
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| bail(format!("Failed to serialize summary: {e}")));
    println!("{json}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapmrs_core::{CompileOptions, SyntheticOptions, example_market};

    #[test]
    fn test_write_table_renders_missing_cells_empty() {
        let mut table = DataTable::from_columns(vec![("x", vec![1.5, f64::NAN])]).unwrap();
        table.push_ids("id", vec![Some(3), None]).unwrap();

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "x,id\n1.5,3\n,\n");
    }

    #[test]
    fn test_write_log_has_header_and_rows() {
        let synthetic = SyntheticOptions { size: 12, ..SyntheticOptions::default() };
        let (_, report) = example_market(&synthetic, &CompileOptions::default()).unwrap();

        let mut buf = Vec::new();
        write_log(&mut buf, report.log()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("iteration,applicants_matched,applicants_unmatched"));
        assert!(header.ends_with("rejections,passed_matched"));
        assert_eq!(lines.count(), report.iterations());
    }

    #[test]
    fn test_data_output_row_count() {
        let synthetic = SyntheticOptions { size: 8, bias: true, ..SyntheticOptions::default() };
        let (input, report) = example_market(&synthetic, &CompileOptions::default()).unwrap();

        let mut buf = Vec::new();
        write_table(&mut buf, report.data_output()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 9);
        let header = text.lines().next().unwrap();
        assert!(header.starts_with(&input.column_names().collect::<Vec<_>>().join(",")));
        assert!(header.contains("dap_A_apparent_corrected_v_z"));
    }
}
