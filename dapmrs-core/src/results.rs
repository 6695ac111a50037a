/// Result compiler: derives payoff columns from a finished match.
///
/// Reads the final state only; nothing here mutates agent records and nothing
/// is random, so compiling the same outcome twice yields the same table.
use tracing::warn;

use crate::constants::MIN_STD_DEV;
use crate::error::Result;
use crate::table::DataTable;
use crate::types::{Applicant, MatchOutcome, Reviewer};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompileOptions {
    /// Prepended to every derived column as `<prefix>_<name>`. Empty = no prefix.
    pub prefix: String,
    /// Append allocation columns: original index, counterpart id, counterpart characteristics.
    pub allocation: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            prefix: "dap".to_string(),
            allocation: false,
        }
    }
}

impl CompileOptions {
    pub fn column_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.prefix, name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledResults {
    /// Input columns followed by the derived columns.
    pub table: DataTable,
    /// z-score columns that had (near) zero variance and were zero-filled.
    pub degenerate_columns: Vec<String>,
    pub options: CompileOptions,
}

impl CompiledResults {
    /// Derived float column by its unprefixed name, e.g. `"diff_A_z"`.
    pub fn derived(&self, name: &str) -> Option<&[f64]> {
        self.table.float_column(&self.options.column_name(name))
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// `(x - mean) / sd` for every value. `None` when the column has no usable spread.
pub fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let sd = sample_std_dev(values)?;
    if !sd.is_finite() || sd < MIN_STD_DEV {
        return None;
    }
    let m = mean(values);
    Some(values.iter().map(|v| (v - m) / sd).collect())
}

/// Best utility an applicant could get from any reviewer, ignoring competition.
fn applicant_observed(applicant: &Applicant, reviewers: &[Reviewer]) -> f64 {
    reviewers
        .iter()
        .map(|r| applicant.utility_from(r))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Best unbiased utility a reviewer could get from any applicant.
fn reviewer_observed(reviewer: &Reviewer, applicants: &[Applicant]) -> f64 {
    applicants
        .iter()
        .map(|a| reviewer.unbiased_utility_from(a))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Compile the output table for `outcome`, appending derived columns to a copy of `input`.
pub fn compile_results(input: &DataTable, outcome: &MatchOutcome, options: &CompileOptions) -> Result<CompiledResults> {
    let applicants = outcome.applicants();
    let reviewers = outcome.reviewers();

    let a_obs: Vec<f64> = applicants.iter().map(|a| applicant_observed(a, reviewers)).collect();
    let b_obs: Vec<f64> = reviewers.iter().map(|r| reviewer_observed(r, applicants)).collect();
    let a_dap: Vec<f64> = applicants.iter().map(|a| a.match_utility).collect();
    let b_dap: Vec<f64> = reviewers
        .iter()
        .map(|r| r.matched.map_or(0.0, |i| r.unbiased_utility_from(&applicants[i])))
        .collect();
    let diff_a: Vec<f64> = a_obs.iter().zip(&a_dap).map(|(o, d)| o - d).collect();
    let diff_b: Vec<f64> = b_obs.iter().zip(&b_dap).map(|(o, d)| o - d).collect();

    let mut table = input.clone();
    let mut degenerate_columns = Vec::new();

    let mut base: Vec<(&str, Vec<f64>)> = vec![
        ("A_obs_u", a_obs),
        ("A_dap_u", a_dap),
        ("diff_A", diff_a),
        ("B_obs_u", b_obs),
        ("B_dap_u", b_dap),
        ("diff_B", diff_b),
    ];

    if outcome.populations.bias {
        // The matched reviewer's view of the applicant, with and without the bias term.
        let (apparent, corrected): (Vec<f64>, Vec<f64>) = applicants
            .iter()
            .map(|a| match a.matched {
                Some(r) => {
                    let reviewer = &reviewers[r];
                    let apparent = reviewer.utility_from(a);
                    (apparent, apparent - reviewer.bias_term(a))
                }
                None => (0.0, 0.0),
            })
            .unzip();
        base.push(("A_apparent_v", apparent));
        base.push(("A_apparent_corrected_v", corrected));
    }

    for (name, values) in &base {
        table.push_float(options.column_name(name), values.clone())?;
    }

    for (name, values) in &base {
        let z_name = options.column_name(&format!("{name}_z"));
        let z = match z_scores(values) {
            Some(z) => z,
            None => {
                warn!(column = %z_name, "zero variance, z-scores set to 0");
                degenerate_columns.push(z_name.clone());
                vec![0.0; values.len()]
            }
        };
        table.push_float(z_name, z)?;
    }

    if options.allocation {
        push_allocation(&mut table, outcome, options)?;
    }

    Ok(CompiledResults {
        table,
        degenerate_columns,
        options: options.clone(),
    })
}

/// Index, counterpart id and counterpart characteristics for each row.
/// Rows without a counterpart get NaN characteristics, exported as empty cells.
fn push_allocation(table: &mut DataTable, outcome: &MatchOutcome, options: &CompileOptions) -> Result<()> {
    let applicants = outcome.applicants();
    let reviewers = outcome.reviewers();

    table.push_ids(options.column_name("initial_index"), (0..applicants.len()).map(Some).collect())?;

    table.push_ids(options.column_name("A_match"), applicants.iter().map(|a| a.matched).collect())?;
    for k in 0..outcome.populations.reviewer_features {
        let chars = applicants
            .iter()
            .map(|a| a.matched.map_or(f64::NAN, |r| reviewers[r].characteristics[k]))
            .collect();
        table.push_float(options.column_name(&format!("A_match_char_{}", k + 1)), chars)?;
    }

    table.push_ids(options.column_name("B_match"), reviewers.iter().map(|r| r.matched).collect())?;
    for k in 0..outcome.populations.applicant_features {
        let chars = reviewers
            .iter()
            .map(|r| r.matched.map_or(f64::NAN, |i| applicants[i].characteristics[k]))
            .collect();
        table.push_float(options.column_name(&format!("B_match_char_{}", k + 1)), chars)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_matching;
    use crate::error::MarketError;
    use crate::records::{build_populations, MarketConfig};

    fn three_by_three() -> DataTable {
        DataTable::from_columns(vec![
            ("A_char_1", vec![40.0, 55.0, 62.0]),
            ("A_char_2", vec![12.0, 3.0, 8.0]),
            ("A_mrs_12", vec![1.5, 1.5, 1.5]),
            ("B_char_1", vec![50.0, 45.0, 70.0]),
            ("B_char_2", vec![5.0, 20.0, 1.0]),
            ("B_mrs_12", vec![0.5, 0.5, 0.5]),
        ])
        .unwrap()
    }

    fn compiled(table: &DataTable, config: &MarketConfig, options: &CompileOptions) -> (MatchOutcome, CompiledResults) {
        let outcome = run_matching(build_populations(table, config).unwrap());
        let results = compile_results(table, &outcome, options).unwrap();
        (outcome, results)
    }

    #[test]
    fn test_z_scores_sample_std() {
        let z = z_scores(&[1.0, 2.0, 3.0]).unwrap();
        assert!((z[0] + 1.0).abs() < 1e-12);
        assert!(z[1].abs() < 1e-12);
        assert!((z[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_scores_degenerate() {
        assert!(z_scores(&[4.0, 4.0, 4.0]).is_none());
        assert!(z_scores(&[4.0]).is_none());
        assert!(z_scores(&[]).is_none());
    }

    #[test]
    fn test_observed_dap_and_diff_columns() {
        let table = three_by_three();
        let (outcome, results) = compiled(&table, &MarketConfig::default(), &CompileOptions::default());
        assert!(outcome.converged);

        let a_obs = results.derived("A_obs_u").unwrap();
        let a_dap = results.derived("A_dap_u").unwrap();
        let diff_a = results.derived("diff_A").unwrap();
        // Best reviewer for everyone: utilities 57.5, 75, 71.5.
        assert!(a_obs.iter().all(|&u| u == 75.0));
        for i in 0..3 {
            assert_eq!(diff_a[i], a_obs[i] - a_dap[i]);
            assert!(diff_a[i] >= 0.0);
            assert_eq!(a_dap[i], outcome.applicants()[i].match_utility);
        }

        let b_dap = results.derived("B_dap_u").unwrap();
        for (j, r) in outcome.reviewers().iter().enumerate() {
            assert_eq!(b_dap[j], r.match_utility);
        }
        assert!(results.table.has_column("dap_diff_B_z"));
        assert_eq!(results.table.float_column("A_char_1"), table.float_column("A_char_1"));
    }

    #[test]
    fn test_constant_column_is_flagged_not_nan() {
        let table = three_by_three();
        let (_, results) = compiled(&table, &MarketConfig::default(), &CompileOptions::default());

        // Shared weights on each side give every agent the same best counterpart,
        // so both observed columns are constant.
        assert_eq!(
            results.degenerate_columns,
            vec!["dap_A_obs_u_z".to_string(), "dap_B_obs_u_z".to_string()]
        );
        assert!(results.derived("A_obs_u_z").unwrap().iter().all(|&z| z == 0.0));
        for column in results.table.columns() {
            if let crate::table::ColumnValues::Float(values) = &column.values {
                assert!(values.iter().all(|v| v.is_finite()), "{} has non-finite values", column.name);
            }
        }
    }

    #[test]
    fn test_compile_is_idempotent() {
        let table = three_by_three();
        let options = CompileOptions { prefix: "run".to_string(), allocation: true };
        let (outcome, first) = compiled(&table, &MarketConfig::default(), &options);
        let second = compile_results(&table, &outcome, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_allocation_columns_align_by_match() {
        let table = three_by_three();
        let options = CompileOptions { prefix: String::new(), allocation: true };
        let (outcome, results) = compiled(&table, &MarketConfig::default(), &options);

        let matches = results.table.id_column("A_match").unwrap();
        let char_1 = results.table.float_column("A_match_char_1").unwrap();
        for (i, a) in outcome.applicants().iter().enumerate() {
            let r = matches[i].unwrap();
            assert_eq!(Some(r), a.matched);
            assert_eq!(char_1[i], outcome.reviewers()[r].characteristics[0]);
        }
        assert_eq!(results.table.id_column("initial_index").unwrap()[2], Some(2));
        assert!(results.table.has_column("B_match_char_2"));
        assert!(!results.table.has_column("B_match_char_3"));
    }

    #[test]
    fn test_bias_apparent_values() {
        let mut table = three_by_three();
        table.push_float("A_bias_char", vec![1.0, 0.0, 1.0]).unwrap();
        table.push_float("B_bias_mrs", vec![-25.0, -25.0, -25.0]).unwrap();
        let config = MarketConfig { bias: true, ..MarketConfig::default() };
        let (outcome, results) = compiled(&table, &config, &CompileOptions::default());

        let apparent = results.derived("A_apparent_v").unwrap();
        let corrected = results.derived("A_apparent_corrected_v").unwrap();
        let b_dap = results.derived("B_dap_u").unwrap();
        let a_dap = results.derived("A_dap_u").unwrap();

        for (i, a) in outcome.applicants().iter().enumerate() {
            let r = a.matched.unwrap();
            let reviewer = &outcome.reviewers()[r];
            // Apparent value is what the reviewer acted on.
            assert_eq!(apparent[i], reviewer.match_utility);
            assert_eq!(corrected[i], apparent[i] - a.bias_characteristic * reviewer.bias_mrs);
            assert_eq!(corrected[i], reviewer.unbiased_utility_from(a));
            // Reviewer dap utility is the unbiased value.
            assert_eq!(b_dap[r], corrected[i]);
            // The applicant's own payoff never includes the bias term.
            assert_eq!(a_dap[i], a.utility_from(reviewer));
        }
        assert!(results.derived("A_apparent_corrected_v_z").is_some());
    }

    #[test]
    fn test_prefix_collision_is_an_error() {
        let mut table = three_by_three();
        table.push_float("dap_A_obs_u", vec![0.0; 3]).unwrap();
        let outcome = run_matching(build_populations(&table, &MarketConfig::default()).unwrap());
        let err = compile_results(&table, &outcome, &CompileOptions::default()).unwrap_err();
        assert_eq!(err, MarketError::DuplicateColumn("dap_A_obs_u".to_string()));
    }
}
