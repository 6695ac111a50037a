/// One-call entry point: build records, match, compile.
///
/// Each call owns its populations and log; nothing carries over between calls.
use crate::engine::MatchingEngine;
use crate::error::Result;
use crate::records::{build_populations, MarketConfig};
use crate::results::{compile_results, CompileOptions, CompiledResults};
use crate::summary::{summarize, PayoffSummary};
use crate::synthetic::{example_table, SyntheticOptions};
use crate::table::DataTable;
use crate::types::{IterationLog, MatchOutcome};

#[derive(Debug, Clone)]
pub struct MarketReport {
    pub outcome: MatchOutcome,
    pub results: CompiledResults,
}

impl MarketReport {
    /// Input columns plus derived columns.
    pub fn data_output(&self) -> &DataTable {
        &self.results.table
    }

    pub fn log(&self) -> &[IterationLog] {
        &self.outcome.log
    }

    pub fn iterations(&self) -> usize {
        self.outcome.iterations
    }

    /// False when the iteration cap was hit; inspect `log()` for the unmatched counts.
    pub fn converged(&self) -> bool {
        self.outcome.converged
    }

    pub fn degenerate_columns(&self) -> &[String] {
        &self.results.degenerate_columns
    }

    pub fn summary(&self) -> PayoffSummary {
        summarize(&self.results, &self.outcome)
    }
}

/// Run a full market on `input`.
pub fn run_market(input: &DataTable, config: &MarketConfig, options: &CompileOptions) -> Result<MarketReport> {
    let populations = build_populations(input, config)?;
    let outcome = MatchingEngine::new(populations)
        .with_max_iterations(config.max_iterations)
        .run();
    let results = compile_results(input, &outcome, options)?;
    Ok(MarketReport { outcome, results })
}

/// Run a full market on the seeded example dataset.
pub fn example_market(synthetic: &SyntheticOptions, options: &CompileOptions) -> Result<(DataTable, MarketReport)> {
    let table = example_table(synthetic)?;
    let report = run_market(&table, &synthetic.market_config(), options)?;
    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_ITERATIONS;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Four features per side with every agent carrying its own weights.
    fn heterogeneous_table(n: usize, seed: u64) -> DataTable {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut column = |lo: f64, hi: f64| -> Vec<f64> { (0..n).map(|_| rng.random_range(lo..hi)).collect() };
        DataTable::from_columns(vec![
            ("A_char_1", column(20.0, 80.0)),
            ("A_char_2", column(20.0, 80.0)),
            ("A_char_3", column(20.0, 80.0)),
            ("A_char_4", column(20.0, 80.0)),
            ("A_mrs_12", column(0.1, 3.0)),
            ("A_mrs_13", column(0.1, 3.0)),
            ("A_mrs_14", column(0.1, 3.0)),
            ("B_char_1", column(20.0, 80.0)),
            ("B_char_2", column(20.0, 80.0)),
            ("B_char_3", column(20.0, 80.0)),
            ("B_char_4", column(20.0, 80.0)),
            ("B_mrs_12", column(0.1, 3.0)),
            ("B_mrs_13", column(0.1, 3.0)),
            ("B_mrs_14", column(0.1, 3.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_example_converges() {
        let (table, report) = example_market(&SyntheticOptions::default(), &CompileOptions::default()).unwrap();
        assert_eq!(table.n_rows(), 200);
        assert!(report.converged());
        assert!(report.iterations() <= 200);

        let last = report.log().last().unwrap();
        assert_eq!(last.reviewers_unmatched, 0);
        assert_eq!(last.applicants_matched, 200);
        assert_eq!(report.log().len(), report.iterations());
        assert_eq!(report.data_output().n_rows(), 200);
    }

    #[test]
    fn test_four_feature_biased_example_converges() {
        let synthetic = SyntheticOptions {
            applicant_features: 4,
            reviewer_features: 4,
            bias: true,
            seed: 3,
            ..SyntheticOptions::default()
        };
        let (_, report) = example_market(&synthetic, &CompileOptions::default()).unwrap();
        assert!(report.converged());
        assert!(report.results.derived("A_apparent_v_z").is_some());
    }

    #[test]
    fn test_two_features_equal_zero_padded_four() {
        let two = DataTable::from_columns(vec![
            ("A_char_1", vec![40.0, 55.0, 62.0, 48.0]),
            ("A_char_2", vec![12.0, 3.0, 8.0, 9.0]),
            ("A_mrs_12", vec![1.5, 0.5, 2.0, 1.0]),
            ("B_char_1", vec![50.0, 45.0, 70.0, 52.0]),
            ("B_char_2", vec![5.0, 20.0, 1.0, 11.0]),
            ("B_mrs_12", vec![0.5, 1.0, 0.25, 2.0]),
        ])
        .unwrap();
        let mut four = two.clone();
        for name in ["A_char_3", "A_char_4", "A_mrs_13", "A_mrs_14", "B_char_3", "B_char_4", "B_mrs_13", "B_mrs_14"] {
            four.push_float(name, vec![0.0; 4]).unwrap();
        }

        let options = CompileOptions::default();
        let two_report = run_market(&two, &MarketConfig::with_features(2, 2), &options).unwrap();
        let four_report = run_market(&four, &MarketConfig::with_features(4, 4), &options).unwrap();

        assert_eq!(two_report.log(), four_report.log());
        for (a2, a4) in two_report.outcome.applicants().iter().zip(four_report.outcome.applicants()) {
            assert_eq!(a2.matched, a4.matched);
            assert_eq!(a2.match_utility, a4.match_utility);
        }
        for name in ["A_obs_u", "A_dap_u", "diff_A", "B_obs_u", "B_dap_u", "diff_B_z"] {
            assert_eq!(two_report.results.derived(name), four_report.results.derived(name), "{name}");
        }
    }

    #[test]
    fn test_heterogeneous_preferences_converge_at_default_size() {
        let config = MarketConfig::with_features(4, 4);
        for seed in 0..5 {
            let table = heterogeneous_table(200, seed);
            let report = run_market(&table, &config, &CompileOptions::default()).unwrap();

            assert!(report.converged(), "seed {seed} did not converge");
            assert!(report.iterations() <= MAX_ITERATIONS, "seed {seed}: {} iterations", report.iterations());
            let last = report.log().last().unwrap();
            assert_eq!(last.reviewers_unmatched, 0);
            assert_eq!(last.applicants_matched, 200);
        }
    }

    #[test]
    fn test_iteration_cap_flows_through_config() {
        let table = example_table(&SyntheticOptions { size: 30, ..SyntheticOptions::default() }).unwrap();
        let config = MarketConfig { max_iterations: 2, ..MarketConfig::default() };
        let report = run_market(&table, &config, &CompileOptions::default()).unwrap();

        assert!(!report.converged());
        assert_eq!(report.iterations(), 3);
        assert!(report.log().last().unwrap().reviewers_unmatched > 0);
        // Unmatched rows still compile to finite payoff columns.
        assert!(report.results.derived("A_dap_u").unwrap().iter().all(|u| u.is_finite()));
    }
}
