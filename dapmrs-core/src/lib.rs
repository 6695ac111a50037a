/// dapmrs-core: Deferred acceptance with MRS-derived preferences.
///
/// Table in → two populations → stable one-to-one matching → payoff table out.
/// No IO, no plotting, no files. Preferences are never listed explicitly: each
/// agent values a counterpart as `c1 + c2*mrs12 + c3*mrs13 + c4*mrs14`, and
/// reviewers may add a bias term on a binary applicant characteristic.
///
/// Agents are identified by their row position in the input table, on both sides.
///
/// # Quick start
///
/// ```rust
/// use dapmrs_core::{run_market, CompileOptions, DataTable, MarketConfig};
///
/// let table = DataTable::from_columns(vec![
///     ("A_char_1", vec![40.0, 55.0]),
///     ("A_char_2", vec![12.0, 3.0]),
///     ("A_mrs_12", vec![1.5, 1.5]),
///     ("B_char_1", vec![50.0, 45.0]),
///     ("B_char_2", vec![5.0, 20.0]),
///     ("B_mrs_12", vec![0.5, 0.5]),
/// ]).unwrap();
///
/// let report = run_market(&table, &MarketConfig::default(), &CompileOptions::default()).unwrap();
///
/// assert!(report.converged());
/// for entry in report.log() {
///     println!("iteration {}: {} reviewers unmatched", entry.iteration, entry.reviewers_unmatched);
/// }
/// let realized = report.results.derived("A_dap_u").unwrap();
/// println!("applicant 0 realized {:.2}", realized[0]);
/// ```

pub mod constants;
pub mod engine;
pub mod error;
pub mod market;
pub mod records;
pub mod results;
pub mod summary;
pub mod synthetic;
pub mod table;
pub mod types;

// Re-export primary public API at crate root.
pub use engine::{run_matching, MatchingEngine};
pub use error::{MarketError, Result, Side};
pub use market::{example_market, run_market, MarketReport};
pub use records::{build_populations, pair_populations, ColumnNames, MarketConfig};
pub use results::{compile_results, z_scores, CompileOptions, CompiledResults};
pub use summary::{summarize, BiasEffect, GroupMeans, PayoffSummary, SideSummary};
pub use synthetic::{example_table, SyntheticOptions};
pub use table::{Column, ColumnValues, DataTable};
pub use types::{Applicant, IterationLog, MatchOutcome, Populations, Reviewer};
