/// Headline numbers for a compiled market: what each side could have had,
/// what it got, and how the gap is spread.
use crate::results::{mean, CompiledResults};
use crate::types::MatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideSummary {
    pub mean_observed: f64,
    pub mean_dap: f64,
    pub mean_diff: f64,
    /// Fraction of agents whose `diff` z-score is above 1.
    pub share_above_one_sd: f64,
    /// Fraction of agents whose `diff` z-score is below -1.
    pub share_below_minus_one_sd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupMeans {
    pub count: usize,
    pub mean_observed: f64,
    pub mean_dap: f64,
    pub mean_diff: f64,
}

/// Applicant payoffs split by the bias characteristic.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BiasEffect {
    pub unmarked: GroupMeans,
    pub marked: GroupMeans,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayoffSummary {
    pub applicants: SideSummary,
    pub reviewers: SideSummary,
    pub bias_effect: Option<BiasEffect>,
}

fn share(values: &[f64], predicate: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| predicate(v)).count() as f64 / values.len() as f64
}

fn side(results: &CompiledResults, tag: &str) -> SideSummary {
    let column = |name: String| results.derived(&name).unwrap_or_default();
    let diff_z = column(format!("diff_{tag}_z"));
    SideSummary {
        mean_observed: mean(column(format!("{tag}_obs_u"))),
        mean_dap: mean(column(format!("{tag}_dap_u"))),
        mean_diff: mean(column(format!("diff_{tag}"))),
        share_above_one_sd: share(diff_z, |z| z > 1.0),
        share_below_minus_one_sd: share(diff_z, |z| z < -1.0),
    }
}

fn group(results: &CompiledResults, rows: &[usize]) -> GroupMeans {
    let pick = |name: &str| -> Vec<f64> {
        let values = results.derived(name).unwrap_or_default();
        rows.iter().filter_map(|&i| values.get(i).copied()).collect()
    };
    GroupMeans {
        count: rows.len(),
        mean_observed: mean(&pick("A_obs_u")),
        mean_dap: mean(&pick("A_dap_u")),
        mean_diff: mean(&pick("diff_A")),
    }
}

/// Summarize compiled results. The bias split is present only for biased markets.
pub fn summarize(results: &CompiledResults, outcome: &MatchOutcome) -> PayoffSummary {
    let bias_effect = outcome.populations.bias.then(|| {
        let (marked, unmarked): (Vec<usize>, Vec<usize>) =
            (0..outcome.applicants().len()).partition(|&i| outcome.applicants()[i].bias_characteristic == 1.0);
        BiasEffect {
            unmarked: group(results, &unmarked),
            marked: group(results, &marked),
        }
    });

    PayoffSummary {
        applicants: side(results, "A"),
        reviewers: side(results, "B"),
        bias_effect,
    }
}
