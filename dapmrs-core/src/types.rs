use crate::constants::{CHARACTERISTIC_SLOTS, MRS_SLOTS};

/// Characteristics of one agent. Unused trailing slots are 0.0.
pub type Characteristics = [f64; CHARACTERISTIC_SLOTS];

/// Marginal rates of substitution `(mrs12, mrs13, mrs14)` an agent applies to
/// its counterpart's characteristics 2..4. Unused slots are 0.0.
pub type MrsWeights = [f64; MRS_SLOTS];

/// Value of a counterpart with characteristics `c` under weights `w`:
/// `c1 + c2*w12 + c3*w13 + c4*w14`.
pub fn weighted_value(c: &Characteristics, w: &MrsWeights) -> f64 {
    c[0] + c[1] * w[0] + c[2] * w[1] + c[3] * w[2]
}

/// A proposing agent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Applicant {
    /// Row position in the input table. Dense `0..n`.
    pub id: usize,
    pub characteristics: Characteristics,
    /// Binary attribute reviewers may be biased on. 0.0 when bias is disabled.
    pub bias_characteristic: f64,
    /// Weights applied to reviewer characteristics.
    pub mrs: MrsWeights,
    /// Id of the reviewer currently held, if any.
    pub matched: Option<usize>,
    /// Utility of the current match, 0.0 when unmatched.
    pub match_utility: f64,
}

/// An accepting agent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reviewer {
    pub id: usize,
    pub characteristics: Characteristics,
    /// Weights applied to applicant characteristics.
    pub mrs: MrsWeights,
    /// Weight applied to the applicant's bias characteristic. 0.0 when bias is disabled.
    pub bias_mrs: f64,
    pub matched: Option<usize>,
    /// Utility of the current match including the bias term.
    pub match_utility: f64,
}

impl Applicant {
    pub fn new(id: usize, characteristics: Characteristics, mrs: MrsWeights) -> Self {
        Applicant {
            id,
            characteristics,
            bias_characteristic: 0.0,
            mrs,
            matched: None,
            match_utility: 0.0,
        }
    }

    pub fn with_bias(mut self, bias_characteristic: f64) -> Self {
        self.bias_characteristic = bias_characteristic;
        self
    }

    /// How much this applicant values `reviewer`.
    pub fn utility_from(&self, reviewer: &Reviewer) -> f64 {
        weighted_value(&reviewer.characteristics, &self.mrs)
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

impl Reviewer {
    pub fn new(id: usize, characteristics: Characteristics, mrs: MrsWeights) -> Self {
        Reviewer {
            id,
            characteristics,
            mrs,
            bias_mrs: 0.0,
            matched: None,
            match_utility: 0.0,
        }
    }

    pub fn with_bias(mut self, bias_mrs: f64) -> Self {
        self.bias_mrs = bias_mrs;
        self
    }

    /// How much this reviewer values `applicant`, bias term included.
    /// This is the value used to accept or reject proposals.
    pub fn utility_from(&self, applicant: &Applicant) -> f64 {
        self.unbiased_utility_from(applicant) + self.bias_term(applicant)
    }

    /// How much this reviewer values `applicant` with the bias term left out.
    pub fn unbiased_utility_from(&self, applicant: &Applicant) -> f64 {
        weighted_value(&applicant.characteristics, &self.mrs)
    }

    pub fn bias_term(&self, applicant: &Applicant) -> f64 {
        applicant.bias_characteristic * self.bias_mrs
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

/// Both populations of a market, built once per run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Populations {
    pub applicants: Vec<Applicant>,
    pub reviewers: Vec<Reviewer>,
    /// Configured characteristic counts, kept for result compilation.
    pub applicant_features: usize,
    pub reviewer_features: usize,
    pub bias: bool,
}

/// One row of the iteration log.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationLog {
    pub iteration: usize,
    pub applicants_matched: usize,
    pub applicants_unmatched: usize,
    pub reviewers_matched: usize,
    pub reviewers_unmatched: usize,
    pub applicant_utility_mean: f64,
    pub reviewer_utility_mean: f64,
    /// Incumbents displaced by a strictly better proposal.
    pub breakups: usize,
    /// How many times the global rank has wrapped back to 1 so far.
    pub rank_resets: usize,
    /// Proposals turned down by a reviewer holding a strictly better applicant. Ties are not counted.
    pub rejections: usize,
    /// Applicants skipped because they already held a match.
    pub passed_matched: usize,
}

/// Final state of a matching run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchOutcome {
    pub populations: Populations,
    pub log: Vec<IterationLog>,
    pub iterations: usize,
    /// False when the iteration cap stopped the loop with reviewers still unmatched.
    pub converged: bool,
}

impl MatchOutcome {
    pub fn applicants(&self) -> &[Applicant] {
        &self.populations.applicants
    }

    pub fn reviewers(&self) -> &[Reviewer] {
        &self.populations.reviewers
    }

    pub fn unmatched_reviewers(&self) -> usize {
        self.reviewers().iter().filter(|r| !r.is_matched()).count()
    }
}
