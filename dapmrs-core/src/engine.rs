/// Deferred-acceptance matching engine.
///
/// Applicants propose, reviewers hold the best offer seen so far. Preferences
/// are derived from linear utilities rather than supplied as lists.
///
/// Proposals follow a single global rank `q` shared by every applicant: in each
/// iteration every unmatched applicant proposes to its `q`-th ranked reviewer,
/// then `q` advances (wrapping back to 1 after the last rank). An applicant
/// released by a breakup resumes at whatever `q` is current.
///
/// Applicants are processed in id order and each decision is visible to the
/// applicants after it within the same iteration.
use tracing::{debug, info, warn};

use crate::constants::{MAX_ITERATIONS, PROGRESS_EVERY};
use crate::types::{Applicant, IterationLog, MatchOutcome, Populations, Reviewer};

/// Per-iteration counters.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    breakups: usize,
    rejections: usize,
    passed_matched: usize,
}

pub struct MatchingEngine {
    populations: Populations,

    /// 1-based proposal rank shared by all applicants.
    rank: usize,
    iteration: usize,
    rank_resets: usize,
    /// The loop stops once `iteration` exceeds this.
    max_iterations: usize,

    /// Reviewer ids ordered by descending applicant utility, built on first use.
    /// Utilities depend only on fixed characteristics and weights, so an order
    /// never goes stale.
    preferences: Vec<Option<Vec<usize>>>,

    log: Vec<IterationLog>,
}

impl MatchingEngine {
    pub fn new(populations: Populations) -> Self {
        assert_eq!(
            populations.applicants.len(),
            populations.reviewers.len(),
            "MatchingEngine requires equal population sizes"
        );
        let n = populations.applicants.len();
        MatchingEngine {
            populations,
            rank: 1,
            iteration: 0,
            rank_resets: 0,
            max_iterations: MAX_ITERATIONS,
            preferences: vec![None; n],
            log: Vec::new(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn market_size(&self) -> usize {
        self.populations.applicants.len()
    }

    pub fn applicants(&self) -> &[Applicant] {
        &self.populations.applicants
    }

    pub fn reviewers(&self) -> &[Reviewer] {
        &self.populations.reviewers
    }

    /// Current 1-based proposal rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn log(&self) -> &[IterationLog] {
        &self.log
    }

    /// True once every reviewer holds an applicant.
    pub fn all_reviewers_matched(&self) -> bool {
        self.populations.reviewers.iter().all(Reviewer::is_matched)
    }

    /// Applicant `i`'s reviewers sorted by descending utility.
    /// Ties keep reviewer id order (stable sort).
    pub fn preference_order(&mut self, i: usize) -> &[usize] {
        if self.preferences[i].is_none() {
            let applicant = &self.populations.applicants[i];
            let utilities: Vec<f64> = self
                .populations
                .reviewers
                .iter()
                .map(|r| applicant.utility_from(r))
                .collect();
            let mut order: Vec<usize> = (0..utilities.len()).collect();
            order.sort_by(|&a, &b| utilities[b].total_cmp(&utilities[a]));
            self.preferences[i] = Some(order);
        }
        self.preferences[i].as_deref().unwrap_or_default()
    }

    /// Run one full pass over the applicants at the current rank.
    pub fn step(&mut self) -> &IterationLog {
        self.iteration += 1;
        let mut tally = Tally::default();
        let rank = self.rank;

        for i in 0..self.market_size() {
            if self.populations.applicants[i].is_matched() {
                tally.passed_matched += 1;
                continue;
            }

            let target = self.preference_order(i)[rank - 1];

            match self.populations.reviewers[target].matched {
                None => self.form_match(i, target),
                Some(incumbent) => {
                    let reviewer = &self.populations.reviewers[target];
                    let incumbent_value = reviewer.utility_from(&self.populations.applicants[incumbent]);
                    let proposer_value = reviewer.utility_from(&self.populations.applicants[i]);

                    // Strictly better offers only. A tie keeps the incumbent and counts as neither.
                    if proposer_value > incumbent_value {
                        self.release(incumbent);
                        self.form_match(i, target);
                        tally.breakups += 1;
                    } else if proposer_value < incumbent_value {
                        tally.rejections += 1;
                    }
                }
            }
        }

        if self.rank < self.market_size() {
            self.rank += 1;
        } else {
            self.rank = 1;
            self.rank_resets += 1;
        }

        let entry = self.snapshot(tally);
        debug!(
            iteration = entry.iteration,
            applicants_matched = entry.applicants_matched,
            reviewers_unmatched = entry.reviewers_unmatched,
            breakups = entry.breakups,
            rejections = entry.rejections,
            "iteration complete"
        );
        if self.iteration % PROGRESS_EVERY == 0 {
            debug!(iteration = self.iteration, rank = self.rank, "matching in progress");
        }

        self.log.push(entry);
        &self.log[self.log.len() - 1]
    }

    /// Run to a fixed point: every reviewer matched, or the iteration cap exceeded.
    pub fn run(mut self) -> MatchOutcome {
        loop {
            self.step();
            if self.all_reviewers_matched() || self.iteration > self.max_iterations {
                break;
            }
        }

        let converged = self.all_reviewers_matched();
        if converged {
            info!(iterations = self.iteration, "all reviewers are matched");
        } else {
            let unmatched = self.populations.reviewers.iter().filter(|r| !r.is_matched()).count();
            warn!(
                iterations = self.iteration,
                reviewers_unmatched = unmatched,
                "iteration cap reached before every reviewer was matched"
            );
        }

        MatchOutcome {
            iterations: self.iteration,
            converged,
            populations: self.populations,
            log: self.log,
        }
    }

    /// Pair applicant `i` with reviewer `r`, recomputing both utilities.
    fn form_match(&mut self, i: usize, r: usize) {
        let Populations { applicants, reviewers, .. } = &mut self.populations;
        let applicant_utility = applicants[i].utility_from(&reviewers[r]);
        let reviewer_utility = reviewers[r].utility_from(&applicants[i]);

        applicants[i].matched = Some(r);
        applicants[i].match_utility = applicant_utility;
        reviewers[r].matched = Some(i);
        reviewers[r].match_utility = reviewer_utility;
    }

    /// Drop applicant `j`'s match. The reviewer side is overwritten by the caller.
    fn release(&mut self, j: usize) {
        let applicant = &mut self.populations.applicants[j];
        applicant.matched = None;
        applicant.match_utility = 0.0;
    }

    fn snapshot(&self, tally: Tally) -> IterationLog {
        let applicants = &self.populations.applicants;
        let reviewers = &self.populations.reviewers;
        let n = applicants.len();
        let applicants_matched = applicants.iter().filter(|a| a.is_matched()).count();
        let reviewers_matched = reviewers.iter().filter(|r| r.is_matched()).count();
        let mean = |total: f64| if n == 0 { 0.0 } else { total / n as f64 };

        IterationLog {
            iteration: self.iteration,
            applicants_matched,
            applicants_unmatched: n - applicants_matched,
            reviewers_matched,
            reviewers_unmatched: reviewers.len() - reviewers_matched,
            applicant_utility_mean: mean(applicants.iter().map(|a| a.match_utility).sum()),
            reviewer_utility_mean: mean(reviewers.iter().map(|r| r.match_utility).sum()),
            breakups: tally.breakups,
            rank_resets: self.rank_resets,
            rejections: tally.rejections,
            passed_matched: tally.passed_matched,
        }
    }
}

/// Run the matching loop on freshly built populations.
pub fn run_matching(populations: Populations) -> MatchOutcome {
    MatchingEngine::new(populations).run()
}
