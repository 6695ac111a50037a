/// Record builder: reshapes a named-column table into the two populations.
///
/// Characteristic and weight slots beyond the configured feature count are
/// zero-filled here, once, so the proposal loop never branches on the count.
use tracing::info;

use crate::constants::{CHARACTERISTIC_SLOTS, MAX_FEATURES, MAX_ITERATIONS, MIN_FEATURES, MRS_SLOTS};
use crate::error::{MarketError, Result, Side};
use crate::table::DataTable;
use crate::types::{Applicant, Characteristics, MrsWeights, Populations, Reviewer};

/// Input column names for every field the builder may read.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ColumnNames {
    pub applicant_characteristics: [String; CHARACTERISTIC_SLOTS],
    /// Applicant weights on reviewer characteristics 2..4.
    pub applicant_mrs: [String; MRS_SLOTS],
    pub applicant_bias_characteristic: String,
    pub reviewer_characteristics: [String; CHARACTERISTIC_SLOTS],
    /// Reviewer weights on applicant characteristics 2..4.
    pub reviewer_mrs: [String; MRS_SLOTS],
    pub reviewer_bias_mrs: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            applicant_characteristics: ["A_char_1", "A_char_2", "A_char_3", "A_char_4"].map(String::from),
            applicant_mrs: ["A_mrs_12", "A_mrs_13", "A_mrs_14"].map(String::from),
            applicant_bias_characteristic: "A_bias_char".to_string(),
            reviewer_characteristics: ["B_char_1", "B_char_2", "B_char_3", "B_char_4"].map(String::from),
            reviewer_mrs: ["B_mrs_12", "B_mrs_13", "B_mrs_14"].map(String::from),
            reviewer_bias_mrs: "B_bias_mrs".to_string(),
        }
    }
}

/// Shape of the market: characteristic counts per side, bias switch, column names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketConfig {
    /// Characteristics describing each applicant (2, 3 or 4).
    pub applicant_features: usize,
    /// Characteristics describing each reviewer (2, 3 or 4).
    pub reviewer_features: usize,
    pub bias: bool,
    pub columns: ColumnNames,
    /// Iteration cap for the proposal loop.
    pub max_iterations: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            applicant_features: MIN_FEATURES,
            reviewer_features: MIN_FEATURES,
            bias: false,
            columns: ColumnNames::default(),
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl MarketConfig {
    pub fn with_features(applicant_features: usize, reviewer_features: usize) -> Self {
        MarketConfig {
            applicant_features,
            reviewer_features,
            ..MarketConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_feature_count(Side::Applicants, self.applicant_features)?;
        check_feature_count(Side::Reviewers, self.reviewer_features)
    }

    /// Every column the configuration reads, in a stable order.
    pub fn required_columns(&self) -> Vec<&str> {
        let c = &self.columns;
        // Applicants weight reviewer characteristics, so each side's MRS count
        // follows the other side's feature count.
        let mut required: Vec<&str> = Vec::new();
        required.extend(c.applicant_characteristics[..self.applicant_features].iter().map(String::as_str));
        required.extend(c.applicant_mrs[..self.reviewer_features - 1].iter().map(String::as_str));
        required.extend(c.reviewer_characteristics[..self.reviewer_features].iter().map(String::as_str));
        required.extend(c.reviewer_mrs[..self.applicant_features - 1].iter().map(String::as_str));
        if self.bias {
            required.push(&c.applicant_bias_characteristic);
            required.push(&c.reviewer_bias_mrs);
        }
        required
    }
}

fn check_feature_count(side: Side, count: usize) -> Result<()> {
    if (MIN_FEATURES..=MAX_FEATURES).contains(&count) {
        Ok(())
    } else {
        Err(MarketError::InvalidFeatureCount { side, count })
    }
}

/// Reads the first `count` named columns into fixed-width rows, zero-filling the rest.
fn read_slots<const N: usize>(table: &DataTable, names: &[String; N], count: usize) -> Result<Vec<[f64; N]>> {
    let mut rows = vec![[0.0; N]; table.n_rows()];
    for (slot, name) in names.iter().enumerate().take(count) {
        let values = table.require_float(name)?;
        for (row, &v) in rows.iter_mut().zip(values) {
            row[slot] = v;
        }
    }
    Ok(rows)
}

/// Build both populations from `table`. Row `i` becomes applicant `i` and reviewer `i`.
pub fn build_populations(table: &DataTable, config: &MarketConfig) -> Result<Populations> {
    config.validate()?;
    for name in config.required_columns() {
        let values = table.require_float(name)?;
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(MarketError::NonFiniteValue { column: name.to_string(), row });
        }
    }
    let n = table.n_rows();
    if n == 0 {
        return Err(MarketError::EmptyPopulation);
    }

    let c = &config.columns;
    let applicant_chars: Vec<Characteristics> =
        read_slots(table, &c.applicant_characteristics, config.applicant_features)?;
    let applicant_mrs: Vec<MrsWeights> = read_slots(table, &c.applicant_mrs, config.reviewer_features - 1)?;
    let reviewer_chars: Vec<Characteristics> =
        read_slots(table, &c.reviewer_characteristics, config.reviewer_features)?;
    let reviewer_mrs: Vec<MrsWeights> = read_slots(table, &c.reviewer_mrs, config.applicant_features - 1)?;

    let (bias_chars, bias_mrs) = if config.bias {
        let chars = table.require_float(&c.applicant_bias_characteristic)?.to_vec();
        if let Some((row, &value)) = chars.iter().enumerate().find(|&(_, &v)| v != 0.0 && v != 1.0) {
            return Err(MarketError::InvalidBiasCharacteristic { row, value });
        }
        (chars, table.require_float(&c.reviewer_bias_mrs)?.to_vec())
    } else {
        (vec![0.0; n], vec![0.0; n])
    };

    let applicants = (0..n)
        .map(|id| Applicant::new(id, applicant_chars[id], applicant_mrs[id]).with_bias(bias_chars[id]))
        .collect();
    let reviewers = (0..n)
        .map(|id| Reviewer::new(id, reviewer_chars[id], reviewer_mrs[id]).with_bias(bias_mrs[id]))
        .collect();

    info!(
        market_size = n,
        applicant_features = config.applicant_features,
        reviewer_features = config.reviewer_features,
        bias = config.bias,
        "market loaded"
    );

    Ok(Populations {
        applicants,
        reviewers,
        applicant_features: config.applicant_features,
        reviewer_features: config.reviewer_features,
        bias: config.bias,
    })
}

/// Pair pre-built populations, checking they can be matched one-to-one.
///
/// Ids must equal positions, and with `bias == false` every bias value must be 0.
pub fn pair_populations(
    applicants: Vec<Applicant>,
    reviewers: Vec<Reviewer>,
    applicant_features: usize,
    reviewer_features: usize,
    bias: bool,
) -> Result<Populations> {
    check_feature_count(Side::Applicants, applicant_features)?;
    check_feature_count(Side::Reviewers, reviewer_features)?;
    if applicants.len() != reviewers.len() {
        return Err(MarketError::PopulationSizeMismatch {
            applicants: applicants.len(),
            reviewers: reviewers.len(),
        });
    }
    if applicants.is_empty() {
        return Err(MarketError::EmptyPopulation);
    }
    if let Some((position, a)) = applicants.iter().enumerate().find(|(p, a)| a.id != *p) {
        return Err(MarketError::IdMismatch { side: Side::Applicants, position, id: a.id });
    }
    if let Some((position, r)) = reviewers.iter().enumerate().find(|(p, r)| r.id != *p) {
        return Err(MarketError::IdMismatch { side: Side::Reviewers, position, id: r.id });
    }
    if !bias {
        if let Some(row) = applicants.iter().position(|a| a.bias_characteristic != 0.0) {
            return Err(MarketError::UnexpectedBias { side: Side::Applicants, row });
        }
        if let Some(row) = reviewers.iter().position(|r| r.bias_mrs != 0.0) {
            return Err(MarketError::UnexpectedBias { side: Side::Reviewers, row });
        }
    }
    Ok(Populations {
        applicants,
        reviewers,
        applicant_features,
        reviewer_features,
        bias,
    })
}
