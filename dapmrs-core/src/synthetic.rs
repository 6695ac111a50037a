/// Seeded example market for demos and tests.
///
/// Characteristics ~ N(50, 10), MRS weights fixed per side,
/// bias characteristic ~ Bernoulli(0.5) with a reviewer bias weight of -25.
/// Column names follow `ColumnNames::default()`.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::constants::{
    SYNTHETIC_APPLICANT_MRS, SYNTHETIC_BIAS_MRS, SYNTHETIC_BIAS_SHARE, SYNTHETIC_MEAN,
    SYNTHETIC_REVIEWER_MRS, SYNTHETIC_SIZE, SYNTHETIC_STD_DEV,
};
use crate::error::{MarketError, Result};
use crate::records::{ColumnNames, MarketConfig};
use crate::table::DataTable;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyntheticOptions {
    pub size: usize,
    pub seed: u64,
    pub applicant_features: usize,
    pub reviewer_features: usize,
    pub bias: bool,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        SyntheticOptions {
            size: SYNTHETIC_SIZE,
            seed: 0,
            applicant_features: 2,
            reviewer_features: 2,
            bias: false,
        }
    }
}

impl SyntheticOptions {
    /// Market configuration that reads the generated table.
    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            applicant_features: self.applicant_features,
            reviewer_features: self.reviewer_features,
            bias: self.bias,
            ..MarketConfig::default()
        }
    }
}

fn normal_column(rng: &mut impl Rng, n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            SYNTHETIC_MEAN + SYNTHETIC_STD_DEV * z
        })
        .collect()
}

/// Generate the example table. Same options, same table.
pub fn example_table(options: &SyntheticOptions) -> Result<DataTable> {
    options.market_config().validate()?;
    if options.size == 0 {
        return Err(MarketError::EmptyPopulation);
    }

    let n = options.size;
    let names = ColumnNames::default();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut table = DataTable::new();

    for name in &names.applicant_characteristics[..options.applicant_features] {
        table.push_float(name.as_str(), normal_column(&mut rng, n))?;
    }
    for (name, &w) in names.applicant_mrs.iter().zip(&SYNTHETIC_APPLICANT_MRS).take(options.reviewer_features - 1) {
        table.push_float(name.as_str(), vec![w; n])?;
    }
    for name in &names.reviewer_characteristics[..options.reviewer_features] {
        table.push_float(name.as_str(), normal_column(&mut rng, n))?;
    }
    for (name, &w) in names.reviewer_mrs.iter().zip(&SYNTHETIC_REVIEWER_MRS).take(options.applicant_features - 1) {
        table.push_float(name.as_str(), vec![w; n])?;
    }

    if options.bias {
        let marks = (0..n)
            .map(|_| if rng.random::<f64>() < SYNTHETIC_BIAS_SHARE { 1.0 } else { 0.0 })
            .collect();
        table.push_float(names.applicant_bias_characteristic.as_str(), marks)?;
        table.push_float(names.reviewer_bias_mrs.as_str(), vec![SYNTHETIC_BIAS_MRS; n])?;
    }

    Ok(table)
}
