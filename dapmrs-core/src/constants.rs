/// Fixed width of every characteristic vector. Agents configured with fewer
/// characteristics carry zeros in the unused trailing slots, so the utility is
/// always a full dot product.
pub const CHARACTERISTIC_SLOTS: usize = 4;

/// Fixed width of every MRS vector (`mrs12`, `mrs13`, `mrs14`).
/// Characteristic 1 always has an implicit weight of 1.
pub const MRS_SLOTS: usize = CHARACTERISTIC_SLOTS - 1;

/// Smallest and largest supported number of characteristics per side.
pub const MIN_FEATURES: usize = 2;
pub const MAX_FEATURES: usize = CHARACTERISTIC_SLOTS;

/// Safety valve for the proposal loop. The loop stops after the iteration in
/// which the counter exceeds this value, so at most `MAX_ITERATIONS + 1`
/// iterations run.
pub const MAX_ITERATIONS: usize = 1000;

/// Emit a progress event every this many iterations.
pub const PROGRESS_EVERY: usize = 10;

/// Synthetic example market defaults.
///
/// Characteristics are drawn from N(50, 10). Weights are fixed per side so
/// every applicant shares one preference order (and every reviewer another),
/// which makes the global-rank schedule settle within one sweep of ranks.
pub const SYNTHETIC_SIZE: usize = 200;
pub const SYNTHETIC_MEAN: f64 = 50.0;
pub const SYNTHETIC_STD_DEV: f64 = 10.0;
pub const SYNTHETIC_APPLICANT_MRS: [f64; MRS_SLOTS] = [1.25, 0.75, 0.5];
pub const SYNTHETIC_REVIEWER_MRS: [f64; MRS_SLOTS] = [0.75, 1.5, 0.5];
pub const SYNTHETIC_BIAS_MRS: f64 = -25.0;
pub const SYNTHETIC_BIAS_SHARE: f64 = 0.5;

/// z-score columns whose standard deviation falls below this are treated as
/// degenerate and zero-filled.
pub const MIN_STD_DEV: f64 = 1e-12;
