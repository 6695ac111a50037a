/// Config file loading and creation for the dapmrs CLI.
///
/// Config lives at ~/.config/dapmrs/config.toml.
/// All fields are optional. CLI flags override config values.
use dapmrs_core::ColumnNames;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default)]
pub struct DapmrsConfig {
    pub applicant_features: Option<usize>,
    pub reviewer_features: Option<usize>,
    pub bias: Option<bool>,
    pub prefix: Option<String>,
    pub allocation: Option<bool>,
    pub max_iterations: Option<usize>,
    pub seed: Option<u64>,
    pub size: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub files_name: Option<String>,
    pub applicant_label: Option<String>,
    pub reviewer_label: Option<String>,
    /// Input column names. Unlisted names keep their defaults.
    pub columns: Option<ColumnNames>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# dapmrs configuration
# All values here can be overridden by CLI flags.

# Characteristics per agent on each side (2, 3 or 4)
# applicant_features = 2
# reviewer_features = 2

# Add the reviewer bias term on the applicants' binary bias characteristic
# bias = false

# Prefix for derived columns (\"\" for none)
# prefix = \"dap\"

# Append original index and matched-counterpart columns to the output
# allocation = false

# Iteration cap for the proposal loop
# max_iterations = 1000

# Synthetic market used when no --data file is given
# seed = 0
# size = 200

# Where output CSVs go, and their file name stem
# output_dir = \".\"
# files_name = \"dap_mrs\"

# Side names used in the summary table
# applicant_label = \"Applicants\"
# reviewer_label = \"Reviewers\"

# Input column names (only the ones you override)
# [columns]
# applicant_characteristics = [\"A_char_1\", \"A_char_2\", \"A_char_3\", \"A_char_4\"]
# applicant_mrs = [\"A_mrs_12\", \"A_mrs_13\", \"A_mrs_14\"]
# applicant_bias_characteristic = \"A_bias_char\"
# reviewer_characteristics = [\"B_char_1\", \"B_char_2\", \"B_char_3\", \"B_char_4\"]
# reviewer_mrs = [\"B_mrs_12\", \"B_mrs_13\", \"B_mrs_14\"]
# reviewer_bias_mrs = \"B_bias_mrs\"
";

/// Returns the default config path: ~/.config/dapmrs/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("dapmrs").join("config.toml")
}

pub fn parse_config(content: &str) -> Result<DapmrsConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> DapmrsConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => DapmrsConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));

    path
}
