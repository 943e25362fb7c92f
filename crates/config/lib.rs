use log::info;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".bike-stat.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// CSV file with one row per day.
    pub source: String,
    pub histogram_bins: usize,
    pub currency: CurrencyFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: "bike_day_data.csv".to_string(),
            histogram_bins: 20,
            currency: CurrencyFormat::default(),
        }
    }
}

/// How the monetary proxy is printed, e.g. `AUD 1.234.567,89` with a
/// non-breaking space after the code.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CurrencyFormat {
    pub code: String,
    pub grouping_separator: String,
    pub decimal_separator: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            code: "AUD".to_string(),
            grouping_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
        }
    }
}

impl Config {
    /// Reads `filename`, or falls back to defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Config, ConfigError> {
        let filename = filename.as_ref();
        if !filename.exists() {
            info!("config file {:?} not found, using defaults", filename);
            return Ok(Config::default());
        }
        let reader = File::open(filename)?;
        let config: Config = serde_yaml::from_reader(reader)?;
        info!("config loaded: {:?}", filename);
        Ok(config)
    }
}
