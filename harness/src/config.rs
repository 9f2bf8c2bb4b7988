//! Configuration management for benchmark sessions

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::DatasetSpec;
use crate::error::{HarnessError, Result};
use crate::runner::RunnerConfig;

/// Main harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub runner: RunnerSettings,
    pub dataset: DatasetSpec,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    pub runs: usize,
    pub warmup_runs: usize,
    pub inter_run_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub directory: String,
    pub write_csv_summary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runner: RunnerSettings {
                runs: 10,
                warmup_runs: 1,
                inter_run_delay_ms: 100,
            },
            dataset: DatasetSpec::default(),
            output: OutputSettings {
                directory: "./benchmark_results".to_string(),
                write_csv_summary: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| HarnessError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| HarnessError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(runs) = std::env::var("STATEBENCH_RUNS") {
            config.runner.runs = runs
                .parse()
                .map_err(|_| HarnessError::Config(format!("invalid STATEBENCH_RUNS '{runs}'")))?;
        }

        if let Ok(warmup) = std::env::var("STATEBENCH_WARMUP_RUNS") {
            config.runner.warmup_runs = warmup.parse().map_err(|_| {
                HarnessError::Config(format!("invalid STATEBENCH_WARMUP_RUNS '{warmup}'"))
            })?;
        }

        if let Ok(seed) = std::env::var("STATEBENCH_SEED") {
            config.dataset.seed = seed
                .parse()
                .map_err(|_| HarnessError::Config(format!("invalid STATEBENCH_SEED '{seed}'")))?;
        }

        if let Ok(dir) = std::env::var("STATEBENCH_OUTPUT_DIR") {
            config.output.directory = dir;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.runner.runs == 0 {
            return Err(HarnessError::Config(
                "runner.runs must be greater than 0".to_string(),
            ));
        }

        if self.runner.warmup_runs == 0 {
            return Err(HarnessError::Config(
                "runner.warmup_runs must be at least 1".to_string(),
            ));
        }

        if self.dataset.decks == 0 || self.dataset.cards_per_deck == 0 {
            return Err(HarnessError::Config(
                "dataset must contain at least one deck and one card".to_string(),
            ));
        }

        if self.output.directory.is_empty() {
            return Err(HarnessError::Config(
                "output.directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            runs: self.runner.runs,
            warmup_runs: self.runner.warmup_runs,
            inter_run_delay: Duration::from_millis(self.runner.inter_run_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_runs_is_rejected() {
        let mut config = Config::default();
        config.runner.runs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).expect("serializes");
        let back: Config = toml::from_str(&text).expect("parses");
        assert_eq!(back.runner.runs, config.runner.runs);
        assert_eq!(back.dataset.seed, config.dataset.seed);
    }
}
