use crate::cli::MonolayerOptions;
use crate::error::{CliError, Result};
use cellpack::engine::config::{ModelConfig, ReplayConfig, ReplayConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_DISTANCE: f64 = 1.0;

/// Replay settings as read from a TOML file; every field may be omitted.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialReplayConfig {
    distance: Option<f64>,
    #[serde(rename = "sync-positions")]
    sync_positions: Option<bool>,
}

impl PartialReplayConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading replay configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::file(path, e))?;
        toml::from_str(&content).map_err(|e| CliError::file(path, e))
    }

    /// Loads the file named by `--config`, if any.
    pub fn from_options(options: &MonolayerOptions) -> Result<Self> {
        match &options.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Precedence: `--distance`/`--sync-positions`, then `--set`, then the
    /// file, then defaults.
    pub fn merge_with_cli(
        mut self,
        options: &MonolayerOptions,
        sync_positions: bool,
    ) -> Result<ReplayConfig> {
        self.apply_set_values(&options.set_values)?;

        let distance = options
            .distance
            .or(self.distance)
            .unwrap_or(DEFAULT_DISTANCE);
        let sync = sync_positions || self.sync_positions.unwrap_or(false);

        ReplayConfigBuilder::new()
            .distance(distance)
            .sync_positions(sync)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = split_key_value(kv_pair)?;
            match key {
                "distance" => {
                    self.distance = Some(parse_value(key, value_str)?);
                }
                "sync-positions" => {
                    self.sync_positions = Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key '{}'. Expected 'distance' or 'sync-positions'.",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Applies `--set name=value` overrides to the settings of a model file.
pub fn apply_setting_overrides(model: &mut ModelConfig, set_values: &[String]) -> Result<()> {
    for kv_pair in set_values {
        let (key, value_str) = split_key_value(kv_pair)?;
        let value: f64 = parse_value(key, value_str)?;
        debug!(setting = key, value, "Overriding model setting from the command line.");
        model.settings.insert(key.to_string(), value);
    }
    Ok(())
}

fn split_key_value(kv_pair: &str) -> Result<(&str, &str)> {
    match kv_pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(CliError::Config(format!(
            "Invalid --set format: '{}'. Expected KEY=VALUE.",
            kv_pair
        ))),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value_str))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn options(distance: Option<f64>, set_values: &[&str]) -> MonolayerOptions {
        MonolayerOptions {
            config: None,
            distance,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = PartialReplayConfig::default()
            .merge_with_cli(&options(None, &[]), false)
            .unwrap();
        assert_eq!(config.distance, DEFAULT_DISTANCE);
        assert!(!config.sync_positions);
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("replay.toml");
        fs::write(&path, "distance = 2.5\nsync-positions = true\n").unwrap();

        let partial = PartialReplayConfig::from_file(&path).unwrap();
        let config = partial.merge_with_cli(&options(None, &[]), false).unwrap();
        assert_eq!(config.distance, 2.5);
        assert!(config.sync_positions);
    }

    #[test]
    fn cli_flags_override_set_values_which_override_the_file() {
        let partial = PartialReplayConfig {
            distance: Some(2.0),
            sync_positions: None,
        };
        let from_set = partial
            .clone()
            .merge_with_cli(&options(None, &["distance=3.0"]), false)
            .unwrap();
        assert_eq!(from_set.distance, 3.0);

        let from_flag = partial
            .merge_with_cli(&options(Some(4.0), &["distance=3.0"]), true)
            .unwrap();
        assert_eq!(from_flag.distance, 4.0);
        assert!(from_flag.sync_positions);
    }

    #[test]
    fn malformed_and_unknown_set_values_are_rejected() {
        for bad in ["distance", "=1.0", "distance=far", "height=1.0"] {
            let result = PartialReplayConfig::default().merge_with_cli(&options(None, &[bad]), false);
            assert!(matches!(result, Err(CliError::Config(_))), "accepted '{bad}'");
        }
    }

    #[test]
    fn invalid_distance_is_a_configuration_error() {
        let result = PartialReplayConfig::default().merge_with_cli(&options(Some(-1.0), &[]), false);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_file_keys_are_rejected_with_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("replay.toml");
        fs::write(&path, "height = 1.0\n").unwrap();
        assert!(matches!(
            PartialReplayConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn setting_overrides_are_written_into_the_model() {
        let mut model = ModelConfig::default();
        apply_setting_overrides(&mut model, &["lumen_elasticity=2.5".to_string()]).unwrap();
        assert_eq!(model.settings["lumen_elasticity"], 2.5);
        assert!(apply_setting_overrides(&mut model, &["lumen_elasticity=x".to_string()]).is_err());
    }
}
