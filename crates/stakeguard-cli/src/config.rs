//! Configuration file support

use serde::{Deserialize, Serialize};
use stakeguard_session::{ConfirmMode, ControllerConfig};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Configuration for stakeguard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How a complete extraction is confirmed (immediate, free-text)
    pub confirm_mode: Option<ConfirmMode>,
    /// Token staked against each invoice
    pub stake_unit: Option<String>,
    /// Suggested stake as a fraction of the invoice amount
    pub recommended_stake_ratio: Option<f64>,
    pub extractor: ExtractorSettings,
    pub commit: CommitSettings,
    pub server: ServerSettings,
}

/// Where extraction runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// local or remote
    pub mode: Option<String>,
    /// Extraction endpoint (remote mode)
    pub url: Option<String>,
    pub max_retries: Option<u32>,
}

/// Where commits go
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitSettings {
    /// simulated or http
    pub mode: Option<String>,
    /// Commit endpoint (http mode)
    pub url: Option<String>,
    /// Delay of the simulated commit
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stakeguard")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("STAKEGUARD_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            confirm_mode: Some(ConfirmMode::Immediate),
            stake_unit: Some("trbtc".to_string()),
            recommended_stake_ratio: Some(0.1),
            extractor: ExtractorSettings {
                mode: Some("local".to_string()),
                url: None,
                max_retries: Some(2),
            },
            commit: CommitSettings {
                mode: Some("simulated".to_string()),
                url: None,
                delay_ms: Some(2000),
            },
            server: ServerSettings {
                bind: Some(DEFAULT_BIND.to_string()),
            },
        };

        default_config.save()?;
        Ok(path)
    }

    /// Controller settings with defaults filled in
    pub fn controller_config(&self) -> ControllerConfig {
        let defaults = ControllerConfig::default();
        ControllerConfig {
            confirm_mode: self.confirm_mode.unwrap_or(defaults.confirm_mode),
            stake_unit: self.stake_unit.clone().unwrap_or(defaults.stake_unit),
            recommended_stake_ratio: self
                .recommended_stake_ratio
                .filter(|r| r.is_finite() && *r >= 0.0)
                .unwrap_or(defaults.recommended_stake_ratio),
        }
    }

    pub fn bind_address(&self) -> String {
        self.server
            .bind
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# stakeguard configuration file
# Place at ~/.config/stakeguard/config.toml (Linux) or set STAKEGUARD_CONFIG_PATH

# How a complete extraction is confirmed:
#   immediate - go straight to the review step
#   free-text - ask "Is this correct?" and wait for yes/correct or /confirm
confirm_mode = "immediate"

# Token staked against each invoice
stake_unit = "trbtc"

# Recommended stake as a fraction of the invoice amount
recommended_stake_ratio = 0.1

[extractor]
# local (in-process) or remote (POST to url)
mode = "local"
# url = "http://127.0.0.1:3000/api/extract-invoice"
max_retries = 2

[commit]
# simulated (wait delay_ms, then succeed) or http (POST to url)
mode = "simulated"
# url = "http://127.0.0.1:8080/invoices"
delay_ms = 2000

[server]
# Address for `stakeguard --serve`
bind = "127.0.0.1:3000"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert_eq!(config.confirm_mode, Some(ConfirmMode::Immediate));
        assert_eq!(config.extractor.mode.as_deref(), Some("local"));
        assert_eq!(config.commit.delay_ms, Some(2000));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        let controller = config.controller_config();
        assert_eq!(controller.confirm_mode, ConfirmMode::Immediate);
        assert_eq!(controller.stake_unit, "trbtc");
        assert_eq!(controller.recommended_stake_ratio, 0.1);
        assert_eq!(config.bind_address(), DEFAULT_BIND);
    }

    #[test]
    fn test_free_text_mode() {
        let config = Config::parse("confirm_mode = \"free-text\"\nstake_unit = \"eth\"").unwrap();
        let controller = config.controller_config();
        assert_eq!(controller.confirm_mode, ConfirmMode::FreeText);
        assert_eq!(controller.stake_unit, "eth");
    }

    #[test]
    fn test_negative_ratio_ignored() {
        let config = Config::parse("recommended_stake_ratio = -1.0").unwrap();
        assert_eq!(config.controller_config().recommended_stake_ratio, 0.1);
    }

    #[test]
    fn test_unknown_confirm_mode_rejected() {
        assert!(Config::parse("confirm_mode = \"sometimes\"").is_err());
    }
}
