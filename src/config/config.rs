use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows shown in the preview pane
    pub preview_rows: usize,

    /// Show row numbers in the preview
    pub show_row_numbers: bool,

    /// Maximum bars drawn per column in the chart view
    pub chart_max_bars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Directory export artifacts are saved to; the working directory
    /// when unset
    pub output_dir: Option<PathBuf>,

    /// Default export format when a session has not chosen one:
    /// "csv", "xlsx", or "opposite" (the format the file did not arrive in)
    pub default_export_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            show_row_numbers: false,
            chart_max_bars: 32,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_export_format: "opposite".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("data-sweeper").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# data-sweeper Configuration File
# Location: ~/.config/data-sweeper/config.toml (Linux/macOS)
#           %APPDATA%\data-sweeper\config.toml (Windows)

[display]
# Rows shown in the preview pane
preview_rows = 5

# Show row numbers in the preview
show_row_numbers = false

# Maximum bars drawn per column in the chart view
chart_max_bars = 32

[behavior]
# Directory export artifacts are saved to (defaults to the working directory)
# output_dir = "/path/to/exports"

# Default export format for a freshly loaded file:
# "csv", "xlsx", or "opposite" (convert to the format the file is not in)
default_export_format = "opposite"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.display.preview_rows, 5);
        assert_eq!(config.behavior.default_export_format, "opposite");
        assert!(config.behavior.output_dir.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.display.preview_rows, parsed.display.preview_rows);
    }

    #[test]
    fn test_commented_default_parses() {
        let parsed: Config =
            toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed.display.chart_max_bars, 32);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("[display]\npreview_rows = 10\n").unwrap();
        assert_eq!(parsed.display.preview_rows, 10);
        assert_eq!(parsed.display.chart_max_bars, 32);
    }
}
