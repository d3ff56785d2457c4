use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::controller::controller_handle::ControllerSettings;
use crate::controller::controller_state::ControllerConfig;
use crate::controller::frame_source::SourceSettings;

const APP_DIR: &str = "padstate";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    pub source: SourceSettings,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used unless `RUST_LOG` is set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            controller: self.controller.clone(),
            source: self.source.clone(),
        }
    }

    /// Loads the config, falling back to defaults when the file does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!("Config file {} does not exist, using default", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

        let config = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// `<config dir>/padstate/config.toml`, current directory if unknown
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(APP_DIR);
    path.push(CONFIG_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::frame_source::SourceKind;
    use crate::controller::range::RangeBounds;

    #[test]
    fn parses_deadzones_and_source() {
        let config: AppConfig = toml::from_str(
            r#"
            [controller.left_deadzone]
            min = -8000
            max = 6000

            [controller.right_deadzone]
            max = 6000

            [source]
            kind = "stdin"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.controller.left_deadzone,
            Some(RangeBounds {
                min: -8000.0,
                max: 6000.0
            })
        );
        assert_eq!(
            config.controller.right_deadzone,
            Some(RangeBounds {
                min: 0.0,
                max: 6000.0
            })
        );
        assert_eq!(config.source.kind, SourceKind::Stdin);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_file_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.controller.left_deadzone, None);
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_default() {
        let path = std::env::temp_dir().join("padstate-missing-dir/config.toml");
        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn invalid_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("padstate-invalid-{}.toml", std::process::id()));
        tokio::fs::write(&path, "controller = 5").await.unwrap();
        let result = AppConfig::load(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn default_path_ends_with_app_file() {
        assert!(default_config_path().ends_with("padstate/config.toml"));
    }
}
