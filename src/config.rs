use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_PIXEL_SIZE: u32 = 64;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderSettings,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RenderSettings {
    pub pixel_size: Option<u32>,
    pub output_dir: Option<PathBuf>,
}

impl RenderSettings {
    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
            .filter(|&size| size > 0)
            .unwrap_or(DEFAULT_PIXEL_SIZE)
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = match config_file_path() {
            Some(path) => path,
            None => return Config::default(),
        };

        if !config_path.exists() {
            return Config::default();
        }

        let content = match fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read config file: {}", e);
                return Config::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => {
                log::debug!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config file: {}", e);
                Config::default()
            }
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    let base = if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config_dir)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        dirs::config_dir()?
    };
    Some(base.join("ft-svg-bind").join("config.toml"))
}
