use gemtex_engine::ExportOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Export settings read from `~/.config/gemtex/config.toml`.
///
/// Every field is optional in the file and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document_class: String,
    /// Comma separated class options, e.g. `ngerman,11pt`.
    pub class_options: String,
    pub prompt_label: String,
    /// Where `export` writes when no output is given.
    pub output_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let options = ExportOptions::default();
        Self {
            document_class: options.document_class,
            class_options: options.class_options,
            prompt_label: options.prompt_label,
            output_file: PathBuf::from("gemini-export.tex"),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the output path
        config.output_file = Self::expand_path(&config.output_file).unwrap_or(config.output_file);

        Ok(Some(config))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/gemtex");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            document_class: self.document_class.clone(),
            class_options: self.class_options.clone(),
            prompt_label: self.prompt_label.clone(),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
