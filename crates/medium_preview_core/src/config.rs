//! Startup configuration.
//!
//! Loaded once from `config.toml` and owned by the running session. A missing
//! file means defaults. A malformed file also means defaults, and the parse
//! error is handed back so the host can tell the user.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Title shown in the panel header.
    pub title: String,

    /// Text shown when the panel opens before any document was rendered.
    pub placeholder: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            title: "Medium Preview".into(),
            placeholder: "Open a Markdown file to see the Medium preview.".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ClipboardConfig {
    /// Also offer the Markdown source as `text/plain` next to the HTML.
    pub plain_text_alternative: bool,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            plain_text_alternative: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LogConfig {
    /// Specify the log file path.
    ///
    /// This path must be an absolute path.
    pub log_file: Option<String>,

    /// Specify the max log level.
    pub max_level: String,

    /// Specify the log target to enable more detailed logging.
    ///
    /// ```toml
    /// [log]
    /// log-target = "medium_preview_core=trace"
    /// ```
    pub log_target: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            max_level: "debug".into(),
            log_target: "".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Preview panel.
    pub panel: PanelConfig,

    /// Copy to Medium.
    pub clipboard: ClipboardConfig,

    /// Log configuration.
    pub log: LogConfig,
}

pub struct LoadedConfig {
    pub config: PreviewConfig,
    pub file_path: Option<PathBuf>,
    pub maybe_error: Option<toml::de::Error>,
}

/// Linux: ~/.config/medium_preview/config.toml
/// macOS: ~/Library/Application Support/medium_preview/config.toml
/// Windows: ~\AppData\Roaming\medium_preview\config.toml
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("medium_preview").join("config.toml"))
}

/// Load the config from `specified_config_file`, or from the default location.
pub fn load_config(specified_config_file: Option<PathBuf>) -> LoadedConfig {
    let file_path = specified_config_file.or_else(default_config_file);

    let Some(path) = file_path.as_ref() else {
        return LoadedConfig {
            config: PreviewConfig::default(),
            file_path,
            maybe_error: None,
        };
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %path.display(), "Failed to read config file");
            }
            return LoadedConfig {
                config: PreviewConfig::default(),
                file_path,
                maybe_error: None,
            };
        }
    };

    let (config, maybe_error) = match toml::from_str(&contents) {
        Ok(config) => (config, None),
        Err(err) => (PreviewConfig::default(), Some(err)),
    };

    LoadedConfig {
        config,
        file_path,
        maybe_error,
    }
}
