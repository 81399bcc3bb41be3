use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub transitions: TransitionsConfig,

    #[serde(default)]
    pub views: ViewsConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "staterail_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionsConfig {
    /// Redirects followed by one `goto` before it fails with `RedirectLimit`.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Clear committed slots the target state does not bind.
    #[serde(default)]
    pub clear_unbound_views: bool,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_max_redirects() -> usize {
    16
}

fn default_event_capacity() -> usize {
    256
}

impl Default for TransitionsConfig {
    fn default() -> Self {
        Self {
            max_redirects: default_max_redirects(),
            clear_unbound_views: false,
            event_capacity: default_event_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewsConfig {
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Root that URL templates are resolved against.
    #[serde(default = "default_template_dir")]
    pub base_dir: String,

    /// Resolved URL templates kept in memory; 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_template_dir() -> String {
    ".".to_string()
}

fn default_cache_capacity() -> usize {
    64
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            base_dir: default_template_dir(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Contents of a state definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatesConfig {
    #[serde(default)]
    pub states: BTreeMap<String, StateConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub route: Option<String>,

    #[serde(default)]
    pub reload_on_search: Option<bool>,

    /// Explicitly declares that the state has no children.
    #[serde(default)]
    pub no_children: bool,

    #[serde(default)]
    pub views: BTreeMap<String, ViewConfig>,

    #[serde(default)]
    pub children: BTreeMap<String, StateConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Template location, resolved by the configured template resolver.
    #[serde(default)]
    pub template: Option<String>,

    /// Literal template markup. Exactly one of `template` and `inline` is set.
    #[serde(default)]
    pub inline: Option<String>,

    #[serde(default)]
    pub controller: Option<String>,

    #[serde(default)]
    pub sticky: Option<String>,

    #[serde(default)]
    pub locals: Option<serde_json::Value>,
}
