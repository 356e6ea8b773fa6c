use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::error::Result;
use crate::error::WalkerError;

/// Settings read once when the plugin starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Log every refresh and swallowed failure.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub debug: bool,

    /// Height of the results surface in lines
    #[serde(default = "default_results_height")]
    pub results_height: usize,

    /// Matching entries collected between forced refreshes
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Case-insensitive regular expressions; matching paths are skipped and
    /// matching directories are not descended into.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub disable_default_key_bindings: bool,
}

pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "\\.git",
    "\\.svn",
    "\\.hg",
    "\\.o$",
    "\\.obj$",
    "\\.a$",
    "\\.exe~?$",
    "tags$",
];

fn default_results_height() -> usize {
    15
}

fn default_batch_size() -> usize {
    500
}

fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(|pattern| (*pattern).to_string())
        .collect()
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            results_height: default_results_height(),
            batch_size: default_batch_size(),
            exclude_patterns: default_exclude_patterns(),
            disable_default_key_bindings: false,
        }
    }
}

impl WalkerConfig {
    /// Builds a config from editor settings. `settings` is an object whose
    /// keys may carry a `prefix` (`walker_batch_size` → `batch_size`).
    pub fn from_settings(settings: serde_json::Value, prefix: &str) -> Result<Self> {
        let serde_json::Value::Object(map) = settings else {
            return Err(WalkerError::InvalidConfig(
                "settings must be a dictionary".to_string(),
            ));
        };
        let stripped: serde_json::Map<String, serde_json::Value> = map
            .into_iter()
            .map(|(key, value)| match key.strip_prefix(prefix) {
                Some(rest) => (rest.to_string(), value),
                None => (key, value),
            })
            .collect();
        let config: WalkerConfig = serde_json::from_value(serde_json::Value::Object(stripped))
            .map_err(|err| WalkerError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(WalkerError::InvalidConfig(
                "batch_size must be > 0".to_string(),
            ));
        }
        if self.results_height == 0 {
            return Err(WalkerError::InvalidConfig(
                "results_height must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Vim has no real booleans in most configs; accept `0`/`1` alongside
/// `v:false`/`v:true`.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrInt {
        Bool(bool),
        Int(i64),
    }

    Ok(match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(value) => value,
        BoolOrInt::Int(value) => value != 0,
    })
}
