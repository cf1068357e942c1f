//! Configuration loading
//!
//! Loads serde-deserializable configuration from YAML, TOML, JSON, INI, RON or
//! JSON5 files. File contents go through environment substitution (`${VAR}`
//! and `$VAR`) before parsing, and [`load_with_env`] additionally layers
//! prefixed environment variables on top.

use config::{Config as Cfg, Environment, File, FileFormat};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::FileFormat as Format;

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env pattern is valid")
});

static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env pattern is valid")
});

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from a file extension.
///
/// `.yaml`/`.yml`, `.toml`, `.json`, `.ini`, `.ron` and `.json5` are recognised.
pub fn detect_format(path: impl AsRef<Path>) -> ConfigResult<FileFormat> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Replace `${VAR}` and `$VAR` references with environment values.
///
/// Unset variables are left untouched so the parser reports them in context.
pub fn substitute_env_vars(content: &str) -> String {
    let lookup = |caps: &Captures| std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string());

    let braced = BRACED_VAR.replace_all(content, lookup);
    BARE_VAR.replace_all(&braced, lookup).into_owned()
}

fn deserialize<T: DeserializeOwned>(
    content: &str,
    format: FileFormat,
    env_prefix: Option<&str>,
) -> ConfigResult<T> {
    let substituted = substitute_env_vars(content);

    let mut builder = Cfg::builder().add_source(File::from_str(&substituted, format));
    if let Some(prefix) = env_prefix {
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
    }

    builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from a file, detecting the format from its extension.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> ConfigResult<T> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), ?format, "loading configuration");
    deserialize(&content, format, None)
}

/// Load configuration from a string in an explicit format.
pub fn from_str<T: DeserializeOwned>(content: &str, format: FileFormat) -> ConfigResult<T> {
    deserialize(content, format, None)
}

/// Load a file, then override keys from `{PREFIX}_...` environment variables.
///
/// Nested keys are separated by a double underscore, so `listen_addr` in a
/// config loaded with prefix `PINVAULT` is overridden by `PINVAULT_LISTEN_ADDR`.
pub fn load_with_env<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    env_prefix: &str,
) -> ConfigResult<T> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize(&content, format, Some(env_prefix))
}
