//! Configuration loading
//!
//! Reads a YAML document, classifies deserialization failures into the typed
//! [`ConfigError`] taxonomy, then runs range and cross-field validation.

use super::error::ConfigError;
use super::schema::TrainSpec;
use super::validate::validate_config;
use std::fs;
use std::path::Path;

/// Load and validate a training specification from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrainSpec, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    parse_config(&text)
}

/// Parse and validate a training specification from YAML text.
pub fn parse_config(text: &str) -> Result<TrainSpec, ConfigError> {
    let spec: TrainSpec = serde_yaml::from_str(text).map_err(classify_parse_error)?;
    validate_config(&spec)?;
    Ok(spec)
}

/// Serialize a specification back to its flat YAML form.
///
/// Re-validating the output yields an equal specification.
pub fn to_yaml(spec: &TrainSpec) -> Result<String, ConfigError> {
    serde_yaml::to_string(spec).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Map a serde_yaml failure onto the schema's error taxonomy.
///
/// serde reports unknown/missing fields and type mismatches through its error
/// message; the offending key is quoted in backticks.
fn classify_parse_error(err: serde_yaml::Error) -> ConfigError {
    let message = err.to_string();
    if let Some(key) = quoted_after(&message, "unknown field ") {
        ConfigError::UnknownKey(key)
    } else if let Some(key) = quoted_after(&message, "missing field ") {
        ConfigError::MissingKey(key)
    } else if let Some(name) = quoted_after(&message, "unrecognized metric name ") {
        ConfigError::UnknownMetric(name)
    } else if message.contains("invalid type")
        || message.contains("invalid value")
        || message.contains("unknown variant")
    {
        ConfigError::InvalidType(message)
    } else {
        ConfigError::Parse(message)
    }
}

/// Extract the backtick-quoted token following `prefix`, if present.
fn quoted_after(message: &str, prefix: &str) -> Option<String> {
    let start = message.find(prefix)? + prefix.len();
    let rest = message[start..].strip_prefix('`')?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
