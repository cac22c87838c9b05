use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;
use crate::source::normalize_column_name;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    config.reference_date()?;

    if config.top_n == 0 {
        return Err(ConfigError::Validation {
            message: "top_n must be at least 1".to_string(),
        });
    }

    if config.date_formats.is_empty() {
        return Err(ConfigError::Validation {
            message: "date_formats must list at least one format".to_string(),
        });
    }

    // Mapped columns must stay distinguishable once normalized like the header
    let mut seen = HashSet::new();
    for name in config.columns.names() {
        let normalized = normalize_column_name(name);
        if normalized.is_empty() {
            return Err(ConfigError::Validation {
                message: "Column names must not be blank".to_string(),
            });
        }
        if !seen.insert(normalized) {
            return Err(ConfigError::Validation {
                message: format!("Column '{}' is mapped more than once", name.trim()),
            });
        }
    }

    for (code, coordinates) in config.sectors.iter() {
        if code.trim().is_empty() {
            return Err(ConfigError::InvalidSector {
                code: code.to_string(),
                reason: "Sector code must not be blank".to_string(),
            });
        }
        if !(-90.0..=90.0).contains(&coordinates.lat) {
            return Err(ConfigError::InvalidSector {
                code: code.to_string(),
                reason: format!("Latitude {} out of range", coordinates.lat),
            });
        }
        if !(-180.0..=180.0).contains(&coordinates.lon) {
            return Err(ConfigError::InvalidSector {
                code: code.to_string(),
                reason: format!("Longitude {} out of range", coordinates.lon),
            });
        }
    }

    Ok(())
}
