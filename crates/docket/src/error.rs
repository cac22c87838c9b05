use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocketError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid reference date '{value}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]")]
    InvalidReferenceDate { value: String },

    #[error("Invalid sector '{code}': {reason}")]
    InvalidSector { code: String, reason: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to open workbook '{path}': {reason}")]
    OpenWorkbook { path: PathBuf, reason: String },

    #[error("Workbook '{path}' has no sheet named '{sheet}'")]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("Workbook '{0}' contains no sheets")]
    NoSheets(PathBuf),

    #[error("Failed to read sheet '{sheet}': {reason}")]
    ReadSheet { sheet: String, reason: String },

    #[error("Sheet '{0}' has no header row")]
    EmptySheet(String),

    #[error("Required column '{0}' not found in source")]
    MissingColumn(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to assemble workbook: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error while assembling workbook: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize map: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocketError>;
