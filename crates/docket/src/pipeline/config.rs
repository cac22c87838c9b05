use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::{ColumnMapping, Config, ExportConfig, MapConfig, SectorCoordinates};
use crate::error::ConfigError;

/// Resolved settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: PathBuf,
    pub sheet: Option<String>,
    pub reference_date: NaiveDateTime,
    pub columns: ColumnMapping,
    pub date_formats: Vec<String>,
    pub top_n: usize,
    pub export: ExportConfig,
    pub map: MapConfig,
    pub sectors: SectorCoordinates,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            source: PathBuf::from(&config.source),
            sheet: config.sheet.clone(),
            reference_date: config.reference_date()?,
            columns: config.columns.clone(),
            date_formats: config.date_formats.clone(),
            top_n: config.top_n,
            export: config.export.clone(),
            map: config.map.clone(),
            sectors: config.sectors.clone(),
        })
    }
}
