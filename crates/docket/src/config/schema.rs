use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// Sheet to read. The first sheet of the workbook when unset.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Instant all deadlines are compared against.
    #[serde(default = "default_reference_date")]
    pub reference_date: String,
    #[serde(default)]
    pub columns: ColumnMapping,
    /// chrono format strings tried, in order, on textual deadlines.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub sectors: SectorCoordinates,
}

fn default_source() -> String {
    "tarefas_sapiens_simuladas.xlsx".to_string()
}

fn default_reference_date() -> String {
    "2025-04-30".to_string()
}

fn default_date_formats() -> Vec<String> {
    vec![
        "%Y-%m-%d %H:%M:%S".to_string(),
        "%Y-%m-%d".to_string(),
        "%d/%m/%Y %H:%M".to_string(),
        "%d/%m/%Y".to_string(),
    ]
}

fn default_top_n() -> usize {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            source: default_source(),
            sheet: None,
            reference_date: default_reference_date(),
            columns: ColumnMapping::default(),
            date_formats: default_date_formats(),
            top_n: default_top_n(),
            export: ExportConfig::default(),
            map: MapConfig::default(),
            sectors: SectorCoordinates::default(),
        }
    }
}

impl Config {
    pub fn reference_date(&self) -> Result<NaiveDateTime, ConfigError> {
        parse_reference_date(&self.reference_date)
    }
}

/// Accepts `YYYY-MM-DD` (midnight) or `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_reference_date(value: &str) -> Result<NaiveDateTime, ConfigError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    Err(ConfigError::InvalidReferenceDate {
        value: value.to_string(),
    })
}

/// Source column names for the four task attributes.
///
/// Names are matched after trimming and lowercasing, same as the loaded header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_process_column")]
    pub process_id: String,
    #[serde(default = "default_user_column")]
    pub responsible_user: String,
    #[serde(default = "default_sector_column")]
    pub origin_sector: String,
    #[serde(default = "default_deadline_column")]
    pub deadline: String,
}

fn default_process_column() -> String {
    "processo".to_string()
}

fn default_user_column() -> String {
    "usuário responsável".to_string()
}

fn default_sector_column() -> String {
    "setor de origem".to_string()
}

fn default_deadline_column() -> String {
    "final prazo".to_string()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            process_id: default_process_column(),
            responsible_user: default_user_column(),
            origin_sector: default_sector_column(),
            deadline: default_deadline_column(),
        }
    }
}

impl ColumnMapping {
    /// Mapped names in a fixed order: process, user, sector, deadline.
    pub fn names(&self) -> [&str; 4] {
        [
            &self.process_id,
            &self.responsible_user,
            &self.origin_sector,
            &self.deadline,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_path")]
    pub path: String,
    #[serde(default = "default_filtered_sheet")]
    pub filtered_sheet: String,
    #[serde(default = "default_top_sheet")]
    pub top_sheet: String,
}

fn default_export_path() -> String {
    "relatorio_tarefas.xlsx".to_string()
}

fn default_filtered_sheet() -> String {
    "Tarefas Filtradas".to_string()
}

fn default_top_sheet() -> String {
    "Top 20 Atrasos".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            filtered_sheet: default_filtered_sheet(),
            top_sheet: default_top_sheet(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// `[lat, lon]` the map opens on.
    #[serde(default = "default_map_center")]
    pub center: [f64; 2],
    #[serde(default = "default_map_zoom")]
    pub zoom: u8,
}

fn default_map_center() -> [f64; 2] {
    [-8.5, -35.0]
}

fn default_map_zoom() -> u8 {
    6
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: default_map_center(),
            zoom: default_map_zoom(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Closed lookup of sector code to map position, serialized as
/// `{"TJSE": [lat, lon], ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorCoordinates(BTreeMap<String, [f64; 2]>);

impl Default for SectorCoordinates {
    fn default() -> Self {
        let mut sectors = BTreeMap::new();
        sectors.insert("TJSE".to_string(), [-10.9472, -37.0731]);
        sectors.insert("TJPE".to_string(), [-8.0543, -34.8813]);
        sectors.insert("TJPB".to_string(), [-7.1151, -34.8641]);
        sectors.insert("TJRN".to_string(), [-5.7945, -35.2110]);
        sectors.insert("TRF5".to_string(), [-7.5, -38.5]);
        Self(sectors)
    }
}

impl SectorCoordinates {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, code: impl Into<String>, coordinates: Coordinates) {
        self.0
            .insert(code.into(), [coordinates.lat, coordinates.lon]);
    }

    pub fn get(&self, code: &str) -> Option<Coordinates> {
        self.0.get(code).map(|[lat, lon]| Coordinates {
            lat: *lat,
            lon: *lon,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Coordinates)> {
        self.0.iter().map(|(code, [lat, lon])| {
            (
                code.as_str(),
                Coordinates {
                    lat: *lat,
                    lon: *lon,
                },
            )
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
