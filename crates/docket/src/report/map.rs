//! Sector markers for the task map.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{MapConfig, SectorCoordinates};

use super::SectorCount;

/// Largest marker radius, reached at 64 tasks.
const MAX_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorMarker {
    pub sector: String,
    pub lat: f64,
    pub lon: f64,
    pub count: usize,
    pub radius: f64,
    pub label: String,
}

/// Marker radius grows with the square root of the task count.
pub fn marker_radius(count: usize) -> f64 {
    ((count as f64).sqrt() + 2.0).min(MAX_RADIUS)
}

/// One marker per counted sector with known coordinates.
///
/// Sectors missing from the lookup are left off the map.
pub fn sector_markers(counts: &[SectorCount], sectors: &SectorCoordinates) -> Vec<SectorMarker> {
    counts
        .iter()
        .filter_map(|c| {
            let position = sectors.get(&c.sector)?;
            Some(SectorMarker {
                sector: c.sector.clone(),
                lat: position.lat,
                lon: position.lon,
                count: c.count,
                radius: marker_radius(c.count),
                label: format!("{}: {} tarefas", c.sector, c.count),
            })
        })
        .collect()
}

/// GeoJSON `FeatureCollection` of the markers. Map centre and zoom ride along
/// as foreign members so a viewer can open on the right area.
pub fn to_geojson(markers: &[SectorMarker], map: &MapConfig) -> Value {
    let features: Vec<Value> = markers
        .iter()
        .map(|m| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [m.lon, m.lat],
                },
                "properties": {
                    "sector": m.sector,
                    "count": m.count,
                    "radius": m.radius,
                    "label": m.label,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "center": [map.center[1], map.center[0]],
        "zoom": map.zoom,
        "features": features,
    })
}
