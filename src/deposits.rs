//! Point-deposit labels: load deposit locations from CSV, clean their
//! commodity codes, select the ones inside a stamp and export them for a
//! modelling pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use geo::Point;
use geojson::{Feature, FeatureCollection, GeoJson};
use serde::{Deserialize, Serialize};

use crate::reprojection::{projector, WGS84};
use crate::stamp::Stamp;

/// A known mineral deposit with its (possibly messy) commodity string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub id: String,
    pub name: String,
    /// Raw commodity field, multi-valued with `;`, `+`, `/` or `,`.
    pub commodity: String,
    pub lon: f64,
    pub lat: f64,
}

impl Deposit {
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Cleaned commodity codes for this deposit.
    pub fn commodities(&self) -> Vec<String> {
        clean_commodities(&self.commodity)
    }
}

/// Clean a raw commodity field: split on separators, trim, uppercase and
/// deduplicate while keeping first-seen order.
pub fn clean_commodities(raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for part in raw.split(|c: char| matches!(c, ';' | '+' | '/' | ',')) {
        let code = part.trim().to_uppercase();
        if !code.is_empty() && !seen.contains(&code) {
            seen.push(code);
        }
    }
    seen
}

/// Read deposit records from a CSV with `id,name,commodity,lon,lat` columns.
pub fn read_deposits(path: &Path) -> Result<Vec<Deposit>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open deposits CSV {:?}", path))?;
    let mut deposits = Vec::new();
    for result in reader.deserialize() {
        let deposit: Deposit = result.context("Failed to deserialize deposit record")?;
        deposits.push(deposit);
    }
    Ok(deposits)
}

/// Write deposit records back out as CSV (commodity field cleaned).
pub fn write_deposits_csv(deposits: &[Deposit], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create deposits CSV {:?}", path))?;
    for deposit in deposits {
        let cleaned = Deposit {
            commodity: deposit.commodities().join(";"),
            ..deposit.clone()
        };
        writer
            .serialize(cleaned)
            .context("Failed to serialize deposit record")?;
    }
    writer.flush().context("Failed to flush deposits CSV")?;
    Ok(())
}

/// A deposit that falls inside a stamp, with its position in the stamp's
/// local frame (metres east and north of the stamp centre, rotated with the
/// stamp).
#[derive(Debug, Clone)]
pub struct LocalDeposit {
    pub deposit: Deposit,
    pub local_x: f64,
    pub local_y: f64,
}

/// Select the deposits falling inside a stamp.
///
/// Containment is tested in the stamp's local frame, so the rotation of the
/// stamp is honoured exactly rather than approximated with a lon/lat box.
pub fn deposits_in_stamp(deposits: &[Deposit], stamp: &Stamp) -> Result<Vec<LocalDeposit>> {
    let to_local = projector(WGS84, &stamp.local_projection())?;
    let half = stamp.distance * 1000.0 / 2.0;

    let mut inside = Vec::new();
    for deposit in deposits {
        let (x, y) = to_local
            .convert((deposit.lon, deposit.lat))
            .context("Failed to project deposit into the stamp frame")?;
        if x.abs() <= half && y.abs() <= half {
            inside.push(LocalDeposit {
                deposit: deposit.clone(),
                local_x: x,
                local_y: y,
            });
        }
    }
    Ok(inside)
}

/// Write deposits as a GeoJSON FeatureCollection of points (WGS84).
pub fn write_deposits_geojson(deposits: &[Deposit], path: &Path) -> Result<()> {
    let features: Vec<Feature> = deposits
        .iter()
        .map(|deposit| {
            let geometry = geojson::Geometry::new(geojson::Value::from(&deposit.point()));
            let mut properties = serde_json::Map::new();
            properties.insert("id".to_string(), deposit.id.clone().into());
            properties.insert("name".to_string(), deposit.name.clone().into());
            properties.insert(
                "commodities".to_string(),
                deposit.commodities().join(";").into(),
            );
            Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    std::fs::write(path, collection.to_string())
        .with_context(|| format!("Failed to write deposits GeoJSON {:?}", path))?;
    Ok(())
}
