use ndarray::{Array1, Array2};
use serde::Deserialize;
use sunsize_core::constraint::{StrictlyPositive, UnitIntervalLeftOpen};
use thiserror::Error;

use super::SolarResource;
use crate::interpolation::{Interp2D, InterpError};

const BUILTIN_TABLE: &str = include_str!("../../data/north_america.json");

/// Errors raised while loading a resource table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to parse resource table")]
    Json(#[from] serde_json::Error),

    #[error("`{grid}` has {actual} rows, expected one per latitude ({expected})")]
    RowCount {
        grid: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} of `{grid}` has {actual} values, expected one per longitude ({expected})")]
    RowLength {
        grid: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid `{grid}` value {value} at ({latitude}, {longitude})")]
    InvalidValue {
        grid: &'static str,
        latitude: f64,
        longitude: f64,
        value: f64,
    },

    #[error("invalid resource grid")]
    Grid(#[from] InterpError),
}

/// On-disk shape of a resource table. `null` marks a grid point without data.
#[derive(Deserialize)]
struct TableFile {
    name: String,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    peak_sun_hours: Vec<Vec<Option<f64>>>,
    derating: Vec<Vec<Option<f64>>>,
}

/// Gridded solar-resource climatology used when exact-cell data is absent.
///
/// Both grids are indexed `[latitude][longitude]`. Lookups between grid
/// points use bilinear interpolation across the four surrounding points.
#[derive(Debug)]
pub struct ResourceTable {
    name: String,
    peak_sun_hours: Interp2D,
    derating: Interp2D,
}

impl ResourceTable {
    /// Builds a table from axes and row-major grids.
    ///
    /// # Errors
    ///
    /// Fails if the grids do not match the axes, an axis is not strictly
    /// increasing, or a known value is out of range (peak sun hours must be
    /// positive, derating within `(0, 1]`).
    pub fn new(
        name: impl Into<String>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        peak_sun_hours: Vec<Vec<Option<f64>>>,
        derating: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, TableError> {
        let psh = to_grid("peak_sun_hours", &latitudes, &longitudes, peak_sun_hours, |v| {
            StrictlyPositive::new(v).is_ok()
        })?;
        let derating = to_grid("derating", &latitudes, &longitudes, derating, |v| {
            UnitIntervalLeftOpen::new(v).is_ok()
        })?;

        let latitudes = Array1::from(latitudes);
        let longitudes = Array1::from(longitudes);

        Ok(Self {
            name: name.into(),
            peak_sun_hours: Interp2D::new(latitudes.clone(), longitudes.clone(), psh)?,
            derating: Interp2D::new(latitudes, longitudes, derating)?,
        })
    }

    /// Parses a table from JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or any [`ResourceTable::new`] error.
    pub fn from_json_str(text: &str) -> Result<Self, TableError> {
        let file: TableFile = serde_json::from_str(text)?;
        Self::new(
            file.name,
            file.latitudes,
            file.longitudes,
            file.peak_sun_hours,
            file.derating,
        )
    }

    /// The coarse North America climatology shipped with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded data is corrupt.
    pub fn builtin() -> Result<Self, TableError> {
        Self::from_json_str(BUILTIN_TABLE)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interpolates the resource at a location.
    ///
    /// # Errors
    ///
    /// Fails if the location is outside the table or a contributing grid
    /// point has no data.
    pub fn resource_at(&self, latitude: f64, longitude: f64) -> Result<SolarResource, InterpError> {
        Ok(SolarResource {
            peak_sun_hours: self.peak_sun_hours.interpolate([latitude, longitude])?,
            derating: self.derating.interpolate([latitude, longitude])?,
        })
    }
}

fn to_grid(
    grid: &'static str,
    latitudes: &[f64],
    longitudes: &[f64],
    rows: Vec<Vec<Option<f64>>>,
    is_valid: impl Fn(f64) -> bool,
) -> Result<Array2<Option<f64>>, TableError> {
    if rows.len() != latitudes.len() {
        return Err(TableError::RowCount {
            grid,
            expected: latitudes.len(),
            actual: rows.len(),
        });
    }

    let mut values = Vec::with_capacity(latitudes.len() * longitudes.len());
    for (row, (latitude, cells)) in latitudes.iter().zip(rows).enumerate() {
        if cells.len() != longitudes.len() {
            return Err(TableError::RowLength {
                grid,
                row,
                expected: longitudes.len(),
                actual: cells.len(),
            });
        }
        for (longitude, cell) in longitudes.iter().zip(&cells) {
            if let Some(value) = *cell {
                if !is_valid(value) {
                    return Err(TableError::InvalidValue {
                        grid,
                        latitude: *latitude,
                        longitude: *longitude,
                        value,
                    });
                }
            }
        }
        values.extend(cells);
    }

    let expected = (latitudes.len(), longitudes.len());
    Array2::from_shape_vec(expected, values).map_err(|_| {
        TableError::Grid(InterpError::Shape {
            expected,
            actual: (0, 0),
        })
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn small() -> ResourceTable {
        ResourceTable::new(
            "test",
            vec![0.0, 10.0],
            vec![0.0, 10.0, 20.0],
            vec![
                vec![Some(4.0), Some(5.0), None],
                vec![Some(6.0), Some(7.0), Some(8.0)],
            ],
            vec![
                vec![Some(0.8), Some(0.8), None],
                vec![Some(0.7), Some(0.7), Some(0.9)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn interpolates_between_stations() {
        let resource = small().resource_at(5.0, 5.0).unwrap();
        assert_relative_eq!(resource.peak_sun_hours, 5.5);
        assert_relative_eq!(resource.derating, 0.75);
    }

    #[test]
    fn missing_station_leaves_location_unresolved() {
        assert!(matches!(
            small().resource_at(5.0, 15.0),
            Err(InterpError::MissingData { .. })
        ));
        assert!(matches!(
            small().resource_at(-1.0, 5.0),
            Err(InterpError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn rejects_malformed_tables() {
        let error = ResourceTable::new(
            "bad",
            vec![0.0, 10.0],
            vec![0.0, 10.0],
            vec![vec![Some(4.0), Some(5.0)], vec![Some(6.0)]],
            vec![vec![Some(0.8), Some(0.8)], vec![Some(0.8), Some(0.8)]],
        )
        .unwrap_err();
        assert!(matches!(error, TableError::RowLength { row: 1, .. }));

        let error = ResourceTable::new(
            "bad",
            vec![0.0, 10.0],
            vec![0.0, 10.0],
            vec![vec![Some(4.0), Some(5.0)], vec![Some(6.0), Some(7.0)]],
            vec![vec![Some(0.8), Some(1.2)], vec![Some(0.8), Some(0.8)]],
        )
        .unwrap_err();
        assert!(matches!(
            error,
            TableError::InvalidValue {
                grid: "derating",
                ..
            }
        ));
    }

    #[test]
    fn builtin_table_covers_new_york_but_not_the_open_pacific() {
        let table = ResourceTable::builtin().unwrap();
        let resource = table.resource_at(40.7, -74.0).unwrap();
        assert_relative_eq!(resource.peak_sun_hours, 4.2436, epsilon = 1e-9);
        assert_relative_eq!(resource.derating, 0.8114, epsilon = 1e-9);

        assert!(table.resource_at(0.0, -140.0).is_err());
        assert!(table.resource_at(27.0, -122.0).is_err());
    }
}
