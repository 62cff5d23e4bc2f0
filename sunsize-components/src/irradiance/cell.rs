use serde::Serialize;

/// A cell of the lat/lng quantization grid.
///
/// Cell indices are `round(coordinate / resolution)`, so a cell is centered
/// on a multiple of the resolution. Every coordinate inside a cell shares
/// the cell's irradiance profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridCell {
    pub lat_index: i32,
    pub lng_index: i32,
}

impl GridCell {
    /// The cell containing `(latitude, longitude)` on a grid of `resolution` degrees.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn containing(latitude: f64, longitude: f64, resolution: f64) -> Self {
        Self {
            lat_index: (latitude / resolution).round() as i32,
            lng_index: (longitude / resolution).round() as i32,
        }
    }

    /// Coordinates of the cell center as `[latitude, longitude]`.
    #[must_use]
    pub fn center(self, resolution: f64) -> [f64; 2] {
        [
            f64::from(self.lat_index) * resolution,
            f64::from(self.lng_index) * resolution,
        ]
    }
}
