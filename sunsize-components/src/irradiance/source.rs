use thiserror::Error;

/// Raw solar-resource figures for one location, as reported by a data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarResource {
    pub peak_sun_hours: f64,
    pub derating: f64,
}

/// Errors a data source may report.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("irradiance source unavailable: {0}")]
    Unavailable(String),

    #[error("irradiance source failed")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// An external, exact-cell solar-resource data source (a geospatial
/// service, a station database, ...).
///
/// Calls may be slow; the provider bounds each one with a timeout and falls
/// back to its local table. Returning `Ok(None)` means the source has no
/// data for the cell.
pub trait IrradianceSource: Send + Sync {
    /// Looks up the resource at a grid-cell center.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source cannot answer.
    fn fetch(&self, latitude: f64, longitude: f64) -> Result<Option<SolarResource>, SourceError>;
}
