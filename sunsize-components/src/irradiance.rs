//! Solar-resource lookup with per-cell caching.
//!
//! Coordinates are quantized to a [`GridCell`]. The first lookup in a cell
//! asks the optional external [`IrradianceSource`] for exact data and falls
//! back to bilinear interpolation over the local [`ResourceTable`]. The
//! resulting [`IrradianceProfile`] is cached for the life of the provider.

mod cache;
mod cell;
mod source;
mod table;
mod workers;

pub use cell::GridCell;
pub use source::{IrradianceSource, SolarResource, SourceError};
pub use table::{ResourceTable, TableError};

use std::{
    fmt,
    sync::Arc,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use sunsize_core::{
    Model,
    constraint::{Constrained, StrictlyPositive, UnitIntervalLeftOpen},
};
use thiserror::Error;
use uom::si::{
    f64::{Energy, Power, Time},
    time::hour,
};

use crate::{InvalidConfig, interpolation::InterpError};
use cache::ProfileCache;
use workers::{FetchFailure, SourceWorkers};

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Where a profile's figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOrigin {
    /// Exact-cell data from the external source.
    Source,
    /// Bilinear interpolation over the resource table.
    Table,
}

/// Solar resource for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IrradianceProfile {
    pub cell: GridCell,
    /// Cell center as `[latitude, longitude]`.
    pub center: [f64; 2],
    peak_sun_hours: Constrained<f64, StrictlyPositive>,
    derating: Constrained<f64, UnitIntervalLeftOpen>,
    pub origin: ProfileOrigin,
}

impl IrradianceProfile {
    /// # Errors
    ///
    /// Returns a reason if peak sun hours are not positive or the derating
    /// factor is outside `(0, 1]`.
    pub fn new(
        cell: GridCell,
        center: [f64; 2],
        resource: SolarResource,
        origin: ProfileOrigin,
    ) -> Result<Self, &'static str> {
        Ok(Self {
            cell,
            center,
            peak_sun_hours: StrictlyPositive::new(resource.peak_sun_hours)
                .map_err(|_| "peak sun hours must be positive")?,
            derating: UnitIntervalLeftOpen::new(resource.derating)
                .map_err(|_| "derating must be within (0, 1]")?,
            origin,
        })
    }

    /// Equivalent full-sun hours per day.
    #[must_use]
    pub fn peak_sun_hours(&self) -> f64 {
        self.peak_sun_hours.get()
    }

    #[must_use]
    pub fn derating(&self) -> f64 {
        self.derating.get()
    }

    /// Annual production of a system with nameplate rating `power`.
    #[must_use]
    pub fn annual_energy(&self, power: Power) -> Energy {
        power * Time::new::<hour>(self.peak_sun_hours() * DAYS_PER_YEAR) * self.derating()
    }
}

/// Irradiance provider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrradianceConfig {
    /// Edge length of a cache cell, in degrees.
    pub grid_resolution_deg: f64,
    /// How long to wait for the external source before falling back.
    pub source_timeout_ms: u64,
    /// Threads reserved for the external source. A source that stops
    /// answering holds at most this many.
    pub source_workers: usize,
}

impl Default for IrradianceConfig {
    fn default() -> Self {
        Self {
            grid_resolution_deg: 0.1,
            source_timeout_ms: 2000,
            source_workers: 4,
        }
    }
}

impl IrradianceConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a reason if the resolution is not within `(0, 10]` degrees or
    /// the timeout or worker count is zero.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.grid_resolution_deg > 0.0 && self.grid_resolution_deg <= 10.0) {
            return Err("grid_resolution_deg must be within (0, 10]");
        }
        if self.source_timeout_ms == 0 {
            return Err("source_timeout_ms must be positive");
        }
        if self.source_workers == 0 {
            return Err("source_workers must be positive");
        }
        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

/// No solar-resource data could be resolved for a location.
#[derive(Debug, Error)]
#[error("no solar resource data for ({latitude}, {longitude})")]
pub struct LocationUnresolvedError {
    pub latitude: f64,
    pub longitude: f64,
    #[source]
    pub reason: InterpError,
}

/// Resolves and caches irradiance profiles.
///
/// Shared by reference across threads; lookups only contend on the cache.
pub struct IrradianceProvider {
    table: ResourceTable,
    source: Option<SourceWorkers>,
    cache: ProfileCache,
    config: IrradianceConfig,
}

impl fmt::Debug for IrradianceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrradianceProvider")
            .field("table", &self.table.name())
            .field("has_source", &self.source.is_some())
            .field("cached_cells", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

impl IrradianceProvider {
    /// Creates a provider that interpolates over `table`.
    ///
    /// # Errors
    ///
    /// Fails if `config` is invalid.
    pub fn new(table: ResourceTable, config: IrradianceConfig) -> Result<Self, InvalidConfig> {
        InvalidConfig::check("irradiance", config.validate())?;
        Ok(Self {
            table,
            source: None,
            cache: ProfileCache::default(),
            config,
        })
    }

    /// Consults `source` for exact-cell data before the table.
    ///
    /// If the source's worker threads cannot be started the provider keeps
    /// using the table alone.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn IrradianceSource>) -> Self {
        match SourceWorkers::new(source, self.config.source_workers) {
            Ok(workers) => self.source = Some(workers),
            Err(error) => log::warn!("could not start irradiance source workers: {error}"),
        }
        self
    }

    #[must_use]
    pub fn config(&self) -> &IrradianceConfig {
        &self.config
    }

    /// Returns the profile for the cell containing `(latitude, longitude)`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationUnresolvedError`] if neither the source nor the
    /// table has data for the cell. Failures are not cached.
    pub fn lookup(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<IrradianceProfile, LocationUnresolvedError> {
        let resolution = self.config.grid_resolution_deg;
        let cell = GridCell::containing(latitude, longitude, resolution);

        self.cache.get_or_try_insert_with(cell, || {
            let center = cell.center(resolution);
            let profile = self.resolve(cell, center).map_err(|reason| LocationUnresolvedError {
                latitude,
                longitude,
                reason,
            })?;
            log::debug!(
                "resolved cell {:?} from {:?}: psh={:.3}, derating={:.3}",
                cell,
                profile.origin,
                profile.peak_sun_hours(),
                profile.derating()
            );
            Ok(profile)
        })
    }

    /// The cached profile for a cell, if one has been resolved.
    #[must_use]
    pub fn cached_profile(&self, cell: GridCell) -> Option<IrradianceProfile> {
        self.cache.get(cell)
    }

    /// Number of cells with a cached profile.
    #[must_use]
    pub fn cached_cells(&self) -> usize {
        self.cache.len()
    }

    fn resolve(&self, cell: GridCell, center: [f64; 2]) -> Result<IrradianceProfile, InterpError> {
        if let Some(resource) = self.fetch_from_source(center) {
            match IrradianceProfile::new(cell, center, resource, ProfileOrigin::Source) {
                Ok(profile) => return Ok(profile),
                Err(reason) => {
                    log::warn!("discarding source data for cell {cell:?}: {reason}");
                }
            }
        }

        let [latitude, longitude] = center;
        let resource = self.table.resource_at(latitude, longitude)?;

        // Table values are range-checked when the table is loaded.
        IrradianceProfile::new(cell, center, resource, ProfileOrigin::Table).map_err(|_| {
            InterpError::MissingData {
                x: latitude,
                y: longitude,
            }
        })
    }

    /// Asks the source on a worker thread, giving up after the timeout.
    fn fetch_from_source(&self, center: [f64; 2]) -> Option<SolarResource> {
        let workers = self.source.as_ref()?;
        let [latitude, longitude] = center;

        match workers.fetch(latitude, longitude, self.config.timeout()) {
            Ok(Some(resource)) => Some(resource),
            Ok(None) => {
                log::debug!("source has no data at ({latitude}, {longitude})");
                None
            }
            Err(FetchFailure::Source(error)) => {
                log::warn!("irradiance source failed at ({latitude}, {longitude}): {error}");
                None
            }
            Err(FetchFailure::TimedOut) => {
                log::warn!(
                    "irradiance source timed out after {} ms at ({latitude}, {longitude}), using table",
                    self.config.source_timeout_ms
                );
                None
            }
            Err(FetchFailure::Busy) => {
                log::warn!("irradiance source workers busy at ({latitude}, {longitude}), using table");
                None
            }
        }
    }
}

impl Model for IrradianceProvider {
    type Input = [f64; 2];
    type Output = IrradianceProfile;
    type Error = LocationUnresolvedError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let [latitude, longitude] = *input;
        self.lookup(latitude, longitude)
    }
}
