//! Required-capacity planning.

use serde::{Deserialize, Serialize};
use sunsize_core::Model;
use thiserror::Error;
use uom::si::{
    f64::{Power, Time},
    power::kilowatt,
    time::hour,
};

use crate::{
    InvalidConfig,
    irradiance::{DAYS_PER_YEAR, IrradianceProfile},
    request::SizingRequest,
};

/// Capacity planner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Oversize factor used when the request does not state one.
    pub oversize_factor: f64,
    pub min_oversize: f64,
    pub max_oversize: f64,
    /// Largest system the calculator will recommend, in kW.
    pub max_system_size_kw: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            oversize_factor: 1.0,
            min_oversize: 0.5,
            max_oversize: 1.5,
            max_system_size_kw: 1000.0,
        }
    }
}

impl CapacityConfig {
    /// Validates the oversize bounds and the size ceiling.
    ///
    /// # Errors
    ///
    /// Returns a reason if a value is non-finite or non-positive, or if the
    /// default oversize lies outside `[min_oversize, max_oversize]`.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.min_oversize.is_finite() || self.min_oversize <= 0.0 {
            return Err("min_oversize must be finite and positive");
        }
        if !self.max_oversize.is_finite() || self.max_oversize < self.min_oversize {
            return Err("max_oversize must be finite and at least min_oversize");
        }
        if !(self.min_oversize..=self.max_oversize).contains(&self.oversize_factor) {
            return Err("oversize_factor must lie within [min_oversize, max_oversize]");
        }
        if !self.max_system_size_kw.is_finite() || self.max_system_size_kw <= 0.0 {
            return Err("max_system_size_kw must be finite and positive");
        }
        Ok(())
    }
}

/// The required capacity cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InfeasibleCapacityError {
    #[error("required capacity {required_kw} kW is not a positive finite number")]
    NonPositive { required_kw: f64 },

    #[error("required capacity {required_kw:.2} kW exceeds the {maximum_kw} kW maximum")]
    ExceedsMaximum { required_kw: f64, maximum_kw: f64 },
}

/// Converts annual consumption into a nameplate power target.
///
/// The target is the rating whose expected annual production equals the
/// annual consumption, scaled by the oversize factor:
/// `consumption / (psh * 365 * derating) * oversize`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityPlanner {
    config: CapacityConfig,
}

impl CapacityPlanner {
    /// # Errors
    ///
    /// Fails if `config` is invalid.
    pub fn new(config: CapacityConfig) -> Result<Self, InvalidConfig> {
        InvalidConfig::check("capacity", config.validate())?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &CapacityConfig {
        &self.config
    }

    /// The oversize factor applied to `request`, clamped to the configured range.
    #[must_use]
    pub fn oversize_for(&self, request: &SizingRequest) -> f64 {
        let CapacityConfig {
            oversize_factor,
            min_oversize,
            max_oversize,
            ..
        } = self.config;

        let preferred = request.offset_preference().unwrap_or(oversize_factor);
        let clamped = preferred.clamp(min_oversize, max_oversize);
        if clamped != preferred {
            log::debug!("oversize factor {preferred} clamped to {clamped}");
        }
        clamped
    }

    /// Required nameplate power for `request` at `irradiance`.
    ///
    /// # Errors
    ///
    /// Returns [`InfeasibleCapacityError`] if the result is not a positive
    /// finite power or exceeds the configured maximum.
    pub fn plan(
        &self,
        request: &SizingRequest,
        irradiance: &IrradianceProfile,
    ) -> Result<Power, InfeasibleCapacityError> {
        let effective_hours =
            Time::new::<hour>(irradiance.peak_sun_hours() * DAYS_PER_YEAR) * irradiance.derating();
        let required: Power =
            request.annual_consumption() / effective_hours * self.oversize_for(request);

        let required_kw = required.get::<kilowatt>();
        if !required_kw.is_finite() || required_kw <= 0.0 {
            return Err(InfeasibleCapacityError::NonPositive { required_kw });
        }
        if required_kw > self.config.max_system_size_kw {
            return Err(InfeasibleCapacityError::ExceedsMaximum {
                required_kw,
                maximum_kw: self.config.max_system_size_kw,
            });
        }

        log::debug!("required capacity {required_kw:.3} kW");
        Ok(required)
    }
}

impl Default for CapacityPlanner {
    fn default() -> Self {
        Self {
            config: CapacityConfig::default(),
        }
    }
}

impl Model for CapacityPlanner {
    type Input = (SizingRequest, IrradianceProfile);
    type Output = Power;
    type Error = InfeasibleCapacityError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let (request, irradiance) = input;
        self.plan(request, irradiance)
    }
}
