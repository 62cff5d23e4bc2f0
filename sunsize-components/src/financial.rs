//! Cost, savings, and production projections.
//!
//! All money is USD. Savings are capped at the household's own consumption:
//! surplus production is assumed to earn nothing.

use std::fmt;

use serde::{Deserialize, Serialize};
use sunsize_core::Model;
use uom::si::{
    energy::kilowatt_hour,
    f64::{Energy, Mass},
    mass::kilogram,
    power::kilowatt,
};

use crate::{
    InvalidConfig, irradiance::IrradianceProfile, layout::SystemLayout, request::SizingRequest,
    selector::Selection, serialize_units,
};

/// Horizon of the return-on-investment figure.
pub const ROI_YEARS: f64 = 25.0;

/// How the electricity rate used for savings is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TariffPolicy {
    /// Effective rate implied by the request: `12 * monthly bill / annual consumption`.
    #[default]
    FromBill,
    /// A flat rate.
    Fixed { usd_per_kwh: f64 },
}

/// Financial projector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialConfig {
    pub tariff: TariffPolicy,
    /// Installation labor and balance of system, per kW of nameplate.
    pub install_cost_usd_per_kw: f64,
    /// Grid emissions avoided per kWh produced.
    pub co2_kg_per_kwh: f64,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            tariff: TariffPolicy::FromBill,
            install_cost_usd_per_kw: 1500.0,
            co2_kg_per_kwh: 0.446,
        }
    }
}

impl FinancialConfig {
    /// # Errors
    ///
    /// Returns a reason if any rate or cost is negative or non-finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if let TariffPolicy::Fixed { usd_per_kwh } = self.tariff {
            if !usd_per_kwh.is_finite() || usd_per_kwh < 0.0 {
                return Err("fixed tariff must be finite and non-negative");
            }
        }
        if !self.install_cost_usd_per_kw.is_finite() || self.install_cost_usd_per_kw < 0.0 {
            return Err("install_cost_usd_per_kw must be finite and non-negative");
        }
        if !self.co2_kg_per_kwh.is_finite() || self.co2_kg_per_kwh < 0.0 {
            return Err("co2_kg_per_kwh must be finite and non-negative");
        }
        Ok(())
    }
}

/// Years until cumulative savings cover the investment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    Years(f64),
    /// The system saves nothing, so it never pays for itself.
    Never,
}

impl Payback {
    #[must_use]
    pub fn years(self) -> Option<f64> {
        match self {
            Payback::Years(years) => Some(years),
            Payback::Never => None,
        }
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years(years) => write!(f, "{years:.1} years"),
            Payback::Never => f.write_str("no payback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialProjection {
    pub total_cost_usd: f64,
    pub annual_savings_usd: f64,
    pub payback: Payback,
    /// Net return over [`ROI_YEARS`] as a fraction of the investment.
    pub roi_25_years: f64,
    pub tariff_usd_per_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    #[serde(rename = "annual_production_kwh", with = "serialize_units::kilowatt_hour")]
    pub annual_production: Energy,
    /// Production as a percentage of consumption.
    pub offset_percent: f64,
    /// Avoided emissions per year.
    #[serde(rename = "co2_reduction_tons", with = "serialize_units::ton")]
    pub co2_reduction: Mass,
}

/// Everything the projector needs from the earlier stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    pub request: SizingRequest,
    pub irradiance: IrradianceProfile,
    pub layout: SystemLayout,
    pub panel_price_usd: f64,
    pub inverter_price_usd: f64,
}

impl ProjectionInput {
    #[must_use]
    pub fn new(
        request: SizingRequest,
        irradiance: IrradianceProfile,
        layout: SystemLayout,
        selection: &Selection,
    ) -> Self {
        Self {
            request,
            irradiance,
            layout,
            panel_price_usd: selection.panel.price_usd,
            inverter_price_usd: selection.inverter.price_usd,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinancialProjector {
    config: FinancialConfig,
}

impl FinancialProjector {
    /// # Errors
    ///
    /// Fails if `config` is invalid.
    pub fn new(config: FinancialConfig) -> Result<Self, InvalidConfig> {
        InvalidConfig::check("financial", config.validate())?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &FinancialConfig {
        &self.config
    }

    /// The electricity rate applied to `request`, in USD per kWh.
    #[must_use]
    pub fn tariff_for(&self, request: &SizingRequest) -> f64 {
        match self.config.tariff {
            TariffPolicy::FromBill => {
                12.0 * request.monthly_bill_usd()
                    / request.annual_consumption().get::<kilowatt_hour>()
            }
            TariffPolicy::Fixed { usd_per_kwh } => usd_per_kwh,
        }
    }

    /// Projects costs and savings for a designed system.
    #[must_use]
    pub fn project(&self, input: &ProjectionInput) -> FinancialProjection {
        let ProjectionInput {
            request,
            irradiance,
            layout,
            panel_price_usd,
            inverter_price_usd,
        } = *input;

        let tariff = self.tariff_for(&request);
        let size_kw = layout.system_size.get::<kilowatt>();
        let production_kwh = irradiance
            .annual_energy(layout.system_size)
            .get::<kilowatt_hour>();
        let consumption_kwh = request.annual_consumption().get::<kilowatt_hour>();

        #[allow(clippy::cast_precision_loss)]
        let panels_cost = layout.panel_count as f64 * panel_price_usd;
        let total_cost =
            panels_cost + self.config.install_cost_usd_per_kw * size_kw + inverter_price_usd;

        let annual_savings = production_kwh.min(consumption_kwh) * tariff;
        let payback = if annual_savings > 0.0 {
            Payback::Years(total_cost / annual_savings)
        } else {
            Payback::Never
        };
        let roi = (annual_savings * ROI_YEARS - total_cost) / total_cost;

        log::debug!(
            "projected ${total_cost:.0} cost, ${annual_savings:.0}/yr savings at ${tariff:.3}/kWh, {payback}"
        );

        FinancialProjection {
            total_cost_usd: total_cost,
            annual_savings_usd: annual_savings,
            payback,
            roi_25_years: roi,
            tariff_usd_per_kwh: tariff,
        }
    }

    /// Annual production, consumption offset, and avoided emissions.
    #[must_use]
    pub fn performance(
        &self,
        request: &SizingRequest,
        irradiance: &IrradianceProfile,
        layout: &SystemLayout,
    ) -> PerformanceMetrics {
        let annual_production = irradiance.annual_energy(layout.system_size);
        let production_kwh = annual_production.get::<kilowatt_hour>();
        let offset = annual_production / request.annual_consumption();

        PerformanceMetrics {
            annual_production,
            offset_percent: offset.value * 100.0,
            co2_reduction: Mass::new::<kilogram>(production_kwh * self.config.co2_kg_per_kwh),
        }
    }
}

impl Model for FinancialProjector {
    type Input = ProjectionInput;
    type Output = FinancialProjection;
    type Error = std::convert::Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(self.project(input))
    }
}
