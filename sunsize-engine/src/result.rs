use std::fmt;

use serde::Serialize;
use sunsize_components::{
    catalog::{InverterSpec, PanelSpec},
    financial::{FinancialProjection, PerformanceMetrics},
    irradiance::IrradianceProfile,
    layout::SystemLayout,
    request::SizingRequest,
    serialize_units,
};
use uom::si::{area::square_meter, energy::kilowatt_hour, f64::Power, mass::ton, power::kilowatt};

/// A complete recommendation, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingResult {
    pub request: SizingRequest,
    pub irradiance: IrradianceProfile,
    /// Nameplate power the layout had to reach.
    #[serde(rename = "required_capacity_kw", with = "serialize_units::kilowatt")]
    pub required_capacity: Power,
    pub layout: SystemLayout,
    pub panel: PanelSpec,
    pub inverter: InverterSpec,
    pub financial: FinancialProjection,
    pub performance: PerformanceMetrics,
}

impl fmt::Display for SizingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SizingResult {
            layout,
            financial,
            performance,
            ..
        } = self;

        writeln!(
            f,
            "{:.2} kW system: {} panels ({} in series x {} in parallel) on {:.1} m²",
            layout.system_size.get::<kilowatt>(),
            layout.panel_count,
            layout.series_count,
            layout.parallel_count,
            layout.total_area.get::<square_meter>(),
        )?;
        writeln!(f, "Panel: {}", self.panel)?;
        writeln!(f, "Inverter: {}", self.inverter)?;
        writeln!(
            f,
            "Investment ${:.0}, saves ${:.0}/year, payback {}, 25-year ROI {:.0}%",
            financial.total_cost_usd,
            financial.annual_savings_usd,
            financial.payback,
            financial.roi_25_years * 100.0,
        )?;
        write!(
            f,
            "Produces {:.0} kWh/year ({:.0}% offset), avoids {:.1} t CO2/year",
            performance.annual_production.get::<kilowatt_hour>(),
            performance.offset_percent,
            performance.co2_reduction.get::<ton>(),
        )
    }
}
