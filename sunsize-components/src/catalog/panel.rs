use std::fmt;

use serde::{Deserialize, Serialize};
use sunsize_core::constraint::StrictlyPositive;
use uom::si::{
    f64::{Area, ElectricCurrent, ElectricPotential, Length, Power},
    length::meter,
    power::watt,
};

use crate::serialize_units;

/// A solar panel model.
///
/// Catalog files spell out the unit in each key (`power_w`, `length_m`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub brand: String,
    pub model: String,

    /// Rated power at standard test conditions.
    #[serde(rename = "power_w", with = "serialize_units::watt")]
    pub power: Power,

    /// Module efficiency in percent.
    pub efficiency_percent: f64,

    #[serde(rename = "length_m", with = "serialize_units::meter")]
    pub length: Length,

    #[serde(rename = "width_m", with = "serialize_units::meter")]
    pub width: Length,

    pub price_usd: f64,

    /// Open-circuit voltage; bounds how many panels a series string may hold.
    #[serde(rename = "open_circuit_voltage_v", with = "serialize_units::volt")]
    pub open_circuit_voltage: ElectricPotential,

    /// Short-circuit current; bounds how many strings may run in parallel.
    #[serde(rename = "short_circuit_current_a", with = "serialize_units::ampere")]
    pub short_circuit_current: ElectricCurrent,
}

impl PanelSpec {
    /// Footprint of one panel.
    #[must_use]
    pub fn area(&self) -> Area {
        self.length * self.width
    }

    /// Checks that every rating is physically meaningful.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if StrictlyPositive::new(self.power.get::<watt>()).is_err() {
            return Err("power must be positive");
        }
        if !(self.efficiency_percent > 0.0 && self.efficiency_percent <= 100.0) {
            return Err("efficiency must be within (0, 100] percent");
        }
        if StrictlyPositive::new(self.length.get::<meter>()).is_err()
            || StrictlyPositive::new(self.width.get::<meter>()).is_err()
        {
            return Err("dimensions must be positive");
        }
        if StrictlyPositive::new(self.price_usd).is_err() {
            return Err("price must be positive");
        }
        if StrictlyPositive::new(self.open_circuit_voltage.value).is_err() {
            return Err("open-circuit voltage must be positive");
        }
        if StrictlyPositive::new(self.short_circuit_current.value).is_err() {
            return Err("short-circuit current must be positive");
        }
        Ok(())
    }
}

impl fmt::Display for PanelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.0}W, {:.1}%, {:.2}m × {:.2}m)",
            self.brand,
            self.model,
            self.power.get::<watt>(),
            self.efficiency_percent,
            self.length.get::<meter>(),
            self.width.get::<meter>(),
        )
    }
}
