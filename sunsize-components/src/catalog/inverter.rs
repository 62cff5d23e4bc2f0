use std::fmt;

use serde::{Deserialize, Serialize};
use sunsize_core::constraint::{NonNegative, StrictlyPositive};
use uom::si::{
    f64::{ElectricCurrent, ElectricPotential, Power},
    power::watt,
};

use crate::serialize_units;

/// A grid-tied string inverter model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterSpec {
    pub brand: String,
    pub model: String,

    /// Rated AC output power.
    #[serde(rename = "rated_power_w", with = "serialize_units::watt")]
    pub rated_power: Power,

    /// Conversion efficiency in percent.
    pub efficiency_percent: f64,

    pub price_usd: f64,

    /// Highest DC voltage a series string may present.
    #[serde(rename = "max_input_voltage_v", with = "serialize_units::volt")]
    pub max_input_voltage: ElectricPotential,

    /// Highest combined DC current of all parallel strings.
    #[serde(rename = "max_input_current_a", with = "serialize_units::ampere")]
    pub max_input_current: ElectricCurrent,
}

impl InverterSpec {
    /// Checks that every rating is physically meaningful.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if StrictlyPositive::new(self.rated_power.get::<watt>()).is_err() {
            return Err("rated power must be positive");
        }
        if !(self.efficiency_percent > 0.0 && self.efficiency_percent <= 100.0) {
            return Err("efficiency must be within (0, 100] percent");
        }
        if NonNegative::new(self.price_usd).is_err() {
            return Err("price must not be negative");
        }
        if StrictlyPositive::new(self.max_input_voltage.value).is_err() {
            return Err("max input voltage must be positive");
        }
        if StrictlyPositive::new(self.max_input_current.value).is_err() {
            return Err("max input current must be positive");
        }
        Ok(())
    }
}

impl fmt::Display for InverterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.0}W, {:.1}%)",
            self.brand,
            self.model,
            self.rated_power.get::<watt>(),
            self.efficiency_percent,
        )
    }
}
