//! Serde adapters that read and write `uom` quantities as plain numbers in
//! a fixed display unit.
//!
//! Use from struct fields with `#[serde(with = "crate::serialize_units::watt")]`.
//! The unit is part of the field's contract, so catalogs and reports stay in
//! the units people expect (W, kWh, m²) rather than SI base units.

macro_rules! unit_module {
    ($(#[$doc:meta])* $name:ident, $quantity:ty, $unit:ty) => {
        $(#[$doc])*
        pub mod $name {
            use serde::{Deserialize, Deserializer, Serialize, Serializer};

            pub fn serialize<S>(value: &$quantity, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                value.get::<$unit>().serialize(serializer)
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<$quantity, D::Error>
            where
                D: Deserializer<'de>,
            {
                f64::deserialize(deserializer).map(<$quantity>::new::<$unit>)
            }
        }
    };
}

unit_module!(
    /// Power in watts.
    watt, uom::si::f64::Power, uom::si::power::watt
);
unit_module!(
    /// Power in kilowatts.
    kilowatt, uom::si::f64::Power, uom::si::power::kilowatt
);
unit_module!(
    /// Energy in kilowatt-hours.
    kilowatt_hour, uom::si::f64::Energy, uom::si::energy::kilowatt_hour
);
unit_module!(
    /// Length in meters.
    meter, uom::si::f64::Length, uom::si::length::meter
);
unit_module!(
    /// Area in square meters.
    square_meter, uom::si::f64::Area, uom::si::area::square_meter
);
unit_module!(
    /// Electric potential in volts.
    volt, uom::si::f64::ElectricPotential, uom::si::electric_potential::volt
);
unit_module!(
    /// Electric current in amperes.
    ampere, uom::si::f64::ElectricCurrent, uom::si::electric_current::ampere
);
unit_module!(
    /// Mass in metric tons.
    ton, uom::si::f64::Mass, uom::si::mass::ton
);

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use uom::si::{f64::Power, power::watt};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rated {
        #[serde(with = "super::kilowatt")]
        size: Power,
    }

    #[test]
    fn writes_and_reads_display_units() {
        let rated = Rated {
            size: Power::new::<watt>(7200.0),
        };
        let json = serde_json::to_value(&rated).unwrap();
        approx::assert_relative_eq!(json["size"].as_f64().unwrap(), 7.2);

        let back: Rated = serde_json::from_value(json).unwrap();
        approx::assert_relative_eq!(back.size.get::<watt>(), 7200.0);
    }
}
