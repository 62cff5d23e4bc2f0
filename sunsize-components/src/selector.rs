//! Panel and inverter selection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sunsize_core::Model;
use thiserror::Error;
use uom::si::{
    f64::Power,
    power::{kilowatt, watt},
};

use crate::{
    InvalidConfig,
    catalog::{Catalog, InverterSpec, PanelSpec},
};

/// Component selector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Panel rating the recommendation aims for, in watts.
    pub reference_panel_w: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            reference_panel_w: 400.0,
        }
    }
}

impl SelectorConfig {
    /// # Errors
    ///
    /// Returns a reason if the reference rating is not positive and finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.reference_panel_w.is_finite() || self.reference_panel_w <= 0.0 {
            return Err("reference_panel_w must be finite and positive");
        }
        Ok(())
    }
}

/// No catalog inverter can handle the requested system size.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("no inverter rated for {requested_kw:.2} kW (largest available: {largest_kw:.2} kW)")]
pub struct NoCompatibleInverterError {
    pub requested_kw: f64,
    pub largest_kw: f64,
}

/// The recommended panel and inverter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub panel: PanelSpec,
    pub inverter: InverterSpec,
}

/// Picks components from a shared catalog.
#[derive(Debug, Clone)]
pub struct ComponentSelector {
    config: SelectorConfig,
    catalog: Arc<Catalog>,
}

impl ComponentSelector {
    /// # Errors
    ///
    /// Fails if `config` is invalid.
    pub fn new(config: SelectorConfig, catalog: Arc<Catalog>) -> Result<Self, InvalidConfig> {
        InvalidConfig::check("selector", config.validate())?;
        Ok(Self { config, catalog })
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The panel whose rating is closest to the reference rating.
    #[must_use]
    pub fn reference_panel(&self) -> &PanelSpec {
        self.catalog
            .panel_closest_to(Power::new::<watt>(self.config.reference_panel_w))
    }

    /// The smallest inverter rated for at least `system_size`.
    ///
    /// # Errors
    ///
    /// Returns [`NoCompatibleInverterError`] if `system_size` exceeds every rating.
    pub fn match_inverter(
        &self,
        system_size: Power,
    ) -> Result<&InverterSpec, NoCompatibleInverterError> {
        match_inverter(&self.catalog, system_size)
    }

    /// Selects the reference panel and the inverter for `system_size`.
    ///
    /// # Errors
    ///
    /// Returns [`NoCompatibleInverterError`] if no inverter is large enough.
    pub fn select(&self, system_size: Power) -> Result<Selection, NoCompatibleInverterError> {
        let inverter = self.match_inverter(system_size)?;
        let panel = self.reference_panel();
        log::debug!("selected {panel} with {inverter}");
        Ok(Selection {
            panel: panel.clone(),
            inverter: inverter.clone(),
        })
    }
}

/// Ceiling match shared by the selector and the layout search.
pub(crate) fn match_inverter(
    catalog: &Catalog,
    system_size: Power,
) -> Result<&InverterSpec, NoCompatibleInverterError> {
    catalog
        .inverter_at_least(system_size)
        .ok_or_else(|| NoCompatibleInverterError {
            requested_kw: system_size.get::<kilowatt>(),
            largest_kw: catalog.largest_inverter().rated_power.get::<kilowatt>(),
        })
}

impl Model for ComponentSelector {
    type Input = Power;
    type Output = Selection;
    type Error = NoCompatibleInverterError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.select(*input)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn selector() -> ComponentSelector {
        ComponentSelector::new(
            SelectorConfig::default(),
            Arc::new(Catalog::builtin().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn selects_reference_panel_and_ceiling_inverter() {
        let selection = selector().select(Power::new::<kilowatt>(7.2)).unwrap();
        assert_eq!(selection.panel.model, "CS3W-400P");
        assert_eq!(selection.inverter.model, "Sunny Boy 7.7-US");
    }

    #[test]
    fn exact_rating_matches() {
        let selector = selector();
        let inverter = selector.match_inverter(Power::new::<watt>(6000.0)).unwrap();
        assert_eq!(inverter.model, "SE6000H");
    }

    #[test]
    fn oversized_system_has_no_inverter() {
        let error = selector()
            .select(Power::new::<kilowatt>(80.0))
            .unwrap_err();
        assert_relative_eq!(error.requested_kw, 80.0);
        assert_relative_eq!(error.largest_kw, 62.0);
    }

    #[test]
    fn reference_rating_is_configurable() {
        let config = SelectorConfig {
            reference_panel_w: 330.0,
        };
        let selector = ComponentSelector::new(config, Arc::new(Catalog::builtin().unwrap())).unwrap();
        assert_relative_eq!(selector.reference_panel().power.get::<watt>(), 330.0);

        let config = SelectorConfig {
            reference_panel_w: f64::NAN,
        };
        assert!(ComponentSelector::new(config, Arc::new(Catalog::builtin().unwrap())).is_err());
    }
}
