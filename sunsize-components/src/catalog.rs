//! Read-only equipment catalog.
//!
//! A [`Catalog`] is loaded once (from TOML, JSON, or the built-in data),
//! validated, and then shared by every request. Inverters are kept sorted by
//! rated power so the ceiling match used during sizing is a binary search.

mod inverter;
mod panel;

pub use inverter::InverterSpec;
pub use panel::PanelSpec;

use serde::Deserialize;
use thiserror::Error;
use uom::si::f64::Power;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse TOML catalog")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON catalog")]
    Json(#[from] serde_json::Error),

    #[error("catalog has no {0}")]
    Empty(&'static str),

    #[error("invalid catalog entry `{model}`: {reason}")]
    InvalidEntry { model: String, reason: &'static str },
}

/// Panels and inverters available for a recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    panels: Vec<PanelSpec>,
    inverters: Vec<InverterSpec>,
}

/// On-disk shape of a catalog, before validation.
#[derive(Deserialize)]
struct CatalogFile {
    panels: Vec<PanelSpec>,
    inverters: Vec<InverterSpec>,
}

impl Catalog {
    /// Creates a catalog after validating every entry.
    ///
    /// # Errors
    ///
    /// Fails if either list is empty or any entry has a non-physical rating.
    pub fn new(
        panels: Vec<PanelSpec>,
        mut inverters: Vec<InverterSpec>,
    ) -> Result<Self, CatalogError> {
        if panels.is_empty() {
            return Err(CatalogError::Empty("panels"));
        }
        if inverters.is_empty() {
            return Err(CatalogError::Empty("inverters"));
        }

        for panel in &panels {
            panel.validate().map_err(|reason| CatalogError::InvalidEntry {
                model: panel.model.clone(),
                reason,
            })?;
        }
        for inverter in &inverters {
            inverter
                .validate()
                .map_err(|reason| CatalogError::InvalidEntry {
                    model: inverter.model.clone(),
                    reason,
                })?;
        }

        inverters.sort_by(|a, b| a.rated_power.value.total_cmp(&b.rated_power.value));

        Ok(Self { panels, inverters })
    }

    /// Parses a catalog with `[[panels]]` and `[[inverters]]` tables.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or invalid entries.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.panels, file.inverters)
    }

    /// Parses a catalog with `panels` and `inverters` arrays.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or invalid entries.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::new(file.panels, file.inverters)
    }

    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded data is corrupt.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    #[must_use]
    pub fn panels(&self) -> &[PanelSpec] {
        &self.panels
    }

    /// Inverters in ascending order of rated power.
    #[must_use]
    pub fn inverters(&self) -> &[InverterSpec] {
        &self.inverters
    }

    #[must_use]
    pub fn largest_inverter(&self) -> &InverterSpec {
        // Non-empty by construction.
        &self.inverters[self.inverters.len() - 1]
    }

    /// The smallest inverter whose rating is at least `power`.
    #[must_use]
    pub fn inverter_at_least(&self, power: Power) -> Option<&InverterSpec> {
        let index = self
            .inverters
            .partition_point(|inverter| inverter.rated_power < power);
        self.inverters.get(index)
    }

    /// The panel whose rating is closest to `power`.
    ///
    /// Ties go to the more efficient panel, then to the earlier catalog entry.
    #[must_use]
    pub fn panel_closest_to(&self, power: Power) -> &PanelSpec {
        let distance = |panel: &PanelSpec| (panel.power - power).value.abs();
        let mut best = &self.panels[0];
        for panel in &self.panels[1..] {
            let (d, best_d) = (distance(panel), distance(best));
            if d < best_d || (d == best_d && panel.efficiency_percent > best.efficiency_percent) {
                best = panel;
            }
        }
        best
    }
}
