//! Panel count and series/parallel layout search.
//!
//! The search walks panel counts upward from the smallest count that meets
//! the required capacity. For each count the inverter is ceiling-matched to
//! the resulting system size, and only string arrangements within that
//! inverter's DC voltage and current limits are considered. Nothing is ever
//! truncated to fit: if no arrangement fits the available area the request
//! fails with [`AreaInsufficientError`].

use std::{cmp::Reverse, sync::Arc};

use serde::{Deserialize, Serialize};
use sunsize_core::Model;
use thiserror::Error;
use uom::si::{
    area::square_meter,
    f64::{Area, Power},
    power::kilowatt,
};

use crate::{
    catalog::{Catalog, InverterSpec, PanelSpec},
    selector::{NoCompatibleInverterError, match_inverter},
    serialize_units,
};

/// How to rank feasible layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPreference {
    /// Smallest feasible panel count, then the most balanced strings.
    #[default]
    FewestPanels,
    /// Most balanced strings up to the area bound, then the smallest count.
    SquarestLayout,
}

/// Layout optimizer configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub preference: LayoutPreference,
}

/// A panel array: `series_count` panels per string, `parallel_count` strings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemLayout {
    pub panel_count: usize,
    pub series_count: usize,
    pub parallel_count: usize,
    #[serde(rename = "system_size_kw", with = "serialize_units::kilowatt")]
    pub system_size: Power,
    #[serde(rename = "total_area_m2", with = "serialize_units::square_meter")]
    pub total_area: Area,
}

/// The required capacity does not fit on the available area.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error(
    "{required_panels} panels needed but {available_area_m2:.1} m² fits at most {max_panels} \
     ({panel_area_m2:.2} m² each) in a valid configuration"
)]
pub struct AreaInsufficientError {
    pub required_panels: usize,
    pub max_panels: usize,
    pub available_area_m2: f64,
    pub panel_area_m2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LayoutError {
    #[error(transparent)]
    AreaInsufficient(#[from] AreaInsufficientError),

    #[error(transparent)]
    NoCompatibleInverter(#[from] NoCompatibleInverterError),
}

/// Input to the [`Model`] form of the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInput {
    pub required: Power,
    pub panel: PanelSpec,
    pub available_area: Area,
}

/// Finds the panel count and string arrangement for a required capacity.
#[derive(Debug, Clone)]
pub struct LayoutOptimizer {
    config: LayoutConfig,
    catalog: Arc<Catalog>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    panels: usize,
    series: usize,
    parallel: usize,
}

impl Candidate {
    fn imbalance(&self) -> usize {
        self.series.abs_diff(self.parallel)
    }
}

impl LayoutOptimizer {
    #[must_use]
    pub fn new(config: LayoutConfig, catalog: Arc<Catalog>) -> Self {
        Self { config, catalog }
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `panel`s to deliver at least `required` within `available_area`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::AreaInsufficient`] if no valid layout fits the area.
    /// - [`LayoutError::NoCompatibleInverter`] if the search reaches a size
    ///   no catalog inverter can handle before finding a valid layout.
    pub fn optimize(
        &self,
        required: Power,
        panel: &PanelSpec,
        available_area: Area,
    ) -> Result<SystemLayout, LayoutError> {
        let min_panels = min_panel_count(required, panel);
        // One past the largest inverter is as far as the search can go.
        let largest = self.catalog.largest_inverter().rated_power;
        let search_limit = min_panels.max(panel_count_for(largest, panel).saturating_add(1));
        let max_panels = max_panels_by_area(panel.area(), available_area, search_limit);

        let insufficient = AreaInsufficientError {
            required_panels: min_panels,
            max_panels,
            available_area_m2: available_area.get::<square_meter>(),
            panel_area_m2: panel.area().get::<square_meter>(),
        };
        if max_panels < min_panels {
            return Err(insufficient.into());
        }

        let mut best: Option<Candidate> = None;
        for panels in min_panels..=max_panels {
            let system_size = panel.power * count_as_f64(panels);
            let inverter = match match_inverter(&self.catalog, system_size) {
                Ok(inverter) => inverter,
                // Larger counts need larger inverters, so nothing further fits.
                Err(error) if best.is_none() => return Err(error.into()),
                Err(_) => break,
            };

            let Some(candidate) = most_balanced(panels, panel, inverter) else {
                continue;
            };

            match self.config.preference {
                LayoutPreference::FewestPanels => {
                    best = Some(candidate);
                    break;
                }
                LayoutPreference::SquarestLayout => {
                    let key = |c: &Candidate| (c.imbalance(), c.panels, Reverse(c.series));
                    if best.is_none_or(|b| key(&candidate) < key(&b)) {
                        best = Some(candidate);
                    }
                }
            }
        }

        let Candidate {
            panels,
            series,
            parallel,
        } = best.ok_or(insufficient)?;

        let layout = SystemLayout {
            panel_count: panels,
            series_count: series,
            parallel_count: parallel,
            system_size: panel.power * count_as_f64(panels),
            total_area: panel.area() * count_as_f64(panels),
        };
        log::debug!(
            "layout {} panels ({}s x {}p), {:.2} kW on {:.1} m²",
            layout.panel_count,
            layout.series_count,
            layout.parallel_count,
            layout.system_size.get::<kilowatt>(),
            layout.total_area.get::<square_meter>()
        );
        Ok(layout)
    }
}

impl Model for LayoutOptimizer {
    type Input = LayoutInput;
    type Output = SystemLayout;
    type Error = LayoutError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.optimize(input.required, &input.panel, input.available_area)
    }
}

/// `ceil(required / panel power)`, at least one.
fn min_panel_count(required: Power, panel: &PanelSpec) -> usize {
    panel_count_for(required, panel).max(1)
}

/// `ceil(power / panel power)`, saturating at `usize::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn panel_count_for(power: Power, panel: &PanelSpec) -> usize {
    (power / panel.power).value.ceil().max(0.0) as usize
}

/// The largest `n <= limit` with `n * panel_area <= available_area`, computed
/// with the same multiplication used for the layout's total area.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_panels_by_area(panel_area: Area, available_area: Area, limit: usize) -> usize {
    let fits = |n: usize| panel_area * count_as_f64(n) <= available_area;

    let estimate = (available_area / panel_area).value.floor().max(0.0);
    let mut n = if estimate < count_as_f64(limit) {
        estimate as usize
    } else {
        limit
    };
    while let Some(next) = n.checked_add(1).filter(|&next| next <= limit && fits(next)) {
        n = next;
    }
    while n > 0 && !fits(n) {
        n -= 1;
    }
    n
}

/// The factorization `series * parallel == panels` within the inverter's
/// limits with the smallest `|series - parallel|`, ties to more in series.
fn most_balanced(panels: usize, panel: &PanelSpec, inverter: &InverterSpec) -> Option<Candidate> {
    (1..=panels)
        .filter(|series| panels % series == 0)
        .map(|series| Candidate {
            panels,
            series,
            parallel: panels / series,
        })
        .filter(|c| {
            panel.open_circuit_voltage * count_as_f64(c.series) <= inverter.max_input_voltage
                && panel.short_circuit_current * count_as_f64(c.parallel)
                    <= inverter.max_input_current
        })
        .min_by_key(|c| (c.imbalance(), Reverse(c.series)))
}

#[allow(clippy::cast_precision_loss)]
fn count_as_f64(n: usize) -> f64 {
    n as f64
}
