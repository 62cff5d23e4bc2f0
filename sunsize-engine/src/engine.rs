use std::sync::Arc;

use rayon::prelude::*;
use sunsize_components::{
    InvalidConfig,
    capacity::CapacityPlanner,
    catalog::{Catalog, CatalogError},
    financial::{FinancialProjector, ProjectionInput},
    irradiance::{IrradianceProvider, IrradianceSource, ResourceTable, TableError},
    layout::LayoutOptimizer,
    request::{RawRequest, SizingRequest, Validator},
    selector::ComponentSelector,
};
use sunsize_core::Model;
use thiserror::Error;
use uom::si::power::kilowatt;

use crate::{EngineConfig, SizingError, SizingResult};

/// Errors raised while assembling an engine from built-in data.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to load catalog")]
    Catalog(#[from] CatalogError),

    #[error("failed to load resource table")]
    Table(#[from] TableError),

    #[error(transparent)]
    Config(#[from] InvalidConfig),
}

/// Runs the sizing pipeline.
///
/// An engine is built once and shared; every method takes `&self`. The only
/// mutable state is the irradiance cache, which is internally synchronized.
#[derive(Debug)]
pub struct SizingEngine {
    catalog: Arc<Catalog>,
    irradiance: IrradianceProvider,
    planner: CapacityPlanner,
    layout: LayoutOptimizer,
    selector: ComponentSelector,
    projector: FinancialProjector,
}

impl SizingEngine {
    /// Assembles an engine over `catalog` and `table`.
    ///
    /// # Errors
    ///
    /// Fails if any section of `config` is invalid.
    pub fn new(
        config: EngineConfig,
        catalog: Catalog,
        table: ResourceTable,
    ) -> Result<Self, InvalidConfig> {
        config.validate()?;

        log::info!(
            "sizing engine ready: {} panels, {} inverters, resource table `{}`",
            catalog.panels().len(),
            catalog.inverters().len(),
            table.name()
        );

        let catalog = Arc::new(catalog);
        Ok(Self {
            irradiance: IrradianceProvider::new(table, config.irradiance)?,
            planner: CapacityPlanner::new(config.capacity)?,
            layout: LayoutOptimizer::new(config.layout, Arc::clone(&catalog)),
            selector: ComponentSelector::new(config.selector, Arc::clone(&catalog))?,
            projector: FinancialProjector::new(config.financial)?,
            catalog,
        })
    }

    /// Assembles an engine over the built-in catalog and resource table.
    ///
    /// # Errors
    ///
    /// Fails if `config` is invalid or the embedded data is corrupt.
    pub fn with_builtin_data(config: EngineConfig) -> Result<Self, SetupError> {
        let engine = Self::new(config, Catalog::builtin()?, ResourceTable::builtin()?)?;
        Ok(engine)
    }

    /// Consults `source` for exact-cell irradiance before the resource table.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn IrradianceSource>) -> Self {
        self.irradiance = self.irradiance.with_source(source);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn irradiance(&self) -> &IrradianceProvider {
        &self.irradiance
    }

    /// Validates form input and sizes it.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. Invalid input is reported before any
    /// irradiance lookup.
    pub fn size(&self, raw: &RawRequest) -> Result<SizingResult, SizingError> {
        let request = Validator.call(raw)?;
        self.size_request(&request)
    }

    /// Sizes an already-validated request.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    pub fn size_request(&self, request: &SizingRequest) -> Result<SizingResult, SizingError> {
        let (irradiance, panel) = rayon::join(
            || self.irradiance.lookup(request.latitude(), request.longitude()),
            || self.selector.reference_panel(),
        );
        let irradiance = irradiance?;

        let required_capacity = self.planner.plan(request, &irradiance)?;
        let layout = self
            .layout
            .optimize(required_capacity, panel, request.available_area())?;

        // Same ceiling rule as the layout search, so the limits it checked hold.
        let selection = self.selector.select(layout.system_size)?;

        let projection = ProjectionInput::new(*request, irradiance, layout, &selection);
        let financial = self.projector.project(&projection);
        let performance = self.projector.performance(request, &irradiance, &layout);

        log::debug!(
            "sized ({}, {}): {:.2} kW, {} panels, {}",
            request.latitude(),
            request.longitude(),
            layout.system_size.get::<kilowatt>(),
            layout.panel_count,
            selection.inverter
        );

        Ok(SizingResult {
            request: *request,
            irradiance,
            required_capacity,
            layout,
            panel: selection.panel,
            inverter: selection.inverter,
            financial,
            performance,
        })
    }

    /// Sizes many requests in parallel, preserving their order.
    #[must_use]
    pub fn size_batch(&self, requests: &[RawRequest]) -> Vec<Result<SizingResult, SizingError>> {
        requests.par_iter().map(|raw| self.size(raw)).collect()
    }
}

impl Model for SizingEngine {
    type Input = RawRequest;
    type Output = SizingResult;
    type Error = SizingError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.size(input)
    }
}
