use serde::{Deserialize, Serialize};
use sunsize_components::{
    InvalidConfig, capacity::CapacityConfig, financial::FinancialConfig,
    irradiance::IrradianceConfig, layout::LayoutConfig, selector::SelectorConfig,
};
use thiserror::Error;

/// Configuration for every pipeline stage.
///
/// Each section defaults independently, so a TOML file only needs the
/// values it changes:
///
/// ```toml
/// [capacity]
/// oversize_factor = 1.1
///
/// [financial.tariff]
/// kind = "fixed"
/// usd_per_kwh = 0.19
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub irradiance: IrradianceConfig,
    pub capacity: CapacityConfig,
    pub layout: LayoutConfig,
    pub selector: SelectorConfig,
    pub financial: FinancialConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}

impl EngineConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, unknown sections, or invalid values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first section that fails validation.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let sections = [
            ("irradiance", self.irradiance.validate()),
            ("capacity", self.capacity.validate()),
            ("selector", self.selector.validate()),
            ("financial", self.financial.validate()),
        ];
        for (section, result) in sections {
            result.map_err(|reason| InvalidConfig { section, reason })?;
        }
        Ok(())
    }
}
