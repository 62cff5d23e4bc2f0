//! Sunsize sizing engine.
//!
//! [`SizingEngine`] owns the shared, read-only data (equipment catalog and
//! resource table), the irradiance cache, and one instance of each pipeline
//! stage. It turns form input into a [`SizingResult`]:
//!
//! ```text
//! RawRequest -> validate -> irradiance -> capacity -> layout -> components -> financials
//! ```
//!
//! # Example
//!
//! ```
//! use sunsize_components::request::RawRequest;
//! use sunsize_engine::{EngineConfig, SizingEngine};
//!
//! let engine = SizingEngine::with_builtin_data(EngineConfig::default()).unwrap();
//! let request = RawRequest::new("9000", "120", "45", "40.7128", "-74.0060");
//!
//! let result = engine.size(&request).unwrap();
//! assert_eq!(result.layout.panel_count, 18);
//! ```

mod config;
mod engine;
mod error;
mod result;

pub use config::{ConfigError, EngineConfig};
pub use engine::{SetupError, SizingEngine};
pub use error::{Recovery, SizingError};
pub use result::SizingResult;
