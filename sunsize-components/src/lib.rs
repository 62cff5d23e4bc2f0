//! The stages of the Sunsize pipeline.
//!
//! Each stage is a [`sunsize_core::Model`] with its own input, output, and
//! error type. Stages are leaf-first: [`request`] validation, [`irradiance`]
//! lookup, [`capacity`] planning, [`layout`] optimization, [`selector`]
//! component matching, and [`financial`] projection. [`catalog`] holds the
//! read-only equipment data and [`bill`] defines the bill-extraction seam.

pub mod bill;
pub mod capacity;
pub mod catalog;
mod error;
pub mod financial;
pub mod interpolation;
pub mod irradiance;
pub mod layout;
pub mod request;
pub mod selector;
pub mod serialize_units;

pub use error::InvalidConfig;
