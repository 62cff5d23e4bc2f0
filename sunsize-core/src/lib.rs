//! Core building blocks shared by every stage of the Sunsize pipeline.
//!
//! - [`Model`]: a deterministic, typed input-to-output computation.
//! - [`constraint`]: numeric invariants checked once at construction.

pub mod constraint;
mod model;

pub use model::Model;
