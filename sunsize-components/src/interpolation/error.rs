use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterpError {
    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),

    #[error("axis `{axis}` needs at least two finite, strictly increasing points")]
    InvalidAxis { axis: &'static str },

    #[error("grid has shape {actual:?}, expected {expected:?}")]
    Shape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("point ({x}, {y}) lies outside the grid")]
    OutOfBounds { x: f64, y: f64 },

    #[error("no data at grid point ({x}, {y})")]
    MissingData { x: f64, y: f64 },
}
