//! Bilinear interpolation over a regular grid that may have gaps.

mod error;

pub use error::InterpError;

use ndarray::{Array1, Array2};
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp2DOwned, Interpolator},
    strategy::Linear,
};
use sunsize_core::Model;

/// A 2-D linear interpolator over `(x, y)` grid points, some of which may
/// have no data.
///
/// A query is answered from the (up to) four grid points surrounding it.
/// Grid points that carry zero weight (because the query lies exactly on a
/// grid line) are not consulted, so a query on a known grid point returns
/// that point's value even if its neighbors are missing. If any grid point
/// with nonzero weight is missing, or the query lies outside the grid, the
/// query fails rather than extrapolating.
pub struct Interp2D {
    interp: Interp2DOwned<f64, Linear>,
    x: Vec<f64>,
    y: Vec<f64>,
    known: Array2<bool>,
    values: Array2<f64>,
}

impl std::fmt::Debug for Interp2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interp2D")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("known", &self.known)
            .finish_non_exhaustive()
    }
}

impl Interp2D {
    /// Creates an interpolator from grid axes and gridded values.
    ///
    /// # Arguments
    ///
    /// * `x` - Grid coordinates along the first axis, strictly increasing.
    /// * `y` - Grid coordinates along the second axis, strictly increasing.
    /// * `f_xy` - Values with shape `(x.len(), y.len())`; `None` marks a grid
    ///   point without data.
    ///
    /// # Errors
    ///
    /// Returns an error if an axis is too short, unsorted, or non-finite, if
    /// the value grid has the wrong shape, or if a known value is non-finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use sunsize_components::interpolation::Interp2D;
    ///
    /// let interp = Interp2D::new(
    ///     array![0., 1.],
    ///     array![0., 1.],
    ///     array![[Some(0.0), Some(0.4)], [Some(0.2), None]],
    /// ).unwrap();
    ///
    /// assert_eq!(interp.interpolate([0.0, 1.0]).unwrap(), 0.4);
    /// assert!(interp.interpolate([0.5, 0.5]).is_err());
    /// ```
    pub fn new(
        x: Array1<f64>,
        y: Array1<f64>,
        f_xy: Array2<Option<f64>>,
    ) -> Result<Self, InterpError> {
        validate_axis("x", &x)?;
        validate_axis("y", &y)?;

        let expected = (x.len(), y.len());
        if f_xy.dim() != expected {
            return Err(InterpError::Shape {
                expected,
                actual: f_xy.dim(),
            });
        }

        if let Some(((i, j), _)) = f_xy
            .indexed_iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
        {
            return Err(InterpError::MissingData { x: x[i], y: y[j] });
        }

        let known = f_xy.map(Option::is_some);
        let values = f_xy.map(|value| value.unwrap_or(0.0));
        let interp = Interp2DOwned::new(
            x.clone(),
            y.clone(),
            values.clone(),
            Linear,
            Extrapolate::Error,
        )?;

        Ok(Self {
            interp,
            x: x.to_vec(),
            y: y.to_vec(),
            known,
            values,
        })
    }

    /// Interpolates at `[x, y]`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::OutOfBounds`] outside the grid and
    /// [`InterpError::MissingData`] if a contributing grid point has no data.
    pub fn interpolate(&self, point: [f64; 2]) -> Result<f64, InterpError> {
        let [x, y] = point;
        let (Some((i0, i1)), Some((j0, j1))) = (bracket(&self.x, x), bracket(&self.y, y)) else {
            return Err(InterpError::OutOfBounds { x, y });
        };

        for (i, j) in [(i0, j0), (i0, j1), (i1, j0), (i1, j1)] {
            if !self.known[(i, j)] {
                return Err(InterpError::MissingData {
                    x: self.x[i],
                    y: self.y[j],
                });
            }
        }

        if i0 == i1 && j0 == j1 {
            return Ok(self.values[(i0, j0)]);
        }

        Ok(self.interp.interpolate(&point)?)
    }
}

impl Model for Interp2D {
    type Input = [f64; 2];
    type Output = f64;
    type Error = InterpError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.interpolate(*input)
    }
}

fn validate_axis(axis: &'static str, values: &Array1<f64>) -> Result<(), InterpError> {
    let valid = values.len() >= 2
        && values.iter().all(|v| v.is_finite())
        && values.iter().zip(values.iter().skip(1)).all(|(a, b)| a < b);
    if valid {
        Ok(())
    } else {
        Err(InterpError::InvalidAxis { axis })
    }
}

/// Indices of the grid points with nonzero weight along one axis.
///
/// Returns `(i, i)` when `value` sits exactly on a grid coordinate.
fn bracket(axis: &[f64], value: f64) -> Option<(usize, usize)> {
    let (first, last) = (axis[0], axis[axis.len() - 1]);
    if !(first..=last).contains(&value) {
        return None;
    }

    let upper = axis.partition_point(|&v| v < value);
    if axis[upper] == value {
        Some((upper, upper))
    } else {
        Some((upper - 1, upper))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn full_grid() -> Interp2D {
        Interp2D::new(
            array![0., 1., 2.],
            array![0., 1., 2.],
            array![
                [Some(0.0), Some(0.4), Some(0.8)],
                [Some(0.2), Some(0.6), Some(1.0)],
                [Some(0.4), Some(0.8), Some(1.2)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn bilinear_matches_expected_value() {
        let interp = full_grid();
        assert_relative_eq!(interp.interpolate([1.5, 1.5]).unwrap(), 0.9);
        assert_relative_eq!(interp.call(&[0.25, 0.5]).unwrap(), 0.25);
    }

    #[test]
    fn grid_points_return_exact_values() {
        let interp = full_grid();
        assert_eq!(interp.interpolate([2.0, 1.0]).unwrap(), 0.8);
        assert_eq!(interp.interpolate([0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn outside_grid_is_an_error() {
        let interp = full_grid();
        assert!(matches!(
            interp.interpolate([-0.1, 1.0]),
            Err(InterpError::OutOfBounds { .. })
        ));
        assert!(matches!(
            interp.interpolate([1.0, f64::NAN]),
            Err(InterpError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn gaps_only_matter_when_they_contribute() {
        let interp = Interp2D::new(
            array![0., 1., 2.],
            array![0., 1.],
            array![[Some(1.0), Some(2.0)], [Some(3.0), Some(4.0)], [None, None]],
        )
        .unwrap();

        assert_relative_eq!(interp.interpolate([0.5, 0.5]).unwrap(), 2.5);
        // On the x = 1 grid line the missing row carries zero weight.
        assert_relative_eq!(interp.interpolate([1.0, 0.5]).unwrap(), 3.5);
        assert!(matches!(
            interp.interpolate([1.5, 0.5]),
            Err(InterpError::MissingData { x, .. }) if x == 2.0
        ));
    }

    #[test]
    fn rejects_bad_grids() {
        assert!(matches!(
            Interp2D::new(array![0.], array![0., 1.], array![[Some(1.0), Some(1.0)]]),
            Err(InterpError::InvalidAxis { axis: "x" })
        ));
        assert!(matches!(
            Interp2D::new(
                array![0., 1.],
                array![1., 0.],
                array![[Some(1.0), Some(1.0)], [Some(1.0), Some(1.0)]]
            ),
            Err(InterpError::InvalidAxis { axis: "y" })
        ));
        assert!(matches!(
            Interp2D::new(array![0., 1.], array![0., 1.], array![[Some(1.0), Some(1.0)]]),
            Err(InterpError::Shape { .. })
        ));
    }
}
