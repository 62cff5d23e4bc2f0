use std::cmp::Ordering;

use num_traits::{One, Zero};

use super::{Constrained, Constraint, ConstraintError};

/// Types with well-defined zero and one bounds.
pub trait UnitBounds: PartialOrd + Zero + One {}

impl UnitBounds for f32 {}
impl UnitBounds for f64 {}

/// Marker type enforcing the closed unit interval: `0 ≤ x ≤ 1`.
///
/// Used for confidence scores.
///
/// # Examples
///
/// ```
/// use sunsize_core::constraint::UnitInterval;
///
/// assert!(UnitInterval::new(0.0).is_ok());
/// assert!(UnitInterval::new(1.0).is_ok());
/// assert!(UnitInterval::new(1.01).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitInterval;

impl UnitInterval {
    /// Constructs `Constrained<T, UnitInterval>` if `0 ≤ value ≤ 1`.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than zero.
    /// - [`ConstraintError::AboveMaximum`] if greater than one.
    /// - [`ConstraintError::NotANumber`] if comparison is undefined (e.g., NaN).
    pub fn new<T: UnitBounds>(value: T) -> Result<Constrained<T, UnitInterval>, ConstraintError> {
        Constrained::<T, UnitInterval>::new(value)
    }
}

impl<T: UnitBounds> Constraint<T> for UnitInterval {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}

/// Marker type enforcing the left-open unit interval: `0 < x ≤ 1`.
///
/// Derating factors live here: a system cannot deliver more than its
/// nameplate rating, and a factor of zero would mean no production at all.
///
/// # Examples
///
/// ```
/// use sunsize_core::constraint::UnitIntervalLeftOpen;
///
/// assert!(UnitIntervalLeftOpen::new(0.8).is_ok());
/// assert!(UnitIntervalLeftOpen::new(1.0).is_ok());
/// assert!(UnitIntervalLeftOpen::new(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitIntervalLeftOpen;

impl UnitIntervalLeftOpen {
    /// Constructs `Constrained<T, UnitIntervalLeftOpen>` if `0 < value ≤ 1`.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than or equal to zero.
    /// - [`ConstraintError::AboveMaximum`] if greater than one.
    /// - [`ConstraintError::NotANumber`] if comparison is undefined (e.g., NaN).
    pub fn new<T: UnitBounds>(
        value: T,
    ) -> Result<Constrained<T, UnitIntervalLeftOpen>, ConstraintError> {
        Constrained::<T, UnitIntervalLeftOpen>::new(value)
    }
}

impl<T: UnitBounds> Constraint<T> for UnitIntervalLeftOpen {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less | Ordering::Equal), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}
