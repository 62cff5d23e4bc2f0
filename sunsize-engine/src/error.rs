use sunsize_components::{
    capacity::InfeasibleCapacityError,
    irradiance::LocationUnresolvedError,
    layout::{AreaInsufficientError, LayoutError},
    request::{Field, InvalidInputError},
    selector::NoCompatibleInverterError,
};
use thiserror::Error;

/// A request that could not be sized.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error(transparent)]
    LocationUnresolved(#[from] LocationUnresolvedError),

    #[error(transparent)]
    InfeasibleCapacity(#[from] InfeasibleCapacityError),

    #[error(transparent)]
    AreaInsufficient(#[from] AreaInsufficientError),

    #[error(transparent)]
    NoCompatibleInverter(#[from] NoCompatibleInverterError),
}

impl From<LayoutError> for SizingError {
    fn from(error: LayoutError) -> Self {
        match error {
            LayoutError::AreaInsufficient(error) => error.into(),
            LayoutError::NoCompatibleInverter(error) => error.into(),
        }
    }
}

/// What the user can do about a [`SizingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Fix the named form field.
    CorrectField(Field),
    /// Try another location; no resource data covers this one.
    AdjustCoordinates,
    /// Relax the area or consumption constraints.
    AdjustConstraints,
    /// The system is beyond what the calculator recommends.
    ContactProfessional,
}

impl SizingError {
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            SizingError::InvalidInput(error) => Recovery::CorrectField(error.field),
            SizingError::LocationUnresolved(_) => Recovery::AdjustCoordinates,
            SizingError::InfeasibleCapacity(InfeasibleCapacityError::NonPositive { .. }) => {
                Recovery::CorrectField(Field::AnnualConsumption)
            }
            SizingError::AreaInsufficient(_) => Recovery::AdjustConstraints,
            SizingError::InfeasibleCapacity(InfeasibleCapacityError::ExceedsMaximum { .. })
            | SizingError::NoCompatibleInverter(_) => Recovery::ContactProfessional,
        }
    }
}
