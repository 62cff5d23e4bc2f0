//! Form input and its validated form.
//!
//! A [`RawRequest`] mirrors the calculator form: every field is whatever the
//! user typed (or a number supplied programmatically). [`Validator`] turns it
//! into a [`SizingRequest`], whose fields are guaranteed to be in range for
//! the rest of the pipeline.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use sunsize_core::{
    Model,
    constraint::{Constrained, Constraint, ConstraintError, StrictlyPositive},
};
use thiserror::Error;
use uom::si::{
    area::square_meter,
    energy::kilowatt_hour,
    f64::{Area, Energy},
};

use crate::bill::ConfirmedConsumption;

/// A field of the sizing form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AnnualConsumption,
    MonthlyBill,
    AvailableArea,
    Latitude,
    Longitude,
    OffsetPreference,
}

impl Field {
    /// Human-readable label, matching the form.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Field::AnnualConsumption => "annual electricity consumption (kWh)",
            Field::MonthlyBill => "monthly electricity bill (USD)",
            Field::AvailableArea => "available horizontal area (m²)",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::OffsetPreference => "offset preference",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single unvalidated form value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::Text(value.to_owned())
    }
}

impl From<String> for RawField {
    fn from(value: String) -> Self {
        RawField::Text(value)
    }
}

impl From<f64> for RawField {
    fn from(value: f64) -> Self {
        RawField::Number(value)
    }
}

/// The calculator form as entered by the user.
///
/// Updating a field produces a new value; a `RawRequest` is never edited in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRequest {
    pub annual_consumption: RawField,
    pub monthly_bill: RawField,
    pub available_area: RawField,
    pub latitude: RawField,
    pub longitude: RawField,
    pub offset_preference: RawField,
}

impl RawRequest {
    /// Creates a request from the five required form fields.
    pub fn new(
        annual_consumption: impl Into<RawField>,
        monthly_bill: impl Into<RawField>,
        available_area: impl Into<RawField>,
        latitude: impl Into<RawField>,
        longitude: impl Into<RawField>,
    ) -> Self {
        Self {
            annual_consumption: annual_consumption.into(),
            monthly_bill: monthly_bill.into(),
            available_area: available_area.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            offset_preference: RawField::Empty,
        }
    }

    /// Returns the current value of `field`.
    #[must_use]
    pub fn get(&self, field: Field) -> &RawField {
        match field {
            Field::AnnualConsumption => &self.annual_consumption,
            Field::MonthlyBill => &self.monthly_bill,
            Field::AvailableArea => &self.available_area,
            Field::Latitude => &self.latitude,
            Field::Longitude => &self.longitude,
            Field::OffsetPreference => &self.offset_preference,
        }
    }

    /// Returns a copy of this request with `field` replaced by `value`.
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<RawField>) -> Self {
        let slot = match field {
            Field::AnnualConsumption => &mut self.annual_consumption,
            Field::MonthlyBill => &mut self.monthly_bill,
            Field::AvailableArea => &mut self.available_area,
            Field::Latitude => &mut self.latitude,
            Field::Longitude => &mut self.longitude,
            Field::OffsetPreference => &mut self.offset_preference,
        };
        *slot = value.into();
        self
    }

    /// Fills the consumption field from a bill estimate the user has confirmed.
    #[must_use]
    pub fn with_confirmed_consumption(self, consumption: ConfirmedConsumption) -> Self {
        self.with(Field::AnnualConsumption, consumption.annual_kwh())
    }

    /// Validates every field, see [`Validator`].
    ///
    /// # Errors
    ///
    /// Returns the first invalid field in form order.
    pub fn validate(&self) -> Result<SizingRequest, InvalidInputError> {
        Validator.call(self)
    }
}

/// Why a form field was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidReason {
    #[error("a value is required")]
    Missing,
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("must be greater than zero")]
    NotPositive,
    #[error("must be between {min} and {max}")]
    OutOfRange { min: f64, max: f64 },
}

/// A form field the user must correct.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {reason}")]
pub struct InvalidInputError {
    pub field: Field,
    pub reason: InvalidReason,
}

fn check_degrees(value: f64, limit: f64) -> Result<(), ConstraintError> {
    match (value.partial_cmp(&-limit), value.partial_cmp(&limit)) {
        (None, _) | (_, None) => Err(ConstraintError::NotANumber),
        (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
        (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
        _ => Ok(()),
    }
}

/// Marker type for latitudes in `[-90, 90]` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Latitude;

impl Latitude {
    pub const LIMIT: f64 = 90.0;
}

impl Constraint<f64> for Latitude {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        check_degrees(*value, Self::LIMIT)
    }
}

/// Marker type for longitudes in `[-180, 180]` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Longitude;

impl Longitude {
    pub const LIMIT: f64 = 180.0;
}

impl Constraint<f64> for Longitude {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        check_degrees(*value, Self::LIMIT)
    }
}

/// A validated sizing request.
///
/// Values are stored in form units (kWh, USD, m², degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizingRequest {
    annual_consumption_kwh: Constrained<f64, StrictlyPositive>,
    monthly_bill_usd: Constrained<f64, StrictlyPositive>,
    available_area_m2: Constrained<f64, StrictlyPositive>,
    latitude: Constrained<f64, Latitude>,
    longitude: Constrained<f64, Longitude>,
    offset_preference: Option<Constrained<f64, StrictlyPositive>>,
}

impl SizingRequest {
    /// Builds a request from already-numeric values.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value in form order.
    pub fn new(
        annual_consumption_kwh: f64,
        monthly_bill_usd: f64,
        available_area_m2: f64,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, InvalidInputError> {
        RawRequest::new(
            annual_consumption_kwh,
            monthly_bill_usd,
            available_area_m2,
            latitude,
            longitude,
        )
        .validate()
    }

    #[must_use]
    pub fn annual_consumption(&self) -> Energy {
        Energy::new::<kilowatt_hour>(self.annual_consumption_kwh.get())
    }

    #[must_use]
    pub fn monthly_bill_usd(&self) -> f64 {
        self.monthly_bill_usd.get()
    }

    #[must_use]
    pub fn available_area(&self) -> Area {
        Area::new::<square_meter>(self.available_area_m2.get())
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude.get()
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude.get()
    }

    /// The user's oversize preference, if one was given.
    #[must_use]
    pub fn offset_preference(&self) -> Option<f64> {
        self.offset_preference.map(|p| p.get())
    }
}

/// Parses and bounds-checks a [`RawRequest`].
///
/// Text is trimmed before parsing. Infinite and NaN values are rejected as
/// not-a-number. Fields are checked in form order and the first failure is
/// returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    fn number(field: Field, raw: &RawField) -> Result<Option<f64>, InvalidInputError> {
        let value = match raw {
            RawField::Empty => return Ok(None),
            RawField::Number(value) => *value,
            RawField::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<f64>().map_err(|_| InvalidInputError {
                    field,
                    reason: InvalidReason::NotANumber(trimmed.to_owned()),
                })?
            }
        };

        if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(InvalidInputError {
                field,
                reason: InvalidReason::NotANumber(value.to_string()),
            })
        }
    }

    fn required(field: Field, raw: &RawField) -> Result<f64, InvalidInputError> {
        Self::number(field, raw)?.ok_or(InvalidInputError {
            field,
            reason: InvalidReason::Missing,
        })
    }

    fn positive(
        field: Field,
        value: f64,
    ) -> Result<Constrained<f64, StrictlyPositive>, InvalidInputError> {
        StrictlyPositive::new(value).map_err(|_| InvalidInputError {
            field,
            reason: InvalidReason::NotPositive,
        })
    }

    fn degrees<C: Constraint<f64>>(
        field: Field,
        value: f64,
        limit: f64,
    ) -> Result<Constrained<f64, C>, InvalidInputError> {
        Constrained::new(value).map_err(|_| InvalidInputError {
            field,
            reason: InvalidReason::OutOfRange {
                min: -limit,
                max: limit,
            },
        })
    }
}

impl Model for Validator {
    type Input = RawRequest;
    type Output = SizingRequest;
    type Error = InvalidInputError;

    fn call(&self, input: &RawRequest) -> Result<SizingRequest, InvalidInputError> {
        let consumption = Self::required(Field::AnnualConsumption, &input.annual_consumption)?;
        let annual_consumption_kwh = Self::positive(Field::AnnualConsumption, consumption)?;

        let bill = Self::required(Field::MonthlyBill, &input.monthly_bill)?;
        let monthly_bill_usd = Self::positive(Field::MonthlyBill, bill)?;

        let area = Self::required(Field::AvailableArea, &input.available_area)?;
        let available_area_m2 = Self::positive(Field::AvailableArea, area)?;

        let lat = Self::required(Field::Latitude, &input.latitude)?;
        let latitude = Self::degrees(Field::Latitude, lat, Latitude::LIMIT)?;

        let lng = Self::required(Field::Longitude, &input.longitude)?;
        let longitude = Self::degrees(Field::Longitude, lng, Longitude::LIMIT)?;

        let offset_preference = Self::number(Field::OffsetPreference, &input.offset_preference)?
            .map(|value| Self::positive(Field::OffsetPreference, value))
            .transpose()?;

        Ok(SizingRequest {
            annual_consumption_kwh,
            monthly_bill_usd,
            available_area_m2,
            latitude,
            longitude,
            offset_preference,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn reference() -> RawRequest {
        RawRequest::new("9000", "120", "45", "40.7128", "-74.0060")
    }

    #[test]
    fn parses_form_text() {
        let request = reference().validate().unwrap();
        assert_relative_eq!(request.annual_consumption().get::<kilowatt_hour>(), 9000.0);
        assert_relative_eq!(request.monthly_bill_usd(), 120.0);
        assert_relative_eq!(request.available_area().get::<square_meter>(), 45.0);
        assert_relative_eq!(request.latitude(), 40.7128);
        assert_relative_eq!(request.longitude(), -74.006);
        assert_eq!(request.offset_preference(), None);
    }

    #[test]
    fn trims_whitespace_and_accepts_numbers() {
        let request = reference()
            .with(Field::AvailableArea, "  45.5 ")
            .with(Field::Latitude, 12.5)
            .validate()
            .unwrap();
        assert_relative_eq!(request.available_area().get::<square_meter>(), 45.5);
        assert_relative_eq!(request.latitude(), 12.5);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let error = reference().with(Field::Latitude, "95").validate().unwrap_err();
        assert_eq!(error.field, Field::Latitude);
        assert_eq!(
            error.reason,
            InvalidReason::OutOfRange {
                min: -90.0,
                max: 90.0
            }
        );

        let error = reference().with(Field::Longitude, 200.0).validate().unwrap_err();
        assert_eq!(error.field, Field::Longitude);
        assert!(matches!(error.reason, InvalidReason::OutOfRange { .. }));
    }

    #[test]
    fn accepts_coordinate_bounds() {
        let request = reference()
            .with(Field::Latitude, -90.0)
            .with(Field::Longitude, 180.0)
            .validate()
            .unwrap();
        assert_relative_eq!(request.latitude(), -90.0);
        assert_relative_eq!(request.longitude(), 180.0);
    }

    #[test]
    fn rejects_non_positive_magnitudes() {
        for field in [
            Field::AnnualConsumption,
            Field::MonthlyBill,
            Field::AvailableArea,
        ] {
            for value in ["0", "-5"] {
                let error = reference().with(field, value).validate().unwrap_err();
                assert_eq!(error.field, field);
                assert_eq!(error.reason, InvalidReason::NotPositive);
            }
        }
    }

    #[test]
    fn rejects_missing_and_garbage() {
        let error = reference()
            .with(Field::MonthlyBill, "   ")
            .validate()
            .unwrap_err();
        assert_eq!(error.field, Field::MonthlyBill);
        assert_eq!(error.reason, InvalidReason::Missing);

        let error = reference()
            .with(Field::AnnualConsumption, "9k")
            .validate()
            .unwrap_err();
        assert_eq!(error.reason, InvalidReason::NotANumber("9k".into()));

        for text in ["NaN", "inf", "-infinity"] {
            let error = reference()
                .with(Field::AvailableArea, text)
                .validate()
                .unwrap_err();
            assert_eq!(error.field, Field::AvailableArea);
            assert!(matches!(error.reason, InvalidReason::NotANumber(_)));
        }
    }

    #[test]
    fn reports_first_invalid_field_in_form_order() {
        let error = RawRequest::default().validate().unwrap_err();
        assert_eq!(error.field, Field::AnnualConsumption);

        let error = reference()
            .with(Field::Longitude, "x")
            .with(Field::MonthlyBill, "-1")
            .validate()
            .unwrap_err();
        assert_eq!(error.field, Field::MonthlyBill);
    }

    #[test]
    fn offset_preference_is_optional_but_checked() {
        let request = reference()
            .with(Field::OffsetPreference, "1.2")
            .validate()
            .unwrap();
        assert_eq!(request.offset_preference(), Some(1.2));

        let error = reference()
            .with(Field::OffsetPreference, "0")
            .validate()
            .unwrap_err();
        assert_eq!(error.field, Field::OffsetPreference);
    }

    #[test]
    fn deserializes_mixed_form_payload() {
        let raw: RawRequest = serde_json::from_str(
            r#"{"annual_consumption": "9000", "monthly_bill": 120, "available_area": 45.0,
                "latitude": "40.7128", "longitude": -74.006}"#,
        )
        .unwrap();
        assert_eq!(raw.offset_preference, RawField::Empty);
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn error_message_names_the_field() {
        let error = reference().with(Field::Latitude, "95").validate().unwrap_err();
        assert_eq!(error.to_string(), "invalid latitude: must be between -90 and 90");
    }
}
