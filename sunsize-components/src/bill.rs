//! Bill-extraction seam.
//!
//! Reading consumption off a photographed or scanned electricity bill is
//! done by an external service behind [`BillExtractor`]. Its answer is only
//! a suggestion: a [`ConsumptionEstimate`] must be accepted or corrected by
//! the user before it becomes a [`ConfirmedConsumption`] that can fill the
//! form.

use std::fmt;

use sunsize_core::constraint::{Constrained, StrictlyPositive, UnitInterval};
use thiserror::Error;

/// Media types a bill can be supplied as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Pdf,
}

impl MediaType {
    /// Maps a MIME type such as `image/jpeg` or `application/pdf`.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(MediaType::Image)
        } else if mime == "application/pdf" {
            Some(MediaType::Pdf)
        } else {
            None
        }
    }
}

/// A bill as picked or photographed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDocument {
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl BillDocument {
    /// # Errors
    ///
    /// Fails if the MIME type is neither an image nor a PDF, or if `bytes` is empty.
    pub fn new(mime: &str, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        let media_type = MediaType::from_mime(mime)
            .ok_or_else(|| ExtractionError::UnsupportedMedia(mime.to_owned()))?;
        if bytes.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        Ok(Self { media_type, bytes })
    }
}

/// Errors reported by a bill extractor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported media type `{0}`")]
    UnsupportedMedia(String),

    #[error("document is empty")]
    EmptyDocument,

    #[error("no consumption figure found on the bill")]
    NotFound,

    #[error("extractor returned an invalid estimate: {0}")]
    InvalidEstimate(&'static str),

    #[error("extraction service failed")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// External service that reads an annual consumption figure off a bill.
pub trait BillExtractor {
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] if no estimate can be produced.
    fn extract(&self, document: &BillDocument) -> Result<ConsumptionEstimate, ExtractionError>;
}

/// An unconfirmed consumption figure with the extractor's confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use = "an estimate must be accepted or amended by the user"]
pub struct ConsumptionEstimate {
    annual_kwh: Constrained<f64, StrictlyPositive>,
    confidence: Constrained<f64, UnitInterval>,
}

impl ConsumptionEstimate {
    /// # Errors
    ///
    /// Fails if the figure is not strictly positive or the confidence is outside `[0, 1]`.
    pub fn new(annual_kwh: f64, confidence: f64) -> Result<Self, ExtractionError> {
        Ok(Self {
            annual_kwh: StrictlyPositive::new(annual_kwh)
                .map_err(|_| ExtractionError::InvalidEstimate("consumption must be positive"))?,
            confidence: UnitInterval::new(confidence)
                .map_err(|_| ExtractionError::InvalidEstimate("confidence must be within [0, 1]"))?,
        })
    }

    /// The suggested annual consumption, for display in the confirmation prompt.
    #[must_use]
    pub fn annual_kwh(&self) -> f64 {
        self.annual_kwh.get()
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence.get()
    }

    /// The user confirmed the value as shown.
    pub fn accept(self) -> ConfirmedConsumption {
        ConfirmedConsumption(self.annual_kwh)
    }

    /// The user replaced the value with their own reading.
    ///
    /// # Errors
    ///
    /// Fails if the corrected value is not strictly positive.
    pub fn amend(self, annual_kwh: f64) -> Result<ConfirmedConsumption, ExtractionError> {
        StrictlyPositive::new(annual_kwh)
            .map(ConfirmedConsumption)
            .map_err(|_| ExtractionError::InvalidEstimate("consumption must be positive"))
    }
}

impl fmt::Display for ConsumptionEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found annual consumption: {:.0} kWh ({:.0}% confidence)",
            self.annual_kwh(),
            self.confidence() * 100.0
        )
    }
}

/// An annual consumption figure confirmed by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmedConsumption(Constrained<f64, StrictlyPositive>);

impl ConfirmedConsumption {
    #[must_use]
    pub fn annual_kwh(&self) -> f64 {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::request::{Field, RawField, RawRequest};

    struct FixedExtractor(f64);

    impl BillExtractor for FixedExtractor {
        fn extract(&self, document: &BillDocument) -> Result<ConsumptionEstimate, ExtractionError> {
            match document.media_type {
                MediaType::Image => ConsumptionEstimate::new(self.0, 0.9),
                MediaType::Pdf => Err(ExtractionError::NotFound),
            }
        }
    }

    #[test]
    fn media_types() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Image));
        assert_eq!(MediaType::from_mime("Application/PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert!(matches!(
            BillDocument::new("text/plain", vec![1]),
            Err(ExtractionError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            BillDocument::new("image/png", Vec::new()),
            Err(ExtractionError::EmptyDocument)
        ));
    }

    #[test]
    fn accepted_estimate_fills_the_form() {
        let document = BillDocument::new("image/jpeg", vec![0xFF, 0xD8]).unwrap();
        let estimate = FixedExtractor(7420.0).extract(&document).unwrap();
        assert_eq!(
            estimate.to_string(),
            "Found annual consumption: 7420 kWh (90% confidence)"
        );

        let form = RawRequest::default().with_confirmed_consumption(estimate.accept());
        assert_eq!(form.get(Field::AnnualConsumption), &RawField::Number(7420.0));
    }

    #[test]
    fn amended_estimate_replaces_the_value() {
        let estimate = ConsumptionEstimate::new(7420.0, 0.4).unwrap();
        let confirmed = estimate.amend(6900.0).unwrap();
        assert_relative_eq!(confirmed.annual_kwh(), 6900.0);
        assert!(estimate.amend(0.0).is_err());
    }

    #[test]
    fn rejects_invalid_estimates() {
        assert!(ConsumptionEstimate::new(-1.0, 0.5).is_err());
        assert!(ConsumptionEstimate::new(5000.0, 1.5).is_err());

        let document = BillDocument::new("application/pdf", vec![b'%']).unwrap();
        assert!(matches!(
            FixedExtractor(5000.0).extract(&document),
            Err(ExtractionError::NotFound)
        ));
    }
}
