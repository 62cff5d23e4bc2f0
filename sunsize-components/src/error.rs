use thiserror::Error;

/// A stage was constructed with a configuration that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid {section} config: {reason}")]
pub struct InvalidConfig {
    pub section: &'static str,
    pub reason: &'static str,
}

impl InvalidConfig {
    pub(crate) fn check(
        section: &'static str,
        validation: Result<(), &'static str>,
    ) -> Result<(), Self> {
        validation.map_err(|reason| Self { section, reason })
    }
}
