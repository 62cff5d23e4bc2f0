/// A callable model that maps a typed input to a typed output.
///
/// Every stage of the sizing pipeline is a `Model`. Models must be
/// deterministic, always producing the same result for a given input, so a
/// pipeline built from them can be rerun, cached, and tested in isolation.
pub trait Model {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Calls the model with the given input.
    ///
    /// # Errors
    ///
    /// Each model defines its own `Error` type to represent domain-specific failures.
    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    struct Doubler;

    impl Model for Doubler {
        type Input = f64;
        type Output = f64;
        type Error = Infallible;

        fn call(&self, input: &f64) -> Result<f64, Infallible> {
            Ok(input * 2.0)
        }
    }

    #[test]
    fn repeated_calls_agree() {
        let first = Doubler.call(&1.25).unwrap();
        let second = Doubler.call(&1.25).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        approx::assert_relative_eq!(first, 2.5);
    }
}
