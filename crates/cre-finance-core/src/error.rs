use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CreFinanceError {
    /// Shorthand for the most common validation failure.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        CreFinanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Arithmetic on `field` left the 96-bit decimal range.
    pub fn out_of_range(field: &str) -> Self {
        Self::invalid(field, "Value is outside the representable decimal range")
    }
}

impl From<serde_json::Error> for CreFinanceError {
    fn from(e: serde_json::Error) -> Self {
        CreFinanceError::SerializationError(e.to_string())
    }
}

impl From<csv::Error> for CreFinanceError {
    fn from(e: csv::Error) -> Self {
        CreFinanceError::SerializationError(e.to_string())
    }
}
