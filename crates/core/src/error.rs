use thiserror::Error;

/// Failure kinds surfaced by allocation and amount computations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// Missing or unsupported input field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No matrix row for an otherwise valid key combination.
    #[error("rule not found: {0}")]
    RuleNotFound(String),

    /// Division by zero, overflow, or an undefined exponentiation.
    #[error("math error: {0}")]
    MathError(String),

    /// A rule table or catalog resource is missing or malformed.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),
}

impl AllocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationError::InvalidInput(_) => "invalid_input",
            AllocationError::RuleNotFound(_) => "rule_not_found",
            AllocationError::MathError(_) => "math_error",
            AllocationError::DataUnavailable(_) => "data_unavailable",
        }
    }

    /// Caller-fixable errors (400-class). The rest point at degenerate input
    /// combinations or broken configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AllocationError::InvalidInput(_) | AllocationError::RuleNotFound(_)
        )
    }
}
