use thiserror::Error;

/// Reasons an interpreted filter cannot be evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Filter condition has an empty field name")]
    EmptyField,

    #[error("Operator {operator} on '{field}' requires a value")]
    MissingValue { field: String, operator: String },

    #[error("Operator {operator} on '{field}' requires an array value")]
    ExpectedArray { field: String, operator: String },

    #[error("Operator {operator} on '{field}' requires a string pattern")]
    ExpectedString { field: String, operator: String },
}
