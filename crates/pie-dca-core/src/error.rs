use thiserror::Error;

#[derive(Debug, Error)]
pub enum PieError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Name collision: '{name}' already exists in this pie")]
    NameCollision { name: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PieError {
    fn from(e: serde_json::Error) -> Self {
        PieError::SerializationError(e.to_string())
    }
}
