use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("feed row {row}: {message}")]
    MalformedRow { row: usize, message: String },
    #[error("duplicate {level} id `{id}` in feed")]
    DuplicateId { level: &'static str, id: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn malformed_row(row: usize, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            message: message.into(),
        }
    }

    pub fn duplicate_id(level: &'static str, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            level,
            id: id.into(),
        }
    }
}
