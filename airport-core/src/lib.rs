pub mod validation;
pub mod airplane;
pub mod crew;
pub mod countries;
pub mod airport;
pub mod geo;
pub mod route;
pub mod flight;
pub mod order;
pub mod booking;
pub mod user;
pub mod policy;
pub mod filter;
pub mod repository;
pub mod weather;

pub use validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound { entity, id: id.to_string() }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::Validation(errors)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
