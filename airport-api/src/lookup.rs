use airport_core::booking::missing_object;
use airport_core::ValidationErrors;
use uuid::Uuid;

use crate::error::AppError;

/// 404 when a looked-up object is absent.
pub fn found<T>(value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::NotFoundError("Not found.".to_string()))
}

/// Records a dangling reference on `field`.
pub fn check_reference<T>(value: &Option<T>, field: &str, id: Uuid, errors: &mut ValidationErrors) {
    if value.is_none() {
        errors.add(field, missing_object(id));
    }
}
