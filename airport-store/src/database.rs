use airport_core::CoreError;
use sqlx::postgres::{PgDatabaseError, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};
use crate::constraints;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// PostgreSQL-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pub pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Translates a failed INSERT/UPDATE into a domain error.
pub(crate) fn write_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or_default();
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return constraints::unique_violation(constraint),
            Some(FOREIGN_KEY_VIOLATION) => {
                let pk = db_err
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.detail())
                    .and_then(constraints::referenced_key)
                    .unwrap_or_default();
                return constraints::missing_reference(constraint, pk);
            }
            Some(CHECK_VIOLATION) => return constraints::check_violation(constraint),
            _ => {}
        }
    }
    internal(err)
}

/// Translates a failed DELETE; a foreign key hit means the row is in use.
pub(crate) fn delete_error(entity: &str, err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return constraints::still_referenced(entity, db_err.constraint().unwrap_or_default());
        }
    }
    internal(err)
}

pub(crate) fn internal(err: sqlx::Error) -> CoreError {
    error!(error = %err, "Database error");
    CoreError::Internal(err.to_string())
}
