//! Repository implementations for database access
//!
//! Each repository borrows one `PgConnection` and issues plain parameterised
//! statements. Constraint violations are surfaced as dedicated `DbError`
//! variants so callers can tell them apart from connectivity failures.

pub mod customer_tags;
pub mod customers;
pub mod tags;

pub use customer_tags::CustomerTagRepo;
pub use customers::CustomerRepo;
pub use tags::TagRepo;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("duplicate key value violates unique constraint \"{constraint}\"")]
    UniqueViolation { constraint: String },

    #[error("insert violates foreign key constraint \"{constraint}\"")]
    ForeignKeyViolation { constraint: String },
}

impl DbError {
    /// Classify a sqlx error, pulling out constraint violations.
    pub(crate) fn classify(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return Self::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return Self::ForeignKeyViolation { constraint };
            }
        }
        Self::Sqlx(err)
    }
}
