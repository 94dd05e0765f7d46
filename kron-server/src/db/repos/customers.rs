//! Customer repository
//!
//! - exists checks: one query per unique column
//! - insert: plain INSERT, unique violations classified
//! - id lookup: re-read by username after insert

use sqlx::PgConnection;

use super::DbError;
use crate::models::NewCustomer;

/// Customer statements on a borrowed connection
pub struct CustomerRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CustomerRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Whether any customer already uses this username.
    pub async fn username_exists(&mut self, username: &str) -> Result<bool, DbError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customer WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(exists)
    }

    /// Whether any customer already uses this email address.
    pub async fn email_exists(&mut self, email: &str) -> Result<bool, DbError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM customer WHERE email = $1)")
                .bind(email)
                .fetch_one(&mut *self.conn)
                .await?;
        Ok(exists)
    }

    /// Insert a customer row, returning the number of affected rows.
    pub async fn insert(&mut self, customer: &NewCustomer) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO customer (username, name, surname, email)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&customer.username)
        .bind(&customer.name)
        .bind(&customer.surname)
        .bind(&customer.email)
        .execute(&mut *self.conn)
        .await
        .map_err(DbError::classify)?;

        Ok(result.rows_affected())
    }

    /// Id of the customer with this username, if one exists.
    pub async fn find_id_by_username(&mut self, username: &str) -> Result<Option<i64>, DbError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM customer WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(id)
    }
}
