//! Customer-tag association repository

use sqlx::PgConnection;

use super::DbError;

/// Association inserts on a borrowed connection
pub struct CustomerTagRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CustomerTagRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Link one customer to one tag.
    pub async fn insert(&mut self, customer_id: i64, tag_id: i64) -> Result<(), DbError> {
        sqlx::query("INSERT INTO customer_tags (customer_id, tag_id) VALUES ($1, $2)")
            .bind(customer_id)
            .bind(tag_id)
            .execute(&mut *self.conn)
            .await
            .map_err(DbError::classify)?;
        Ok(())
    }
}
