//! Tag repository
//!
//! Tags are pre-existing; this service only looks them up by name.

use sqlx::PgConnection;

use super::DbError;

/// Tag lookups on a borrowed connection
pub struct TagRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TagRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Find the id of the tag with exactly this name.
    ///
    /// If several rows share the name, the first one returned wins.
    pub async fn find_id_by_name(&mut self, name: &str) -> Result<Option<i64>, DbError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM tag WHERE name = $1 LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(id)
    }
}
