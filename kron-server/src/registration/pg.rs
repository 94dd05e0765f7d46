//! PostgreSQL-backed registration store

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use super::{RegistrationError, RegistrationSession, RegistrationStore};
use crate::db::pool;
use crate::db::{CustomerRepo, CustomerTagRepo, DbError, TagRepo};
use crate::models::NewCustomer;

/// Registration store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connections currently checked out of the pool.
    pub fn in_use(&self) -> u32 {
        pool::in_use(&self.pool)
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn acquire(&self) -> Result<Box<dyn RegistrationSession>, RegistrationError> {
        let conn = self.pool.acquire().await.map_err(|e| {
            RegistrationError::Unexpected(format!("could not acquire database connection: {}", e))
        })?;
        Ok(Box::new(PgSession { conn }))
    }

    fn connections_in_use(&self) -> usize {
        self.in_use() as usize
    }
}

/// One pooled connection; returned to the pool when dropped.
struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl RegistrationSession for PgSession {
    async fn find_tag_id(&mut self, name: &str) -> Result<Option<i64>, DbError> {
        TagRepo::new(&mut *self.conn).find_id_by_name(name).await
    }

    async fn username_exists(&mut self, username: &str) -> Result<bool, DbError> {
        CustomerRepo::new(&mut *self.conn).username_exists(username).await
    }

    async fn email_exists(&mut self, email: &str) -> Result<bool, DbError> {
        CustomerRepo::new(&mut *self.conn).email_exists(email).await
    }

    async fn insert_customer(&mut self, customer: &NewCustomer) -> Result<u64, DbError> {
        CustomerRepo::new(&mut *self.conn).insert(customer).await
    }

    async fn find_customer_id(&mut self, username: &str) -> Result<Option<i64>, DbError> {
        CustomerRepo::new(&mut *self.conn)
            .find_id_by_username(username)
            .await
    }

    async fn insert_customer_tag(&mut self, customer_id: i64, tag_id: i64) -> Result<(), DbError> {
        CustomerTagRepo::new(&mut *self.conn)
            .insert(customer_id, tag_id)
            .await
    }
}
