//! In-memory registration store
//!
//! Mimics the relational schema closely enough for handler tests: unique
//! username/email, foreign keys on `customer_tags`, and a checked-out
//! session counter standing in for the pool's in-use count. Fault hooks
//! make link and customer inserts fail the ways PostgreSQL can.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RegistrationError, RegistrationSession, RegistrationStore};
use crate::db::DbError;
use crate::models::NewCustomer;

/// Stored customer row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: String,
}

#[derive(Debug, Default)]
struct Tables {
    customers: Vec<CustomerRecord>,
    tags: Vec<(i64, String)>,
    customer_tags: Vec<(i64, i64)>,
    next_customer_id: i64,
    /// Tag ids whose association inserts fail as if the tag row were gone
    broken_tags: HashSet<i64>,
    insert_fault: Option<InsertFault>,
}

/// Ways the next customer insert misbehaves
#[derive(Debug, Clone)]
enum InsertFault {
    /// Statement succeeds but reports zero affected rows
    NoRows,
    /// Row is reported inserted but cannot be read back
    Unreadable,
    /// A concurrent writer took the value first
    UniqueViolation(String),
}

#[derive(Debug, Default)]
struct Counters {
    in_use: AtomicUsize,
    acquisitions: AtomicUsize,
    tag_lookups: AtomicUsize,
}

/// Registration store backed by in-process tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    counters: Arc<Counters>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with tags whose ids are 1, 2, ... in the given order.
    pub fn with_tags(names: &[&str]) -> Self {
        let tables = Tables {
            tags: names
                .iter()
                .enumerate()
                .map(|(i, name)| (i as i64 + 1, name.to_string()))
                .collect(),
            ..Tables::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
            counters: Arc::default(),
        }
    }

    pub async fn customers(&self) -> Vec<CustomerRecord> {
        self.tables.lock().await.customers.clone()
    }

    pub async fn customer_tags(&self) -> Vec<(i64, i64)> {
        self.tables.lock().await.customer_tags.clone()
    }

    pub async fn tag_id(&self, name: &str) -> Option<i64> {
        let tables = self.tables.lock().await;
        tables.tags.iter().find(|(_, n)| n == name).map(|(id, _)| *id)
    }

    /// Make association inserts for this tag fail with a foreign key error.
    pub async fn fail_links_to(&self, tag_id: i64) {
        self.tables.lock().await.broken_tags.insert(tag_id);
    }

    /// Report zero affected rows for the next customer insert and store nothing.
    pub async fn insert_affects_no_rows(&self) {
        self.tables.lock().await.insert_fault = Some(InsertFault::NoRows);
    }

    /// Report the next customer insert as done without keeping the row.
    pub async fn forget_customer_after_insert(&self) {
        self.tables.lock().await.insert_fault = Some(InsertFault::Unreadable);
    }

    /// Fail the next customer insert on `constraint`, as when another
    /// request inserts the same username or email between check and insert.
    pub async fn unique_violation_on_insert(&self, constraint: &str) {
        self.tables.lock().await.insert_fault =
            Some(InsertFault::UniqueViolation(constraint.to_string()));
    }

    /// Sessions currently checked out.
    pub fn in_use(&self) -> usize {
        self.counters.in_use.load(Ordering::SeqCst)
    }

    /// Sessions handed out since creation.
    pub fn acquisitions(&self) -> usize {
        self.counters.acquisitions.load(Ordering::SeqCst)
    }

    /// Tag-name lookups issued since creation.
    pub fn tag_lookups(&self) -> usize {
        self.counters.tag_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn acquire(&self) -> Result<Box<dyn RegistrationSession>, RegistrationError> {
        self.counters.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.counters.in_use.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            tables: Arc::clone(&self.tables),
            counters: Arc::clone(&self.counters),
        }))
    }

    fn connections_in_use(&self) -> usize {
        self.in_use()
    }
}

struct MemorySession {
    tables: Arc<Mutex<Tables>>,
    counters: Arc<Counters>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.counters.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegistrationSession for MemorySession {
    async fn find_tag_id(&mut self, name: &str) -> Result<Option<i64>, DbError> {
        self.counters.tag_lookups.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().await;
        Ok(tables.tags.iter().find(|(_, n)| n == name).map(|(id, _)| *id))
    }

    async fn username_exists(&mut self, username: &str) -> Result<bool, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables.customers.iter().any(|c| c.username == username))
    }

    async fn email_exists(&mut self, email: &str) -> Result<bool, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables.customers.iter().any(|c| c.email == email))
    }

    async fn insert_customer(&mut self, customer: &NewCustomer) -> Result<u64, DbError> {
        let mut tables = self.tables.lock().await;
        match tables.insert_fault.take() {
            Some(InsertFault::NoRows) => return Ok(0),
            Some(InsertFault::Unreadable) => return Ok(1),
            Some(InsertFault::UniqueViolation(constraint)) => {
                return Err(DbError::UniqueViolation { constraint });
            }
            None => {}
        }
        if tables.customers.iter().any(|c| c.username == customer.username) {
            return Err(DbError::UniqueViolation {
                constraint: "customer_username_key".into(),
            });
        }
        if tables.customers.iter().any(|c| c.email == customer.email) {
            return Err(DbError::UniqueViolation {
                constraint: "customer_email_key".into(),
            });
        }

        tables.next_customer_id += 1;
        let id = tables.next_customer_id;
        tables.customers.push(CustomerRecord {
            id,
            username: customer.username.clone(),
            name: customer.name.clone(),
            surname: customer.surname.clone(),
            email: customer.email.clone(),
        });
        Ok(1)
    }

    async fn find_customer_id(&mut self, username: &str) -> Result<Option<i64>, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .customers
            .iter()
            .find(|c| c.username == username)
            .map(|c| c.id))
    }

    async fn insert_customer_tag(&mut self, customer_id: i64, tag_id: i64) -> Result<(), DbError> {
        let mut tables = self.tables.lock().await;
        if !tables.customers.iter().any(|c| c.id == customer_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: "customer_tags_customer_id_fkey".into(),
            });
        }
        let tag_known = tables.tags.iter().any(|(id, _)| *id == tag_id);
        if !tag_known || tables.broken_tags.contains(&tag_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: "customer_tags_tag_id_fkey".into(),
            });
        }
        tables.customer_tags.push((customer_id, tag_id));
        Ok(())
    }
}
