//! Customer registration flow
//!
//! `validate → acquire → resolve tags → insert customer → link tags`.
//! Any step returning `Err` short-circuits. The session returned by
//! [`RegistrationStore::acquire`] is dropped on every path, which hands the
//! connection back to the pool.

use async_trait::async_trait;

use crate::db::DbError;
use crate::models::{NewCustomer, RegisterCustomerRequest, ValidationError};

mod pg;
pub use pg::PgStore;

#[cfg(any(test, feature = "inmemory"))]
pub mod memory;
#[cfg(any(test, feature = "inmemory"))]
pub use memory::MemoryStore;

/// Registration failure, classified by how the caller should react.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Caller-fixable problem with the request
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// SQL failure outside the cases turned into validation errors
    #[error("{0}")]
    Database(#[from] DbError),

    /// Anything else, e.g. no connection could be acquired
    #[error("{0}")]
    Unexpected(String),
}

/// Source of registration sessions (one pooled connection each).
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn RegistrationSession>, RegistrationError>;

    /// Sessions currently checked out and not yet dropped.
    fn connections_in_use(&self) -> usize;
}

/// Statements a registration runs against one checked-out connection.
#[async_trait]
pub trait RegistrationSession: Send {
    async fn find_tag_id(&mut self, name: &str) -> Result<Option<i64>, DbError>;

    async fn username_exists(&mut self, username: &str) -> Result<bool, DbError>;

    async fn email_exists(&mut self, email: &str) -> Result<bool, DbError>;

    /// Insert the customer row, returning affected rows.
    async fn insert_customer(&mut self, customer: &NewCustomer) -> Result<u64, DbError>;

    async fn find_customer_id(&mut self, username: &str) -> Result<Option<i64>, DbError>;

    async fn insert_customer_tag(&mut self, customer_id: i64, tag_id: i64) -> Result<(), DbError>;
}

/// How many association rows were written for a registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    pub linked: usize,
    pub failed: usize,
}

impl LinkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub customer_id: i64,
    pub links: LinkOutcome,
}

/// Run the whole registration for one request.
pub async fn register(
    store: &dyn RegistrationStore,
    request: RegisterCustomerRequest,
) -> Result<Registered, RegistrationError> {
    let customer = request.validate()?;

    let mut session = store.acquire().await?;

    let tag_ids = resolve_tag_ids(session.as_mut(), &customer.tags).await?;
    let customer_id = insert_customer(session.as_mut(), &customer).await?;
    let links = link_tags(session.as_mut(), customer_id, &tag_ids).await;

    Ok(Registered { customer_id, links })
}

/// Resolve tag names to ids in input order, failing on the first unknown name.
pub async fn resolve_tag_ids(
    session: &mut dyn RegistrationSession,
    names: &[String],
) -> Result<Vec<i64>, RegistrationError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        match session.find_tag_id(name).await? {
            Some(id) => ids.push(id),
            None => {
                return Err(ValidationError::UndefinedTag { name: name.clone() }.into());
            }
        }
    }
    Ok(ids)
}

/// Check uniqueness, insert the customer, and read its id back by username.
pub async fn insert_customer(
    session: &mut dyn RegistrationSession,
    customer: &NewCustomer,
) -> Result<i64, RegistrationError> {
    if session.username_exists(&customer.username).await? {
        return Err(ValidationError::UsernameTaken {
            username: customer.username.clone(),
        }
        .into());
    }

    if session.email_exists(&customer.email).await? {
        return Err(ValidationError::EmailTaken {
            email: customer.email.clone(),
        }
        .into());
    }

    let inserted = match session.insert_customer(customer).await {
        Ok(rows) => rows,
        Err(DbError::UniqueViolation { constraint }) => {
            return Err(duplicate_from_constraint(&constraint, customer).into());
        }
        Err(e) => return Err(e.into()),
    };

    let insert_failed = || ValidationError::InsertFailed {
        username: customer.username.clone(),
    };

    if inserted == 0 {
        return Err(insert_failed().into());
    }

    session
        .find_customer_id(&customer.username)
        .await?
        .ok_or_else(|| insert_failed().into())
}

/// Insert one association per tag id; failures are logged and skipped.
pub async fn link_tags(
    session: &mut dyn RegistrationSession,
    customer_id: i64,
    tag_ids: &[i64],
) -> LinkOutcome {
    let mut outcome = LinkOutcome::default();
    for &tag_id in tag_ids {
        match session.insert_customer_tag(customer_id, tag_id).await {
            Ok(()) => outcome.linked += 1,
            Err(e) => {
                tracing::error!(customer_id, tag_id, error = %e, "customer or tag not found, link skipped");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Map a unique-constraint violation on insert to the matching duplicate error.
fn duplicate_from_constraint(constraint: &str, customer: &NewCustomer) -> ValidationError {
    if constraint.contains("email") {
        ValidationError::EmailTaken {
            email: customer.email.clone(),
        }
    } else {
        ValidationError::UsernameTaken {
            username: customer.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, tags: &[&str]) -> RegisterCustomerRequest {
        RegisterCustomerRequest {
            username: Some(username.into()),
            name: Some("Ada".into()),
            surname: Some("Lovelace".into()),
            email: Some(email.into()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn registers_customer_with_all_tags() {
        let store = MemoryStore::with_tags(&["vip", "new"]);

        let registered = register(&store, request("ada", "ada@example.com", &["vip", "new"]))
            .await
            .unwrap();

        assert_eq!(registered.links, LinkOutcome { linked: 2, failed: 0 });
        let customers = store.customers().await;
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, registered.customer_id);

        let vip = store.tag_id("vip").await.unwrap();
        let new = store.tag_id("new").await.unwrap();
        assert_eq!(
            store.customer_tags().await,
            vec![(registered.customer_id, vip), (registered.customer_id, new)]
        );
    }

    #[tokio::test]
    async fn validation_runs_before_acquire() {
        let store = MemoryStore::with_tags(&["vip"]);
        let mut req = request("ada", "ada@example.com", &["vip"]);
        req.email = None;

        let err = register(&store, req).await.unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::Validation(ValidationError::Missing { field: "email" })
        ));
        assert_eq!(store.acquisitions(), 0);
    }

    #[tokio::test]
    async fn resolves_in_order_and_keeps_duplicates() {
        let store = MemoryStore::with_tags(&["vip", "new"]);
        let mut session = store.acquire().await.unwrap();
        let names = vec!["new".to_string(), "vip".to_string(), "new".to_string()];

        let ids = resolve_tag_ids(session.as_mut(), &names).await.unwrap();

        let vip = store.tag_id("vip").await.unwrap();
        let new = store.tag_id("new").await.unwrap();
        assert_eq!(ids, vec![new, vip, new]);
    }

    #[tokio::test]
    async fn stops_at_first_unknown_tag() {
        let store = MemoryStore::with_tags(&["vip"]);
        let mut session = store.acquire().await.unwrap();
        let names = vec!["vip".to_string(), "gold".to_string(), "silver".to_string()];

        let err = resolve_tag_ids(session.as_mut(), &names).await.unwrap_err();

        assert_eq!(err.to_string(), "Undefined tag: gold");
        assert_eq!(store.tag_lookups(), 2);
    }

    #[tokio::test]
    async fn unknown_tag_creates_no_customer() {
        let store = MemoryStore::with_tags(&["vip"]);

        let err = register(&store, request("ada", "ada@example.com", &["vip", "gold"]))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::Validation(_)));
        assert!(store.customers().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_duplicate_username() {
        let store = MemoryStore::with_tags(&["vip"]);
        register(&store, request("ada", "ada@example.com", &["vip"]))
            .await
            .unwrap();

        let err = register(&store, request("ada", "other@example.com", &["vip"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Username already exists: ada");
        assert_eq!(store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryStore::with_tags(&["vip"]);
        register(&store, request("ada", "ada@example.com", &["vip"]))
            .await
            .unwrap();

        let err = register(&store, request("grace", "ada@example.com", &["vip"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Email already exists: ada@example.com");
        assert_eq!(store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn link_failures_are_counted_not_raised() {
        let store = MemoryStore::with_tags(&["vip", "new"]);
        let new = store.tag_id("new").await.unwrap();
        store.fail_links_to(new).await;

        let registered = register(&store, request("ada", "ada@example.com", &["vip", "new"]))
            .await
            .unwrap();

        assert_eq!(registered.links, LinkOutcome { linked: 1, failed: 1 });
        assert!(!registered.links.is_complete());
        assert_eq!(store.customer_tags().await.len(), 1);
        assert_eq!(store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn zero_row_insert_is_insert_failed() {
        let store = MemoryStore::with_tags(&["vip"]);
        store.insert_affects_no_rows().await;

        let err = register(&store, request("ada", "ada@example.com", &["vip"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::Validation(ValidationError::InsertFailed { .. })
        ));
        assert_eq!(err.to_string(), "Insert customer failed: ada");
        assert!(store.customer_tags().await.is_empty());
        assert_eq!(store.in_use(), 0);
    }

    #[tokio::test]
    async fn unreadable_customer_is_insert_failed() {
        let store = MemoryStore::with_tags(&["vip"]);
        store.forget_customer_after_insert().await;

        let err = register(&store, request("ada", "ada@example.com", &["vip"]))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::Validation(_)));
        assert_eq!(err.to_string(), "Insert customer failed: ada");
        assert!(store.customer_tags().await.is_empty());
    }

    #[tokio::test]
    async fn email_race_on_insert_is_email_taken() {
        let store = MemoryStore::with_tags(&["vip"]);
        store.unique_violation_on_insert("customer_email_key").await;

        let err = register(&store, request("ada", "ada@example.com", &["vip"]))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::Validation(_)));
        assert_eq!(err.to_string(), "Email already exists: ada@example.com");
        assert!(store.customers().await.is_empty());
    }

    #[tokio::test]
    async fn username_race_on_insert_is_username_taken() {
        let store = MemoryStore::with_tags(&["vip"]);
        store.unique_violation_on_insert("customer_username_key").await;

        let err = register(&store, request("ada", "ada@example.com", &["vip"]))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::Validation(_)));
        assert_eq!(err.to_string(), "Username already exists: ada");
        assert!(store.customers().await.is_empty());
    }

    #[test]
    fn unique_violation_maps_by_constraint_name() {
        let customer = request("ada", "ada@example.com", &["vip"]).validate().unwrap();

        let err = duplicate_from_constraint("customer_email_key", &customer);
        assert_eq!(
            err,
            ValidationError::EmailTaken {
                email: "ada@example.com".into()
            }
        );

        let err = duplicate_from_constraint("customer_username_key", &customer);
        assert_eq!(
            err,
            ValidationError::UsernameTaken {
                username: "ada".into()
            }
        );
    }
}
