//! Request models with validation
//!
//! Incoming registrations are checked before any database access.
//! Invalid input returns ValidationError, not panic.

pub mod customer;
pub mod validation;

pub use customer::{NewCustomer, RegisterCustomerRequest};
pub use validation::ValidationError;
