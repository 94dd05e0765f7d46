//! kron-server: customer registration over HTTP
//!
//! A single `POST /customer/add` endpoint validates a registration, resolves
//! the requested tag names, stores the customer and links it to its tags in
//! PostgreSQL.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod registration;

pub use config::{ConfigError, DatabaseConfig};
pub use registration::{register, PgStore, RegistrationError, RegistrationStore};
