//! Database layer - connection pool and repositories
//!
//! Repositories borrow a single checked-out connection so every statement of
//! one registration runs on the same session. Statements auto-commit; there is
//! no enclosing transaction.

pub mod pool;
pub mod repos;

pub use pool::create_pool;
pub use repos::*;
