//! Database module for PostgreSQL persistence.

mod kv;
mod pool;

pub use kv::*;
pub use pool::*;
