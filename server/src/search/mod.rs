//! Search engine access.
//!
//! [`SearchEngine`] isolates the wire protocol; [`SearchFacade`] resolves
//! collections to indexes, batches per index and keeps per-index error state.

mod client;
mod facade;
mod meili;
#[cfg(test)]
pub mod memory;

pub use client::*;
pub use facade::*;
pub use meili::MeiliClient;
