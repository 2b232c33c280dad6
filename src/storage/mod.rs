//! Storage layer: schema, column codecs, and the transactional store.

pub mod codec;
pub mod schema;
pub mod store;

pub use store::{DbStats, Store, Txn};
