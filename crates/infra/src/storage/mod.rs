//! Object storage adapters

pub mod object;

pub use object::ObjectStoreStorage;
