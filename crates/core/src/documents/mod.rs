//! Document synchronization domain

pub mod paths;
pub mod ports;
pub mod service;

pub use ports::*;
pub use service::*;
