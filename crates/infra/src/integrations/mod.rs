//! External service integrations

pub mod sharepoint;
