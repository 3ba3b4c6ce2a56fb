//! # Tender Docs Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SharePoint REST client and certificate-based token provider
//! - Object storage adapter (S3 / R2 / in-memory)
//! - Shared HTTP client with timeouts
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `tenderdocs-core`
//! - Contains all "impure" code (HTTP, storage, filesystem)

pub mod config;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod integrations;
pub mod observability;
pub mod storage;

pub use errors::InfraError;
pub use gateway::{build_gateway, gateway_from_env};
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::sharepoint::{CertificateTokenProvider, SharePointClient};
pub use storage::ObjectStoreStorage;
