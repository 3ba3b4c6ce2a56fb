//! SharePoint Online integration
//!
//! - `auth`: certificate loading and client assertion signing
//! - `token`: app-only token acquisition and caching
//! - `client`: REST client implementing `DocumentLibrary`
//! - `errors`: status classification into domain errors

pub mod auth;
pub mod client;
pub mod errors;
pub mod token;
mod types;

pub use auth::{AssertionClaims, ClientAssertionSigner, ClientCertificate};
pub use client::SharePointClient;
pub use errors::{SharePointError, SharePointErrorCategory, SharePointOperation};
pub use token::CertificateTokenProvider;
