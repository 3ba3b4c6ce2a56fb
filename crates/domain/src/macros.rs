//! Macro for implementing Display and FromStr for status enums
//!
//! Status-like enums reported to callers (sync outcomes, checkout states)
//! share one lowercase string form for logging and payloads.
//!
//! # Example
//!
//! ```rust
//! use tenderdocs_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum TransferState {
//!     Queued,
//!     Copied,
//! }
//!
//! impl_status_conversions!(TransferState {
//!     Queued => "queued",
//!     Copied => "copied",
//! });
//!
//! assert_eq!(TransferState::Copied.to_string(), "copied");
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and names the enum in its error
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
