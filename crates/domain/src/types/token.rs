//! Bearer token held by the token provider

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// OAuth2 bearer token with its absolute expiry.
///
/// Owned by the token provider and cached in-process only; never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from an identity provider `expires_in` value.
    ///
    /// Negative lifetimes count as already expired; lifetimes past the
    /// representable range are capped at `DateTime::<Utc>::MAX_UTC`.
    #[must_use]
    pub fn from_expires_in(token: String, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(expires_in_secs.max(0))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { token, expires_at }
    }

    /// True when the token is expired or expires within `skew_secs`.
    ///
    /// A skew too large to add to the current time counts as expired.
    #[must_use]
    pub fn is_expired(&self, skew_secs: i64) -> bool {
        Duration::try_seconds(skew_secs)
            .and_then(|skew| Utc::now().checked_add_signed(skew))
            .map_or(true, |deadline| deadline >= self.expires_at)
    }
}

// Keep bearer strings out of logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
