//! Token lifecycle trait driven by the renewal scheduler.

use async_trait::async_trait;
use std::time::Duration;

/// Remaining lifetime of the current token, as last reported by Vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// Vault reported this much time left
    Remaining(Duration),
    /// Lookup failed; the TTL is not available
    Unavailable,
}

impl TtlStatus {
    /// Remaining TTL, if known.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Remaining(ttl) => Some(*ttl),
            Self::Unavailable => None,
        }
    }
}

/// Lookup and renewal of a long-lived token.
///
/// Neither operation fails the caller: failures are logged by the
/// implementation and reported through the return value.
#[async_trait]
pub trait TokenLifecycle: Send + Sync {
    /// Ask Vault how long the current token has left.
    async fn lookup(&self) -> TtlStatus;

    /// Extend the current token. Returns `true` if Vault accepted the renewal.
    async fn renew(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining() {
        assert_eq!(
            TtlStatus::Remaining(Duration::from_secs(50)).remaining(),
            Some(Duration::from_secs(50))
        );
        assert_eq!(TtlStatus::Unavailable.remaining(), None);
    }
}
