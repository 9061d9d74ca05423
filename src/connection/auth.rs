//! Password acquisition boundary

use async_trait::async_trait;

use crate::types::DaapShare;

/// Supplies passwords for protected shares.
///
/// The connection asks once before login and again after each rejected
/// attempt, with `previous_failed` set. Returning `None` abandons the
/// attempt as an authentication failure.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Produce a password for `share`, or `None` to give up
    async fn password_for(&self, share: &DaapShare, previous_failed: bool) -> Option<String>;
}

/// Authenticator for shares without a password; always declines to answer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPassword;

#[async_trait]
impl Authenticator for NoPassword {
    async fn password_for(&self, _share: &DaapShare, _previous_failed: bool) -> Option<String> {
        None
    }
}

/// Authenticator with a fixed password; gives up after one rejection
#[derive(Debug, Clone)]
pub struct StaticPassword(pub String);

#[async_trait]
impl Authenticator for StaticPassword {
    async fn password_for(&self, _share: &DaapShare, previous_failed: bool) -> Option<String> {
        if previous_failed {
            None
        } else {
            Some(self.0.clone())
        }
    }
}
