//! Identity resolution trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// Turns an opaque client credential into a stable user identity.
///
/// Implementations must fail with [`ErrorKind::Authentication`] for any
/// credential they cannot vouch for.
///
/// [`ErrorKind::Authentication`]: crate::error::ErrorKind::Authentication
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve a credential to the user it was issued for.
    async fn resolve(&self, credential: &str) -> AppResult<UserId>;
}
