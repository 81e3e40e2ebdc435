use async_trait::async_trait;
use parking_lot::RwLock;

/// Source of the bearer credential used to authenticate the channel
///
/// The connection manager asks the source for a token whenever it is told
/// to refresh its credential. Returning `None` means the user is not
/// authenticated; the manager then stays idle instead of retrying.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Get the current bearer token, if any
    async fn bearer_token(&self) -> Option<String>;
}

/// A credential source with no token
pub struct NoCredential;

#[async_trait]
impl CredentialSource for NoCredential {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A credential source holding a token that can be swapped at runtime
///
/// # Example
/// ```ignore
/// let source = Arc::new(StaticToken::new("abc"));
/// manager.refresh_credential().await;
///
/// // after the user logs out
/// source.clear();
/// manager.refresh_credential().await;
/// ```
pub struct StaticToken {
    token: RwLock<Option<String>>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Replace the stored token
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Forget the stored token
    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

#[async_trait]
impl CredentialSource for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
