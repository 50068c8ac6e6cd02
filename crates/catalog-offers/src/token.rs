use std::sync::Arc;

use tokio::sync::RwLock;

/// Shared access token for the offer service.
///
/// Cloning shares the same slot, so a reauthorization performed through any
/// clone is visible to all of them. Concurrent refreshes are last-writer-wins.
#[derive(Debug, Clone, Default)]
pub struct AccessToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl AccessToken {
    #[must_use]
    pub fn new(initial: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Current token, or `None` before the first successful authorization.
    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    /// Replaces the token, returning the previous one.
    pub async fn swap(&self, token: String) -> Option<String> {
        self.inner.write().await.replace(token)
    }
}
