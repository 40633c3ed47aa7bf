use std::sync::{Arc, RwLock};

/// Shared slot holding the bearer token attached to backend requests.
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct BearerToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl BearerToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<String>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
