use blockswap_api::ContentId;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

/// The set of keys with a discovery in progress.
#[derive(Debug, Default)]
pub(crate) struct ActiveSet {
    keys: Mutex<HashSet<ContentId>>,
}

impl ActiveSet {
    /// Claim `key` for a new discovery.
    ///
    /// Check and insert happen under one lock. Returns `None` if the key
    /// is already claimed. The key is released when the returned claim
    /// is dropped.
    pub fn try_claim(self: &Arc<Self>, key: &ContentId) -> Option<ActiveClaim> {
        if !self.keys.lock().unwrap().insert(key.clone()) {
            return None;
        }
        Some(ActiveClaim {
            set: self.clone(),
            key: key.clone(),
        })
    }

    #[cfg(test)]
    pub fn contains(&self, key: &ContentId) -> bool {
        self.keys.lock().unwrap().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap().len()
    }
}

/// Ownership of one key in the [ActiveSet].
#[derive(Debug)]
pub(crate) struct ActiveClaim {
    set: Arc<ActiveSet>,
    key: ContentId,
}

impl ActiveClaim {
    pub fn key(&self) -> &ContentId {
        &self.key
    }
}

impl Drop for ActiveClaim {
    fn drop(&mut self) {
        self.set.keys.lock().unwrap().remove(&self.key);
    }
}
