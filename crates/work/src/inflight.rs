//! Per-key in-flight tracking.
//!
//! A key (usually a bid or project id) is held while its request runs. The
//! guard releases the key on drop, so the flag clears whether the request
//! succeeded, failed or was cancelled.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of keys with a request running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, HashSet<String>> {
        self.keys.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim `key`; `None` if it is already held.
    pub fn try_begin(&self, key: impl Into<String>) -> Option<InFlightGuard> {
        let key = key.into();
        if !self.keys().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            keys: self.keys.clone(),
            key,
        })
    }

    /// Whether `key` is held.
    pub fn is_busy(&self, key: &str) -> bool {
        self.keys().contains(key)
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    /// Whether nothing is running.
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

/// Holds a key until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlightGuard {
    /// The held key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_request_per_key() {
        let inflight = InFlight::new();
        let guard = inflight.try_begin("bid:b1").unwrap();
        assert_eq!(guard.key(), "bid:b1");
        assert!(inflight.try_begin("bid:b1").is_none());
        assert!(inflight.try_begin("bid:b2").is_some());
        assert!(inflight.is_busy("bid:b1"));

        drop(guard);
        assert!(!inflight.is_busy("bid:b1"));
        assert!(inflight.is_empty());
    }

    #[test]
    fn test_released_on_error_path() {
        fn failing(inflight: &InFlight) -> Result<(), &'static str> {
            let _guard = inflight.try_begin("project:p1").ok_or("busy")?;
            Err("server said no")
        }

        let inflight = InFlight::new();
        assert_eq!(failing(&inflight), Err("server said no"));
        assert_eq!(failing(&inflight), Err("server said no"));
        assert_eq!(inflight.len(), 0);
    }
}
