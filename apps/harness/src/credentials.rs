//! Rotating credential pool shared by all in-flight requests of one
//! provider family.

use std::sync::Mutex;

use tracing::info;

/// An ordered set of API keys with a synchronized active index.
///
/// Rotation is driven by quota-exhaustion signals observed on a specific key.
/// `rotate_from` only advances when the active index still equals the index
/// the caller observed, so two dispatchers that both see exhaustion on the
/// same key cannot advance the pool twice.
#[derive(Debug)]
pub struct CredentialPool {
    keys: Vec<String>,
    index: Mutex<usize>,
}

impl CredentialPool {
    /// Builds a pool from the non-empty keys in `keys`.
    /// Returns `None` when no usable key remains.
    pub fn new(keys: Vec<String>) -> Option<Self> {
        let keys: Vec<String> = keys.into_iter().filter(|k| !k.trim().is_empty()).collect();
        if keys.is_empty() {
            return None;
        }
        Some(Self {
            keys,
            index: Mutex::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The currently active key and its index. The index must be passed back
    /// to [`CredentialPool::rotate_from`] when this key is rejected.
    pub fn active(&self) -> (usize, String) {
        let index = *self.index.lock().expect("credential index poisoned");
        (index, self.keys[index].clone())
    }

    /// Rotates away from an exhausted key.
    ///
    /// Returns `true` when a retry should proceed: either this call advanced
    /// to the next key, or another dispatcher already rotated past `observed`.
    /// Returns `false` when `observed` is the last key — the pool is
    /// exhausted.
    pub fn rotate_from(&self, observed: usize) -> bool {
        let mut index = self.index.lock().expect("credential index poisoned");
        if *index != observed {
            // Someone else already rotated; retry with the current key.
            return true;
        }
        if *index + 1 >= self.keys.len() {
            return false;
        }
        *index += 1;
        info!("switched to API key {} of {}", *index + 1, self.keys.len());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keys_filtered_out() {
        assert!(CredentialPool::new(vec!["".into(), "  ".into()]).is_none());
        let pool = CredentialPool::new(vec!["".into(), "k1".into()]).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.active(), (0, "k1".to_string()));
    }

    #[test]
    fn test_rotate_advances_once_then_exhausts() {
        let pool = CredentialPool::new(vec!["k1".into(), "k2".into()]).unwrap();
        let (observed, _) = pool.active();
        assert!(pool.rotate_from(observed));
        assert_eq!(pool.active(), (1, "k2".to_string()));
        assert!(!pool.rotate_from(1));
        assert_eq!(pool.active(), (1, "k2".to_string()));
    }

    #[test]
    fn test_concurrent_rotation_does_not_double_advance() {
        // Both dispatchers observed exhaustion on key 0; only the first call
        // advances, the second retries on the already-rotated key.
        let pool = CredentialPool::new(vec!["k1".into(), "k2".into()]).unwrap();
        assert!(pool.rotate_from(0));
        assert!(pool.rotate_from(0));
        assert_eq!(pool.active(), (1, "k2".to_string()));
    }

    #[test]
    fn test_single_key_pool_exhausts_immediately() {
        let pool = CredentialPool::new(vec!["only".into()]).unwrap();
        assert!(!pool.rotate_from(0));
    }
}
