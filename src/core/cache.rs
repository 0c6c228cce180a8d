use async_trait::async_trait;
use std::hash::Hash;
use std::time::Duration;

/// Key-value cache where every entry may carry its own time-to-live.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Returns the value for `key` unless it is missing or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`, replacing any previous entry. `None` never expires.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
}
