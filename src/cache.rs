use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Cache key builders for the derived read views. Employee-scoped keys share
/// the `my:{id}:` prefix and manager-scoped keys the `team:{id}:` prefix so
/// a whole family can be dropped with one tag invalidation.
pub mod keys {
    use uuid::Uuid;

    pub fn balance(employee_id: Uuid, year: i32) -> String {
        format!("leave:balance:{employee_id}:{year}")
    }

    pub fn my_tag(employee_id: Uuid) -> String {
        format!("leave:my:{employee_id}:")
    }

    pub fn my_list(employee_id: Uuid) -> String {
        format!("leave:my:{employee_id}:list")
    }

    pub fn my_counts(employee_id: Uuid) -> String {
        format!("leave:my:{employee_id}:counts")
    }

    pub fn team_tag(manager_id: Uuid) -> String {
        format!("leave:team:{manager_id}:")
    }

    pub fn team_list(manager_id: Uuid, status: Option<&str>) -> String {
        format!(
            "leave:team:{manager_id}:list:{}",
            status.unwrap_or("all")
        )
    }

    pub fn active_leave_types() -> String {
        "leave:types:active".to_string()
    }
}

/// TTL'd view cache over derived balance/list/count reads. Never the system
/// of record: every value here can be rebuilt from the ledger and request
/// tables, and every operation is best-effort.
#[derive(Clone)]
pub struct ViewCache {
    inner: Cache<String, String>,
}

impl ViewCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.inner.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                // Stale shape after a deploy; treat as a miss.
                tracing::debug!(key, error = %e, "discarding undecodable cache entry");
                self.inner.invalidate(key).await;
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: String, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.inner.insert(key, raw).await,
            Err(e) => tracing::warn!(key, error = %e, "failed to serialize cache entry"),
        }
    }

    pub async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Tag-style bulk invalidation: drop every key starting with `prefix`.
    pub fn invalidate_prefix(&self, prefix: String) {
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            tracing::warn!(error = %e, "cache prefix invalidation failed");
        }
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        // 5-minute TTL matches how long a stale derived view is tolerable.
        Self::new(Duration::from_secs(300), 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn round_trips_json_values() {
        let cache = ViewCache::default();
        cache.put_json("k".to_string(), &vec![1u32, 2, 3]).await;
        let got: Option<Vec<u32>> = cache.get_json("k").await;
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn prefix_invalidation_drops_the_family() {
        let cache = ViewCache::default();
        let employee = Uuid::new_v4();
        cache.put_json(keys::my_list(employee), &1u32).await;
        cache.put_json(keys::my_counts(employee), &2u32).await;
        cache.put_json("leave:other".to_string(), &3u32).await;

        cache.invalidate_prefix(keys::my_tag(employee));
        // Invalidation closures apply lazily; reads go through the predicate.
        tokio::task::yield_now().await;

        assert_eq!(cache.get_json::<u32>(&keys::my_list(employee)).await, None);
        assert_eq!(cache.get_json::<u32>(&keys::my_counts(employee)).await, None);
        assert_eq!(cache.get_json::<u32>("leave:other").await, Some(3));
    }
}
