use std::time::Duration;

use moka::future::Cache;

use crate::storage::{Storage, StorageResult};

/// Usernames known to be taken, so repeated conflicts skip the storage lookup.
/// A miss proves nothing; storage stays the source of truth.
#[derive(Clone)]
pub struct UsernameCache {
    taken: Cache<String, ()>,
}

impl Default for UsernameCache {
    fn default() -> Self {
        Self::new(50_000, Duration::from_secs(86_400)) // 24h TTL
    }
}

impl UsernameCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            taken: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Mark a single username as taken
    pub async fn mark_taken(&self, username: &str) {
        self.taken.insert(username.to_lowercase(), ()).await;
    }

    /// Forget a username after its user is renamed or deleted
    pub async fn release(&self, username: &str) {
        self.taken.invalidate(&username.to_lowercase()).await;
    }

    pub fn is_taken(&self, username: &str) -> bool {
        self.taken.contains_key(&username.to_lowercase())
    }

    /// Load every existing username into the cache
    pub async fn warmup(&self, storage: &dyn Storage) -> StorageResult<usize> {
        let users = storage.list_users().await?;

        let inserts: Vec<_> = users.iter().map(|u| self.mark_taken(&u.username)).collect();
        futures::future::join_all(inserts).await;

        log::info!("Username cache warmup complete: {} users", users.len());
        Ok(users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::{NewUser, Role};
    use crate::storage::MemStorage;

    #[actix_web::test]
    async fn lookups_ignore_case() {
        let cache = UsernameCache::default();
        cache.mark_taken("Admin").await;
        assert!(cache.is_taken("admin"));

        cache.release("ADMIN").await;
        assert!(!cache.is_taken("admin"));
    }

    #[actix_web::test]
    async fn warmup_loads_existing_users() {
        let storage = MemStorage::new();
        storage
            .create_user(NewUser {
                username: "staff".into(),
                password_hash: "hash".into(),
                name: "Staff User".into(),
                email: "staff@plexpay.com".into(),
                role: Role::Staff,
            })
            .await
            .unwrap();

        let cache = UsernameCache::default();
        assert_eq!(cache.warmup(&storage).await.unwrap(), 1);
        assert!(cache.is_taken("staff"));
    }
}
