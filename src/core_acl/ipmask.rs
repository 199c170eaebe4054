use crate::constants::IPMASKS_CONTAINER;
use crate::core_acl::error::AclError;
use crate::core_acl::wildcard::wildcard_match;
use crate::core_db::store::query;
use crate::core_db::{Pool, Query};
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

/// Stored form of one ident@address mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMask {
    pub user: String,
    pub mask: String,
}

/// `ident@host` where either side may use wildcards.
fn mask_regex() -> &'static Regex {
    static MASK_REGEX: OnceLock<Regex> = OnceLock::new();
    MASK_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_\-\.\*\?]+@[A-Za-z0-9_\-\.:\*\?]+$")
            .expect("ident@host pattern is valid")
    })
}

pub fn is_valid_mask(mask: &str) -> bool {
    mask_regex().is_match(mask)
}

/// Per-user ip masks, kept in memory and written through to the database.
#[derive(Debug)]
pub struct IpMaskCache {
    masks: RwLock<HashMap<String, Vec<String>>>,
    pool: Pool,
}

impl IpMaskCache {
    pub fn new(pool: Pool) -> Self {
        Self {
            masks: RwLock::new(HashMap::new()),
            pool,
        }
    }

    /// Loads every stored mask.
    pub async fn initialize(&self) -> Result<(), AclError> {
        let documents = self.pool.select(IPMASKS_CONTAINER, Query::new()).await?;
        let mut masks: HashMap<String, Vec<String>> = HashMap::new();
        for document in documents {
            let entry: IpMask = serde_json::from_value(document)
                .map_err(|e| AclError::InvalidMask(e.to_string()))?;
            masks.entry(entry.user).or_default().push(entry.mask);
        }
        let count: usize = masks.values().map(Vec::len).sum();
        *self.masks.write().await = masks;
        info!("Loaded {} ip masks", count);
        Ok(())
    }

    /// Whether any user's mask matches `addr` (`ident@ip`).
    pub async fn check(&self, addr: &str) -> bool {
        let masks = self.masks.read().await;
        masks
            .values()
            .flatten()
            .any(|mask| wildcard_match(mask, addr, false))
    }

    /// Adds `mask` for `user`.
    ///
    /// Fails if one of the user's masks already covers it. Masks the new one
    /// covers are removed and returned.
    pub async fn add(&self, user: &str, mask: &str) -> Result<Vec<String>, AclError> {
        if !is_valid_mask(mask) {
            return Err(AclError::InvalidMask(mask.to_string()));
        }

        let mut masks = self.masks.write().await;
        let existing = masks.entry(user.to_string()).or_default();

        if existing
            .iter()
            .any(|current| wildcard_match(current, mask, false))
        {
            return Err(AclError::BroaderMaskExists);
        }

        let (deleted, kept): (Vec<String>, Vec<String>) = existing
            .drain(..)
            .partition(|current| wildcard_match(mask, current, false));
        *existing = kept;
        existing.push(mask.to_string());

        for old in &deleted {
            debug!("Mask {} for {} replaced by broader {}", old, user, mask);
            self.pool.delete(IPMASKS_CONTAINER, mask_query(user, old));
        }
        self.pool.insert(
            IPMASKS_CONTAINER,
            serde_json::json!({ "user": user, "mask": mask }),
        );
        Ok(deleted)
    }

    pub async fn delete(&self, user: &str, mask: &str) -> Result<(), AclError> {
        let mut masks = self.masks.write().await;
        let existing = masks.get_mut(user).ok_or(AclError::NoMasks)?;
        let position = existing
            .iter()
            .position(|current| current == mask)
            .ok_or(AclError::MaskNotFound)?;
        existing.remove(position);
        if existing.is_empty() {
            masks.remove(user);
        }
        self.pool.delete(IPMASKS_CONTAINER, mask_query(user, mask));
        Ok(())
    }

    pub async fn list(&self, user: &str) -> Result<Vec<String>, AclError> {
        self.masks
            .read()
            .await
            .get(user)
            .filter(|masks| !masks.is_empty())
            .cloned()
            .ok_or(AclError::NoMasks)
    }

    /// Drops every mask of `user`.
    pub async fn delete_user(&self, user: &str) {
        if self.masks.write().await.remove(user).is_some() {
            self.pool.delete(
                IPMASKS_CONTAINER,
                query([("user", serde_json::json!(user))]),
            );
        }
    }
}

fn mask_query(user: &str, mask: &str) -> Query {
    query([
        ("user", serde_json::json!(user)),
        ("mask", serde_json::json!(mask)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_broader_mask_replaces_narrower() {
        let dir = tempdir().unwrap();
        let cache = IpMaskCache::new(Pool::start(dir.path()));

        assert!(cache.add("alice", "*@192.168.1.*").await.unwrap().is_empty());
        assert!(cache.add("alice", "*@10.0.0.1").await.unwrap().is_empty());

        let deleted = cache.add("alice", "*@*").await.unwrap();
        assert_eq!(deleted, vec!["*@192.168.1.*", "*@10.0.0.1"]);
        assert_eq!(cache.list("alice").await.unwrap(), vec!["*@*"]);
    }

    #[tokio::test]
    async fn test_narrower_mask_is_refused() {
        let dir = tempdir().unwrap();
        let cache = IpMaskCache::new(Pool::start(dir.path()));

        cache.add("alice", "*@*").await.unwrap();
        assert!(matches!(
            cache.add("alice", "*@192.168.1.*").await,
            Err(AclError::BroaderMaskExists)
        ));
        // Other users are unaffected.
        cache.add("bob", "*@192.168.1.*").await.unwrap();
    }

    #[tokio::test]
    async fn test_check_and_delete() {
        let dir = tempdir().unwrap();
        let cache = IpMaskCache::new(Pool::start(dir.path()));

        cache.add("alice", "*@127.0.0.1").await.unwrap();
        assert!(cache.check("*@127.0.0.1").await);
        assert!(!cache.check("*@127.0.0.2").await);

        assert!(matches!(
            cache.delete("alice", "*@127.0.0.2").await,
            Err(AclError::MaskNotFound)
        ));
        cache.delete("alice", "*@127.0.0.1").await.unwrap();
        assert!(matches!(cache.list("alice").await, Err(AclError::NoMasks)));
        assert!(matches!(
            cache.delete("alice", "*@127.0.0.1").await,
            Err(AclError::NoMasks)
        ));
    }

    #[tokio::test]
    async fn test_initialize_reads_back_written_masks() {
        let dir = tempdir().unwrap();
        let pool = Pool::start(dir.path());
        let cache = IpMaskCache::new(pool.clone());
        cache.add("alice", "*@10.0.0.*").await.unwrap();
        cache.add("bob", "ident@host.example").await.unwrap();

        let reloaded = IpMaskCache::new(pool);
        reloaded.initialize().await.unwrap();
        assert_eq!(reloaded.list("alice").await.unwrap(), vec!["*@10.0.0.*"]);
        assert!(reloaded.check("ident@host.example").await);
    }

    #[test]
    fn test_mask_validation() {
        assert!(is_valid_mask("*@*"));
        assert!(is_valid_mask("ident@192.168.1.*"));
        assert!(is_valid_mask("*@::1"));
        assert!(!is_valid_mask("no-at-sign"));
        assert!(!is_valid_mask("a@b c"));
    }
}
