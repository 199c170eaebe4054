use crate::constants::{SITEOP_FLAG, USERNAME_REGEX, USERS_CONTAINER};
use crate::core_acl::error::AclError;
use crate::core_db::store::query;
use crate::core_db::{DbError, Pool, Query};
use bcrypt::{hash, verify};
use chrono::{TimeZone, Utc};
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub password_hash: String,
    /// One character per flag, `1` marks a siteop.
    #[serde(default)]
    pub flags: String,
    /// Unix timestamp.
    pub created: i64,
    /// KiB/s, zero for unlimited.
    #[serde(default)]
    pub max_download_speed: u32,
    #[serde(default)]
    pub max_upload_speed: u32,
}

impl User {
    pub fn is_siteop(&self) -> bool {
        self.flags.contains(SITEOP_FLAG)
    }

    pub fn created_string(&self) -> String {
        Utc.timestamp_opt(self.created, 0)
            .single()
            .map(|when| when.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

pub fn is_valid_username(name: &str) -> bool {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX
        .get_or_init(|| Regex::new(USERNAME_REGEX).expect("username pattern is valid"))
        .is_match(name)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AclError> {
    hash(password, cost).map_err(|e| AclError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}

/// Every account, kept in memory and written through to the database.
#[derive(Debug)]
pub struct UserCache {
    users: RwLock<HashMap<String, User>>,
    pool: Pool,
    bcrypt_cost: u32,
}

impl UserCache {
    pub fn new(pool: Pool, bcrypt_cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            pool,
            bcrypt_cost,
        }
    }

    pub async fn initialize(&self) -> Result<(), AclError> {
        let documents = self.pool.select(USERS_CONTAINER, Query::new()).await?;
        let mut users = HashMap::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<User>(document) {
                Ok(user) => {
                    users.insert(user.name.clone(), user);
                }
                Err(e) => warn!("Skipping malformed user record: {}", e),
            }
        }
        info!("Loaded {} users", users.len());
        *self.users.write().await = users;
        Ok(())
    }

    pub async fn create(&self, name: &str, password: &str, flags: &str) -> Result<User, AclError> {
        if !is_valid_username(name) {
            return Err(AclError::InvalidUsername(name.to_string()));
        }
        if self.users.read().await.contains_key(name) {
            return Err(AclError::UserExists(name.to_string()));
        }

        let password_hash = self.hash_blocking(password).await?;
        let user = User {
            name: name.to_string(),
            password_hash,
            flags: flags.to_string(),
            created: Utc::now().timestamp(),
            max_download_speed: 0,
            max_upload_speed: 0,
        };

        let mut users = self.users.write().await;
        if users.contains_key(name) {
            return Err(AclError::UserExists(name.to_string()));
        }
        let document = serde_json::to_value(&user)
            .map_err(|e| DbError::InvalidDocument(e.to_string()))?;
        self.pool.insert(USERS_CONTAINER, document);
        users.insert(name.to_string(), user.clone());
        info!("Created user {}", name);
        Ok(user)
    }

    pub async fn delete(&self, name: &str) -> Result<(), AclError> {
        if self.users.write().await.remove(name).is_none() {
            return Err(AclError::UserNotFound(name.to_string()));
        }
        self.pool
            .delete(USERS_CONTAINER, query([("name", serde_json::json!(name))]));
        info!("Deleted user {}", name);
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<User> {
        self.users.read().await.get(name).cloned()
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.users.read().await.contains_key(name)
    }

    pub async fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    /// Checks `password` against the stored hash. Unknown users never verify.
    pub async fn verify(&self, name: &str, password: &str) -> bool {
        let Some(stored) = self.get(name).await.map(|user| user.password_hash) else {
            return false;
        };
        let password = password.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .unwrap_or(false)
    }

    pub async fn is_siteop(&self, name: &str) -> bool {
        self.get(name).await.map(|user| user.is_siteop()).unwrap_or(false)
    }

    pub async fn set_flags(&self, name: &str, flags: &str) -> Result<(), AclError> {
        self.modify(name, "flags", serde_json::json!(flags), |user| {
            user.flags = flags.to_string()
        })
        .await
    }

    pub async fn set_password(&self, name: &str, password: &str) -> Result<(), AclError> {
        let password_hash = self.hash_blocking(password).await?;
        let stored = password_hash.clone();
        self.modify(name, "password_hash", serde_json::json!(stored), |user| {
            user.password_hash = password_hash
        })
        .await
    }

    async fn modify<F>(
        &self,
        name: &str,
        field: &str,
        value: serde_json::Value,
        apply: F,
    ) -> Result<(), AclError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(name)
            .ok_or_else(|| AclError::UserNotFound(name.to_string()))?;
        apply(user);

        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), value);
        self.pool.update(
            USERS_CONTAINER,
            query([("name", serde_json::json!(name))]),
            fields,
        );
        Ok(())
    }

    async fn hash_blocking(&self, password: &str) -> Result<String, AclError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AclError::Hash(e.to_string()))?
    }
}
