//! In-memory user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use agora_core::error::AppError;
use agora_core::result::AppResult;
use agora_entity::user::User;

use crate::repositories::UserRepository;

/// Users keyed by ID, with a lowercase email index.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let key = email.trim().to_lowercase();
        let Some(id) = self.emails.get(&key).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(())
            }
        }
    }

    async fn record_activity(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        device_info: &serde_json::Value,
    ) -> AppResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.last_active_at = Some(at);
        user.last_device_info = Some(device_info.clone());
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use agora_entity::user::{AccountLevel, UserRole};

    use super::*;

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive_and_unique() {
        let repo = MemoryUserRepository::new();
        let user = User::new(
            "Ana@Example.com",
            "hash",
            UserRole::Member,
            AccountLevel::Basic,
            Utc::now(),
        );
        repo.insert(&user).await.unwrap();

        let found = repo.find_by_email(" ANA@example.COM ").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let dup = User::new(
            "ana@example.com",
            "hash",
            UserRole::Member,
            AccountLevel::Basic,
            Utc::now(),
        );
        assert!(repo.insert(&dup).await.is_err());
    }

    #[tokio::test]
    async fn test_record_activity_sets_device_snapshot() {
        let repo = MemoryUserRepository::new();
        let user = User::new("b@example.com", "h", UserRole::Seller, AccountLevel::Verified, Utc::now());
        repo.insert(&user).await.unwrap();

        let at = Utc::now();
        let info = serde_json::json!({ "device": "mobile" });
        repo.record_activity(user.id, at, &info).await.unwrap();

        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.last_active_at, Some(at));
        assert_eq!(stored.last_device_info, Some(info));
        assert!(repo.record_activity(Uuid::new_v4(), at, &serde_json::Value::Null).await.is_err());
    }
}
