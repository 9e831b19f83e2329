//! In-memory session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use agora_core::error::AppError;
use agora_core::result::AppResult;
use agora_entity::session::Session;

use crate::repositories::SessionRepository;

/// Sessions keyed by ID with secondary indexes on user and token hash.
///
/// Index maps are always locked after `sessions` is released, never while a
/// `sessions` guard is alive.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<Uuid, Session>,
    by_user: DashMap<Uuid, Vec<Uuid>>,
    by_token: DashMap<String, Uuid>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored sessions, including revoked ones.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session_ids(&self, user_id: Uuid) -> Vec<Uuid> {
        self.by_user
            .get(&user_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    fn active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Vec<Session> {
        self.session_ids(user_id)
            .into_iter()
            .filter_map(|id| self.sessions.get(&id).map(|s| s.clone()))
            .filter(|s| s.is_active_at(now))
            .collect()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, session: &Session) -> AppResult<()> {
        match self.by_token.entry(session.token_hash.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict("Session token already exists"));
            }
            Entry::Vacant(slot) => {
                slot.insert(session.id);
            }
        }
        self.sessions.insert(session.id, session.clone());
        self.by_user
            .entry(session.user_id)
            .or_default()
            .push(session.id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        let Some(id) = self.by_token.get(token_hash).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        let mut active = self.active_for_user(user_id, now);
        active.sort_by(|a, b| {
            b.last_active
                .cmp(&a.last_active)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(active)
    }

    async fn count_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.active_for_user(user_id, now).len() as u64)
    }

    async fn find_least_recently_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<Session>> {
        Ok(self
            .active_for_user(user_id, now)
            .into_iter()
            .filter(|s| Some(s.id) != exclude)
            .min_by(|a, b| {
                a.last_active
                    .cmp(&b.last_active)
                    .then(a.created_at.cmp(&b.created_at))
            }))
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            if !session.is_revoked && at > session.last_active {
                session.last_active = at;
            }
        }
        Ok(())
    }

    async fn revoke(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        Ok(self
            .sessions
            .get_mut(&id)
            .map(|mut s| s.revoke(at))
            .unwrap_or(false))
    }

    async fn revoke_all_by_user(
        &self,
        user_id: Uuid,
        except: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut revoked = 0;
        for id in self.session_ids(user_id) {
            if Some(id) == except {
                continue;
            }
            if let Some(mut session) = self.sessions.get_mut(&id) {
                if session.is_active_at(at) && session.revoke(at) {
                    revoked += 1;
                }
            }
        }
        Ok(revoked)
    }

    async fn revoke_expired(&self, user_id: Option<Uuid>, now: DateTime<Utc>) -> AppResult<u64> {
        let mut revoked = 0;
        match user_id {
            Some(user_id) => {
                for id in self.session_ids(user_id) {
                    if let Some(mut session) = self.sessions.get_mut(&id) {
                        if session.is_sweepable_at(now) && session.revoke(now) {
                            revoked += 1;
                        }
                    }
                }
            }
            None => {
                for mut session in self.sessions.iter_mut() {
                    if session.is_sweepable_at(now) && session.revoke(now) {
                        revoked += 1;
                    }
                }
            }
        }
        Ok(revoked)
    }

    async fn purge_ended(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let ended: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|s| s.ended_at() <= cutoff)
            .map(|s| s.id)
            .collect();

        let mut purged = 0;
        for id in ended {
            let Some((_, session)) = self
                .sessions
                .remove_if(&id, |_, s| s.ended_at() <= cutoff)
            else {
                continue;
            };
            self.by_token.remove(&session.token_hash);
            if let Entry::Occupied(mut ids) = self.by_user.entry(session.user_id) {
                ids.get_mut().retain(|other| *other != id);
                if ids.get().is_empty() {
                    let _ = ids.remove();
                }
            }
            purged += 1;
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use agora_entity::session::ClientInfo;

    use super::*;

    fn session(user_id: Uuid, token: &str, now: DateTime<Utc>) -> Session {
        Session::new(user_id, token, &ClientInfo::default(), now, Duration::hours(24))
    }

    #[tokio::test]
    async fn test_duplicate_token_hash_is_rejected() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        repo.insert(&session(user, "same", now)).await.unwrap();

        let err = repo.insert(&session(user, "same", now)).await.unwrap_err();
        assert_eq!(err.kind, agora_core::ErrorKind::Conflict);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_active_listing_is_ordered_by_last_active_desc() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let a = session(user, "a", now);
        let b = session(user, "b", now);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        repo.touch(a.id, now + Duration::minutes(5)).await.unwrap();

        let listed = repo.find_active_by_user(user, now).await.unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a.id, b.id]);

        let lru = repo.find_least_recently_active(user, now, None).await.unwrap();
        assert_eq!(lru.map(|s| s.id), Some(b.id));
        let lru = repo
            .find_least_recently_active(user, now, Some(b.id))
            .await
            .unwrap();
        assert_eq!(lru.map(|s| s.id), Some(a.id));
    }

    #[tokio::test]
    async fn test_touch_never_moves_backwards_or_revives() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let s = session(Uuid::new_v4(), "t", now);
        repo.insert(&s).await.unwrap();

        repo.touch(s.id, now - Duration::minutes(1)).await.unwrap();
        assert_eq!(repo.find_by_id(s.id).await.unwrap().unwrap().last_active, now);

        assert!(repo.revoke(s.id, now).await.unwrap());
        assert!(!repo.revoke(s.id, now).await.unwrap());
        repo.touch(s.id, now + Duration::minutes(1)).await.unwrap();
        let stored = repo.find_by_token_hash("t").await.unwrap().unwrap();
        assert!(stored.is_revoked);
        assert_eq!(stored.last_active, now);
    }

    #[tokio::test]
    async fn test_revoke_all_keeps_the_excepted_session() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let keep = session(user, "keep", now);
        repo.insert(&keep).await.unwrap();
        repo.insert(&session(user, "x", now)).await.unwrap();
        repo.insert(&session(user, "y", now)).await.unwrap();
        repo.insert(&session(Uuid::new_v4(), "other", now)).await.unwrap();

        let revoked = repo.revoke_all_by_user(user, Some(keep.id), now).await.unwrap();
        assert_eq!(revoked, 2);
        assert_eq!(repo.count_active_by_user(user, now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoke_expired_skips_live_sessions() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let old = session(user, "old", now - Duration::hours(30));
        let live = session(user, "live", now);
        repo.insert(&old).await.unwrap();
        repo.insert(&live).await.unwrap();

        assert_eq!(repo.revoke_expired(None, now).await.unwrap(), 1);
        assert!(repo.find_by_id(old.id).await.unwrap().unwrap().is_revoked);
        assert!(!repo.find_by_id(live.id).await.unwrap().unwrap().is_revoked);
        assert_eq!(repo.revoke_expired(Some(user), now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_ended_drops_sessions_and_indexes() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let expired = session(user, "expired", now - Duration::hours(48));
        let revoked = session(user, "revoked", now - Duration::hours(2));
        let live = session(user, "live", now);
        repo.insert(&expired).await.unwrap();
        repo.insert(&revoked).await.unwrap();
        repo.insert(&live).await.unwrap();
        repo.revoke(revoked.id, now - Duration::hours(1)).await.unwrap();

        // Only the session that ended before the cutoff goes.
        assert_eq!(repo.purge_ended(now - Duration::hours(12)).await.unwrap(), 1);
        assert_eq!(repo.len(), 2);
        assert!(repo.find_by_token_hash("expired").await.unwrap().is_none());

        assert_eq!(repo.purge_ended(now).await.unwrap(), 1);
        assert_eq!(repo.len(), 1);
        assert!(repo.find_by_id(revoked.id).await.unwrap().is_none());
        assert!(repo.find_by_token_hash("revoked").await.unwrap().is_none());

        // The freed token hash can be issued again and the user index is intact.
        repo.insert(&session(user, "revoked", now)).await.unwrap();
        assert_eq!(repo.count_active_by_user(user, now).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purging_last_session_clears_user_index() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        repo.insert(&session(user, "only", now - Duration::hours(48))).await.unwrap();

        assert_eq!(repo.purge_ended(now).await.unwrap(), 1);
        assert!(repo.is_empty());
        assert!(repo.by_user.is_empty());
        assert!(repo.by_token.is_empty());
    }
}
