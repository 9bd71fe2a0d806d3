//! In-process stores for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use learnmart_models::PendingSignup;
use uuid::Uuid;

use crate::{CacheError, EventPublisher, OtpStore, SessionStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct MemoryOtpStore {
    entries: Arc<Mutex<HashMap<String, (PendingSignup, Instant)>>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self, email: &str) -> Option<(PendingSignup, Instant)> {
        let mut entries = lock(&self.entries);
        match entries.get(email) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(email);
                None
            }
            other => other.cloned(),
        }
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, pending: &PendingSignup, ttl: Duration) -> Result<(), CacheError> {
        lock(&self.entries).insert(pending.email.clone(), (pending.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingSignup>, CacheError> {
        Ok(self.live(email).map(|(pending, _)| pending))
    }

    async fn remaining(&self, email: &str) -> Result<Option<Duration>, CacheError> {
        Ok(self
            .live(email)
            .map(|(_, expires_at)| expires_at.saturating_duration_since(Instant::now())))
    }

    async fn delete(&self, email: &str) -> Result<(), CacheError> {
        lock(&self.entries).remove(email);
        Ok(())
    }
}

#[derive(Default)]
struct Sessions {
    owners: HashMap<String, (Uuid, Instant)>,
    by_user: HashMap<Uuid, HashSet<String>>,
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<Sessions>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self, user_id: Uuid) -> usize {
        let sessions = lock(&self.sessions);
        let now = Instant::now();
        sessions
            .owners
            .values()
            .filter(|(owner, expires_at)| *owner == user_id && *expires_at > now)
            .count()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, jti: &str, user_id: Uuid, ttl: Duration) -> Result<(), CacheError> {
        let mut sessions = lock(&self.sessions);
        sessions
            .owners
            .insert(jti.to_string(), (user_id, Instant::now() + ttl));
        sessions.by_user.entry(user_id).or_default().insert(jti.to_string());
        Ok(())
    }

    async fn find(&self, jti: &str) -> Result<Option<Uuid>, CacheError> {
        let sessions = lock(&self.sessions);
        Ok(sessions
            .owners
            .get(jti)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(owner, _)| *owner))
    }

    async fn revoke(&self, jti: &str) -> Result<(), CacheError> {
        let mut sessions = lock(&self.sessions);
        if let Some((owner, _)) = sessions.owners.remove(jti)
            && let Some(set) = sessions.by_user.get_mut(&owner)
        {
            set.remove(jti);
        }
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<(), CacheError> {
        let mut sessions = lock(&self.sessions);
        let jtis = sessions.by_user.remove(&user_id).unwrap_or_default();
        for jti in jtis {
            sessions.owners.remove(&jti);
        }
        Ok(())
    }
}

/// Records every published `(channel, payload)` pair.
#[derive(Clone, Default)]
pub struct MemoryPublisher {
    published: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        lock(&self.published).clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), CacheError> {
        lock(&self.published).push((channel.to_string(), payload));
        Ok(())
    }
}
