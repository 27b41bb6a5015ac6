use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<User>, // kept in insertion order
}

/// Process-local store, used when no `DATABASE_URL` is configured and in tests.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<Inner>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.inner.read().await.rows.clone())
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: inner.next_id,
            username: new.username,
            password: new.password,
            email: new.email,
            phone: new.phone,
            address: new.address,
            created: now,
            updated: now,
        };
        inner.rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        changes.apply_to(user);
        // updated is strictly monotonic per record
        user.updated = OffsetDateTime::now_utc().max(user.updated + Duration::microseconds(1));
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|u| u.id != id);
        Ok(inner.rows.len() != before)
    }
}
