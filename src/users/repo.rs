use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::repo_types::{NewUser, User, UserChanges};

/// Storage seam for the user resource. One call is one atomic write or read.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn find(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Assigns `id`, and sets `created == updated`.
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;
    /// Merge `changes` over the stored row and move `updated` forward.
    /// `None` when no row has this id; nothing is created in that case.
    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>>;
    /// `false` when no row has this id.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, email, phone, address, created, updated
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, email, phone, address, created, updated
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        // now() is fixed per transaction, so both timestamps are identical.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, email, phone, address, created, updated)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, username, password, email, phone, address, created, updated
            "#,
        )
        .bind(new.username)
        .bind(new.password)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.address)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username = COALESCE($2, username),
                   password = COALESCE($3, password),
                   email    = COALESCE($4, email),
                   phone    = COALESCE($5, phone),
                   address  = COALESCE($6, address),
                   updated  = GREATEST(now(), updated + interval '1 microsecond')
             WHERE id = $1
            RETURNING id, username, password, email, phone, address, created, updated
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.password)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.address)
        .fetch_optional(&self.db)
        .await
        .context("update user")?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected() > 0)
    }
}
