// src/services/users.rs
//! Maps verified emails to stable user ids.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::models::User;
use crate::common::{generate_user_id, safe_email_log};

#[derive(Debug, Clone)]
pub struct UserDirectory {
    db: SqlitePool,
}

impl UserDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Returns the id of the user owning `email`, creating the user on first
    /// sight.
    ///
    /// The insert and the lookup are one statement: on an email conflict the
    /// no-op update leaves the existing row (and its profile fields) as they
    /// are and hands back its id, so concurrent first sign-ins for the same
    /// email all resolve to a single row.
    pub async fn resolve_or_create(
        &self,
        email: &str,
        name: Option<&str>,
        picture_url: Option<&str>,
    ) -> Result<String, sqlx::Error> {
        let candidate_id = generate_user_id();

        let user_id: String = sqlx::query_scalar(
            r#"
            INSERT INTO users (id, email, name, avatar_url, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET email = excluded.email
            RETURNING id
            "#,
        )
        .bind(&candidate_id)
        .bind(email)
        .bind(name)
        .bind(picture_url)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.db)
        .await?;

        if user_id == candidate_id {
            info!(
                user_id = %user_id,
                email = %safe_email_log(email),
                "Created new user account"
            );
        } else {
            debug!(user_id = %user_id, "Resolved existing user account");
        }

        Ok(user_id)
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, avatar_url, created_at FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::state::test_pool;

    #[tokio::test]
    async fn test_first_sign_in_creates_user() {
        let directory = UserDirectory::new(test_pool().await);

        let id = directory
            .resolve_or_create("a@x.com", Some("Ada"), Some("https://img/a.png"))
            .await
            .unwrap();
        assert!(id.starts_with("U_"));

        let user = directory.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://img/a.png"));
    }

    #[tokio::test]
    async fn test_repeat_sign_in_keeps_id_and_profile() {
        let pool = test_pool().await;
        let directory = UserDirectory::new(pool.clone());

        let first = directory
            .resolve_or_create("a@x.com", Some("Ada"), None)
            .await
            .unwrap();
        let second = directory
            .resolve_or_create("a@x.com", Some("Ada Lovelace"), Some("https://img/new.png"))
            .await
            .unwrap();
        assert_eq!(first, second);

        let user = directory.find_by_id(&first).await.unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert_eq!(user.avatar_url, None);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_sign_ins_resolve_to_one_user() {
        let pool = test_pool().await;
        let directory = UserDirectory::new(pool.clone());

        let (a, b) = tokio::join!(
            directory.resolve_or_create("a@x.com", None, None),
            directory.resolve_or_create("a@x.com", None, None)
        );
        assert_eq!(a.unwrap(), b.unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'a@x.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let directory = UserDirectory::new(test_pool().await);
        assert!(directory.find_by_id("U_NOPE").await.unwrap().is_none());
    }
}
