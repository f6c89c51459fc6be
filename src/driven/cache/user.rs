use sqlx::{sqlite::SqliteRow, FromRow, Row};
use std::sync::Arc;

use crate::domain::{
    user::{cache::UserDrivenCache, User},
    Result,
};

use super::SqliteCache;

pub struct SqliteUserDrivenCache {
    sqlite: Arc<SqliteCache>,
}
impl SqliteUserDrivenCache {
    pub fn new(sqlite: Arc<SqliteCache>) -> Self {
        Self { sqlite }
    }
}
#[async_trait::async_trait]
impl UserDrivenCache for SqliteUserDrivenCache {
    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
                SELECT u.id, u.name, u.apikey, u.sysadmin, u.state
                FROM "user" u
                WHERE u.name = $1;
            "#,
        )
        .bind(name)
        .fetch_optional(&self.sqlite.db)
        .await?;

        Ok(user)
    }
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
                INSERT INTO "user" (id, name, apikey, sysadmin, state)
                VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.apikey)
        .bind(user.sysadmin)
        .bind(&user.state)
        .execute(&self.sqlite.db)
        .await?;

        Ok(())
    }
}

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            apikey: row.try_get("apikey")?,
            sysadmin: row.try_get("sysadmin")?,
            state: row.try_get("state")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::user::command::fetch_site_user;

    use super::*;

    #[tokio::test]
    async fn it_should_create_user() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteUserDrivenCache::new(sqlite_cache.clone());

        let user = User::default();

        let result = cache.create(&user).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn it_should_find_user_by_name() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteUserDrivenCache::new(sqlite_cache.clone());

        let user = User::new_site_user("default");
        cache.create(&user).await.unwrap();

        let result = cache.find_by_name("default").await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn it_should_return_none_find_user_by_name() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteUserDrivenCache::new(sqlite_cache.clone());

        let result = cache.find_by_name("ghost").await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn it_should_fail_create_user_with_duplicated_name() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteUserDrivenCache::new(sqlite_cache.clone());

        cache.create(&User::default()).await.unwrap();
        let result = cache.create(&User::default()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn it_should_find_user_by_name_in_any_state() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteUserDrivenCache::new(sqlite_cache.clone());

        let user = User {
            state: "pending".into(),
            ..User::new_site_user("default")
        };
        cache.create(&user).await.unwrap();

        let result = cache.find_by_name("default").await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn it_should_reuse_site_user_that_is_not_active() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = Arc::new(SqliteUserDrivenCache::new(sqlite_cache.clone()));

        let user = User {
            state: "pending".into(),
            ..User::new_site_user("default")
        };
        cache.create(&user).await.unwrap();

        let result = fetch_site_user(cache.clone(), "default").await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().apikey, user.apikey);
    }
}
