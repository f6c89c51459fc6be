use sqlx::{sqlite::SqliteRow, FromRow, Row};
use std::sync::Arc;

use crate::domain::{
    resource::{cache::ResourceDrivenCache, Resource},
    Result,
};

use super::SqliteCache;

const RESOURCE_COLUMNS: &str = r#"
    r.id, r.package_id, r.url, r.format, r.description, r.hash, r.name,
    r.resource_type, r.mimetype, r.mimetype_inner, r.size, r.position,
    r.created, r.last_modified, r.cache_url, r.cache_last_updated,
    r.url_type, r.state, r.extras
"#;

pub struct SqliteResourceDrivenCache {
    sqlite: Arc<SqliteCache>,
}
impl SqliteResourceDrivenCache {
    pub fn new(sqlite: Arc<SqliteCache>) -> Self {
        Self { sqlite }
    }
}
#[async_trait::async_trait]
impl ResourceDrivenCache for SqliteResourceDrivenCache {
    async fn find(&self, package_id: Option<String>) -> Result<Vec<Resource>> {
        let query = format!(
            r#"
                SELECT {RESOURCE_COLUMNS}
                FROM resource r
                WHERE r.state = 'active' AND ($1 IS NULL OR r.package_id = $1)
                ORDER BY r.package_id, r.position;
            "#
        );

        let resources = sqlx::query_as::<_, Resource>(&query)
            .bind(package_id)
            .fetch_all(&self.sqlite.db)
            .await?;

        Ok(resources)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Resource>> {
        let query = format!(
            r#"
                SELECT {RESOURCE_COLUMNS}
                FROM resource r
                WHERE r.id = $1;
            "#
        );

        let resource = sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(&self.sqlite.db)
            .await?;

        Ok(resource)
    }
    async fn create(&self, resource: &Resource) -> Result<()> {
        let extras = serde_json::to_string(&resource.extras)?;

        sqlx::query(
            r#"
                INSERT INTO resource (
                    id, package_id, url, format, description, hash, name,
                    resource_type, mimetype, mimetype_inner, size, position,
                    created, last_modified, cache_url, cache_last_updated,
                    url_type, state, extras
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(&resource.id)
        .bind(&resource.package_id)
        .bind(&resource.url)
        .bind(&resource.format)
        .bind(&resource.description)
        .bind(&resource.hash)
        .bind(&resource.name)
        .bind(&resource.resource_type)
        .bind(&resource.mimetype)
        .bind(&resource.mimetype_inner)
        .bind(resource.size)
        .bind(resource.position)
        .bind(resource.created)
        .bind(resource.last_modified)
        .bind(&resource.cache_url)
        .bind(resource.cache_last_updated)
        .bind(&resource.url_type)
        .bind(resource.state.to_string())
        .bind(extras)
        .execute(&self.sqlite.db)
        .await?;

        Ok(())
    }
}

impl FromRow<'_, SqliteRow> for Resource {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let state: String = row.try_get("state")?;
        let extras: String = row.try_get("extras")?;

        Ok(Self {
            id: row.try_get("id")?,
            package_id: row.try_get("package_id")?,
            url: row.try_get("url")?,
            format: row.try_get("format")?,
            description: row.try_get("description")?,
            hash: row.try_get("hash")?,
            name: row.try_get("name")?,
            resource_type: row.try_get("resource_type")?,
            mimetype: row.try_get("mimetype")?,
            mimetype_inner: row.try_get("mimetype_inner")?,
            size: row.try_get("size")?,
            position: row.try_get("position")?,
            created: row.try_get("created")?,
            last_modified: row.try_get("last_modified")?,
            cache_url: row.try_get("cache_url")?,
            cache_last_updated: row.try_get("cache_last_updated")?,
            url_type: row.try_get("url_type")?,
            state: state
                .parse()
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            extras: serde_json::from_str(&extras).map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::Value;

    use crate::domain::resource::ResourceState;

    use super::*;

    async fn mock_resource(cache: &SqliteResourceDrivenCache, package_id: &str) -> Resource {
        let resource = Resource {
            package_id: package_id.into(),
            ..Default::default()
        };
        cache.create(&resource).await.unwrap();
        resource
    }

    #[tokio::test]
    async fn it_should_create_resource() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteResourceDrivenCache::new(sqlite_cache.clone());

        let result = cache.create(&Resource::default()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn it_should_find_resource_by_id() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteResourceDrivenCache::new(sqlite_cache.clone());

        let mut resource = Resource {
            created: NaiveDate::from_ymd_opt(2024, 9, 1).and_then(|d| d.and_hms_opt(10, 30, 0)),
            size: Some(2048),
            ..Default::default()
        };
        resource
            .extras
            .insert("licence".into(), Value::String("odc-by".into()));
        cache.create(&resource).await.unwrap();

        let result = cache.find_by_id(&resource.id).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Some(resource));
    }

    #[tokio::test]
    async fn it_should_return_none_find_resource_by_id() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteResourceDrivenCache::new(sqlite_cache.clone());

        let result = cache.find_by_id("missing").await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn it_should_find_package_resources() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteResourceDrivenCache::new(sqlite_cache.clone());

        mock_resource(&cache, "p1").await;
        mock_resource(&cache, "p1").await;
        mock_resource(&cache, "p2").await;

        let result = cache.find(Some("p1".into())).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 2);

        let result = cache.find(None).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn it_should_skip_deleted_resources() {
        let sqlite_cache = Arc::new(SqliteCache::ephemeral().await.unwrap());
        let cache = SqliteResourceDrivenCache::new(sqlite_cache.clone());

        mock_resource(&cache, "p1").await;
        let deleted = Resource {
            package_id: "p1".into(),
            state: ResourceState::Deleted,
            ..Default::default()
        };
        cache.create(&deleted).await.unwrap();

        let result = cache.find(Some("p1".into())).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 1);
    }
}
