use anyhow::{bail, Result};
use std::{path::Path, sync::Arc};
use tracing::info;

use crate::{
    domain::{
        archiver::{command::dispatch, ArchiverConfig},
        resource::{cache::ResourceDrivenCache, Resource},
    },
    driven::{
        cache::{resource::SqliteResourceDrivenCache, user::SqliteUserDrivenCache, SqliteCache},
        celery::CeleryAmqpQueue,
    },
};

/// Which stored resources to send for archival again.
#[derive(Debug, Clone)]
pub enum UpdateTarget {
    All,
    Package(String),
    Resource(String),
}

pub async fn run(config: UpdateConfig, target: UpdateTarget) -> Result<()> {
    let sqlite_cache = Arc::new(SqliteCache::new(Path::new(&config.db_path)).await?);
    sqlite_cache.migrate().await?;

    let user_cache = Arc::new(SqliteUserDrivenCache::new(sqlite_cache.clone()));
    let resource_cache = Arc::new(SqliteResourceDrivenCache::new(sqlite_cache.clone()));
    let queue = Arc::new(CeleryAmqpQueue::new(&config.broker_url).await?);
    let archiver = Arc::new(config.archiver);

    let resources = find_resources(resource_cache, &target).await?;
    info!(?target, total = resources.len(), "archiving resources");

    for resource in resources.iter() {
        // no request user here, tasks run as the site user
        dispatch(
            archiver.clone(),
            user_cache.clone(),
            queue.clone(),
            resource,
            None,
        )
        .await?;
        info!(resource = resource.id, url = resource.url, "resource queued");
    }

    Ok(())
}

async fn find_resources(
    cache: Arc<dyn ResourceDrivenCache>,
    target: &UpdateTarget,
) -> Result<Vec<Resource>> {
    let resources = match target {
        UpdateTarget::All => cache.find(None).await?,
        UpdateTarget::Package(package_id) => cache.find(Some(package_id.clone())).await?,
        UpdateTarget::Resource(id) => {
            let Some(resource) = cache.find_by_id(id).await? else {
                bail!("resource {id} not found");
            };
            vec![resource]
        }
    };

    Ok(resources)
}

pub struct UpdateConfig {
    pub db_path: String,
    pub broker_url: String,
    pub archiver: ArchiverConfig,
}
