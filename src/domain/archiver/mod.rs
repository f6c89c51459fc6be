use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    event::{DomainEventHandler, DomainObjectModified, ResourceUrlChanged},
    task::TaskDrivenQueue,
    user::cache::UserDrivenCache,
    Result,
};

pub mod command;

pub const DEFAULT_SITE_ID: &str = "default";
const HOST_KEY_PREFIX: &str = "ckan.";

/// Host settings the dispatcher needs, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiverConfig {
    pub site_url: Option<String>,
    pub cache_url_root: Option<String>,
    pub site_id: String,
}
impl ArchiverConfig {
    /// Keys are accepted with or without the `ckan.` prefix. Missing or empty
    /// values are left unset.
    pub fn from_host(config: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            config
                .get(&format!("{HOST_KEY_PREFIX}{key}"))
                .or_else(|| config.get(key))
                .filter(|value| !value.is_empty())
                .cloned()
        };

        Self {
            site_url: get("site_url_internally").or_else(|| get("site_url")),
            cache_url_root: get("cache_url_root"),
            site_id: get("site_id").unwrap_or_else(|| DEFAULT_SITE_ID.into()),
        }
    }
}

/// Credentials and locations the archive worker acts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchContext {
    pub site_url: Option<String>,
    pub apikey: String,
    pub username: String,
    pub cache_url_root: Option<String>,
    pub site_user_apikey: String,
}

pub struct Dispatcher {
    config: Arc<ArchiverConfig>,
    user_cache: Arc<dyn UserDrivenCache>,
    queue: Arc<dyn TaskDrivenQueue>,
}
impl Dispatcher {
    pub fn new(
        config: Arc<ArchiverConfig>,
        user_cache: Arc<dyn UserDrivenCache>,
        queue: Arc<dyn TaskDrivenQueue>,
    ) -> Self {
        Self {
            config,
            user_cache,
            queue,
        }
    }
}
#[async_trait::async_trait]
impl DomainEventHandler for Dispatcher {
    async fn on_domain_object_modification(&self, evt: DomainObjectModified) -> Result<()> {
        command::notify(
            self.config.clone(),
            self.user_cache.clone(),
            self.queue.clone(),
            evt,
        )
        .await
    }

    async fn on_resource_url_change(&self, evt: ResourceUrlChanged) -> Result<()> {
        command::notify_url_change(
            self.config.clone(),
            self.user_cache.clone(),
            self.queue.clone(),
            evt,
        )
        .await
    }
}
