use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    event::{DomainObject, DomainObjectModified, DomainObjectOperation, ResourceUrlChanged},
    resource::Resource,
    task::{TaskDrivenQueue, TaskPayload},
    user::{cache::UserDrivenCache, command as user},
    Result,
};

use super::{ArchiverConfig, DispatchContext};

/// Generic modification channel. Only resource creations are archived: the
/// worker writes the cache url back onto the resource, and the resulting
/// `changed` notification must not queue another task.
pub async fn notify(
    config: Arc<ArchiverConfig>,
    user_cache: Arc<dyn UserDrivenCache>,
    queue: Arc<dyn TaskDrivenQueue>,
    evt: DomainObjectModified,
) -> Result<()> {
    let DomainObject::Resource(resource) = evt.entity else {
        debug!(kind = evt.entity.kind(), "ignoring non-resource event");
        return Ok(());
    };

    debug!(
        resource = resource.id,
        operation = evt.operation.as_ref().map(|o| o.to_string()),
        "notified of resource event"
    );

    match evt.operation {
        Some(DomainObjectOperation::New) | None => {
            dispatch(config, user_cache, queue, &resource, evt.actor.as_deref()).await
        }
        Some(operation) => {
            debug!(
                resource = resource.id,
                %operation,
                "ignoring resource event because of its operation"
            );
            Ok(())
        }
    }
}

/// URL change channel. Always archived.
pub async fn notify_url_change(
    config: Arc<ArchiverConfig>,
    user_cache: Arc<dyn UserDrivenCache>,
    queue: Arc<dyn TaskDrivenQueue>,
    evt: ResourceUrlChanged,
) -> Result<()> {
    debug!(resource = evt.resource.id, "notified of resource url change");

    dispatch(config, user_cache, queue, &evt.resource, evt.actor.as_deref()).await
}

/// Queues one archive task for `resource`. Without an `actor` the task runs
/// as the site user.
pub async fn dispatch(
    config: Arc<ArchiverConfig>,
    user_cache: Arc<dyn UserDrivenCache>,
    queue: Arc<dyn TaskDrivenQueue>,
    resource: &Resource,
    actor: Option<&str>,
) -> Result<()> {
    let site_user = user::fetch_site_user(user_cache.clone(), &config.site_id).await?;

    let (username, apikey) = match actor {
        Some(name) => {
            let user = user::fetch_by_name(user_cache.clone(), name).await?;
            (user.name, user.apikey)
        }
        None => (site_user.name.clone(), site_user.apikey.clone()),
    };

    let context = DispatchContext {
        site_url: config.site_url.clone(),
        apikey,
        username,
        cache_url_root: config.cache_url_root.clone(),
        site_user_apikey: site_user.apikey.clone(),
    };

    let task = TaskPayload::archive(
        serde_json::to_string(&context)?,
        serde_json::to_string(resource)?,
    );

    queue.send_task(&task).await?;
    debug!(
        queue = task.queue,
        task = task.task_id,
        resource = resource.id,
        url = resource.url,
        user = context.username,
        site_user = site_user.name,
        site_url = config.site_url,
        "archival of resource put into task queue"
    );

    Ok(())
}
