use std::sync::Arc;

use tracing::info;

use crate::domain::{error::Error, Result};

use super::{cache::UserDrivenCache, User};

pub async fn fetch_by_name(cache: Arc<dyn UserDrivenCache>, name: &str) -> Result<User> {
    let Some(user) = cache.find_by_name(name).await? else {
        return Err(Error::NotFound(format!("user {name} not found")));
    };

    Ok(user)
}

/// Returns the site-service account, creating it on first use.
pub async fn fetch_site_user(cache: Arc<dyn UserDrivenCache>, site_id: &str) -> Result<User> {
    if let Some(user) = cache.find_by_name(site_id).await? {
        return Ok(user);
    }

    let user = User::new_site_user(site_id);
    cache.create(&user).await?;
    info!(user = user.name, "site user created");

    Ok(user)
}
