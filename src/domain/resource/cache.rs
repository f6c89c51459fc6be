use crate::domain::Result;

use super::Resource;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ResourceDrivenCache: Send + Sync {
    async fn find(&self, package_id: Option<String>) -> Result<Vec<Resource>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Resource>>;
    async fn create(&self, resource: &Resource) -> Result<()>;
}
