use crate::domain::Result;

use super::User;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserDrivenCache: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<User>>;
    async fn create(&self, user: &User) -> Result<()>;
}
