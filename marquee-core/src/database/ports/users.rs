use async_trait::async_trait;
use marquee_model::{User, UserID};

use crate::error::Result;
use crate::query::PageWindow;

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Fails with a conflict when the username is taken.
    async fn insert(&self, user: &User) -> Result<()>;
    async fn get(&self, id: UserID) -> Result<Option<User>>;
    async fn count(&self) -> Result<u64>;
    async fn list(&self, window: PageWindow) -> Result<Vec<User>>;
    /// Every user with an email address on file.
    async fn list_notifiable(&self) -> Result<Vec<User>>;
}
