use async_trait::async_trait;
use marquee_model::UserVisit;

use crate::error::Result;
use crate::query::PageWindow;

#[async_trait]
pub trait VisitsRepository: Send + Sync {
    async fn record(&self, visit: &UserVisit) -> Result<()>;
    async fn count(&self) -> Result<u64>;
    /// Most recent first.
    async fn list(&self, window: PageWindow) -> Result<Vec<UserVisit>>;
}
