use crate::domain::ids::{CategoryId, PlanogramId, UserId};
use crate::domain::model::{Category, Planogram};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Durable planogram documents, one per id. `save` replaces the whole
/// document (last write wins).
pub trait PlanogramStore: Send + Sync {
    fn load(
        &self,
        id: &PlanogramId,
    ) -> impl std::future::Future<Output = Result<Option<Planogram>>> + Send;
    fn save(&self, planogram: &Planogram) -> impl std::future::Future<Output = Result<()>> + Send;
    fn delete(&self, id: &PlanogramId) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Categories owned by users; the engine only needs ownership and the
/// planogram back-reference.
#[async_trait]
pub trait CategoryDirectory: Send + Sync {
    async fn get(&self, id: &CategoryId) -> Result<Option<Category>>;
    async fn insert(&self, category: Category) -> Result<()>;
    async fn link_planogram(&self, id: &CategoryId, planogram_id: &PlanogramId) -> Result<()>;
    async fn remove(&self, id: &CategoryId) -> Result<Option<Category>>;
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Category>>;
}
