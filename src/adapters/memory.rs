use crate::domain::ids::{CategoryId, PlanogramId, UserId};
use crate::domain::model::{Category, Planogram};
use crate::domain::ports::{CategoryDirectory, PlanogramStore};
use crate::utils::error::{EntityKind, PlanogramError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local planogram store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanogramStore {
    planograms: Arc<Mutex<HashMap<PlanogramId, Planogram>>>,
}

impl InMemoryPlanogramStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.planograms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.planograms.lock().await.is_empty()
    }
}

impl PlanogramStore for InMemoryPlanogramStore {
    async fn load(&self, id: &PlanogramId) -> Result<Option<Planogram>> {
        let planograms = self.planograms.lock().await;
        Ok(planograms.get(id).cloned())
    }

    async fn save(&self, planogram: &Planogram) -> Result<()> {
        let mut planograms = self.planograms.lock().await;
        planograms.insert(planogram.id.clone(), planogram.clone());
        Ok(())
    }

    async fn delete(&self, id: &PlanogramId) -> Result<bool> {
        let mut planograms = self.planograms.lock().await;
        Ok(planograms.remove(id).is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryDirectory {
    categories: Arc<Mutex<HashMap<CategoryId, Category>>>,
}

impl InMemoryCategoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryDirectory for InMemoryCategoryDirectory {
    async fn get(&self, id: &CategoryId) -> Result<Option<Category>> {
        let categories = self.categories.lock().await;
        Ok(categories.get(id).cloned())
    }

    async fn insert(&self, category: Category) -> Result<()> {
        let mut categories = self.categories.lock().await;
        categories.insert(category.id.clone(), category);
        Ok(())
    }

    async fn link_planogram(&self, id: &CategoryId, planogram_id: &PlanogramId) -> Result<()> {
        let mut categories = self.categories.lock().await;
        let category = categories
            .get_mut(id)
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Category, id))?;
        category.planogram_id = Some(planogram_id.clone());
        category.last_modified = Utc::now();
        Ok(())
    }

    async fn remove(&self, id: &CategoryId) -> Result<Option<Category>> {
        let mut categories = self.categories.lock().await;
        Ok(categories.remove(id))
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Category>> {
        let categories = self.categories.lock().await;
        let mut owned: Vec<Category> = categories
            .values()
            .filter(|c| c.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(owned)
    }
}
