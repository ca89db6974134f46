use crate::domain::grid::GridSize;
use crate::domain::ids::{CategoryId, PlanogramId, ProductId, UserId};
use crate::domain::model::{Category, FacingsPolicy, NewProduct, Planogram, Position, ProductPatch};
use crate::domain::ports::{CategoryDirectory, PlanogramStore};
use crate::utils::error::{EntityKind, PlanogramError, Result};

/// Engine-wide knobs, usually filled from `EngineConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnginePolicy {
    pub default_grid: GridSize,
    pub facings_policy: FacingsPolicy,
}

/// Ownership checks plus load → mutate → save around `Planogram`.
///
/// Every mutating call is one unit of work against the store. Passing
/// `expected_version` turns on a version check before the change is applied;
/// with `None` the last writer wins.
pub struct PlanogramService<S: PlanogramStore, C: CategoryDirectory> {
    store: S,
    categories: C,
    policy: EnginePolicy,
}

impl<S: PlanogramStore, C: CategoryDirectory> PlanogramService<S, C> {
    pub fn new(store: S, categories: C) -> Self {
        Self::with_policy(store, categories, EnginePolicy::default())
    }

    pub fn with_policy(store: S, categories: C, policy: EnginePolicy) -> Self {
        Self {
            store,
            categories,
            policy,
        }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn categories(&self) -> &C {
        &self.categories
    }

    pub async fn register_category(&self, user: &UserId, name: &str) -> Result<Category> {
        let category = Category::new(user.clone(), name)?;

        // 同一使用者底下名稱不分大小寫不可重複
        let wanted = category.name.to_lowercase();
        let existing = self.categories.list_by_owner(user).await?;
        if existing.iter().any(|c| c.name.to_lowercase() == wanted) {
            return Err(PlanogramError::validation(
                "name",
                &category.name,
                "Category with this name already exists",
            ));
        }

        self.categories.insert(category.clone()).await?;
        tracing::info!("Registered category {} ({}) for {}", category.id, category.name, user);
        Ok(category)
    }

    /// Deletes the category and the planogram linked to it.
    pub async fn delete_category(&self, user: &UserId, category_id: &CategoryId) -> Result<()> {
        let category = self
            .categories
            .get(category_id)
            .await?
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Category, category_id))?;
        if !category.is_owned_by(user) {
            return Err(PlanogramError::Forbidden {
                entity: EntityKind::Category,
                id: category_id.to_string(),
            });
        }

        if let Some(planogram_id) = &category.planogram_id {
            let removed = self.store.delete(planogram_id).await?;
            tracing::info!(
                "Deleted planogram {} with category {} (present: {})",
                planogram_id,
                category_id,
                removed
            );
        }
        self.categories.remove(category_id).await?;
        Ok(())
    }

    /// Category lookup filtered by owner; someone else's category reads as absent.
    async fn owned_category(&self, user: &UserId, category_id: &CategoryId) -> Result<Category> {
        self.categories
            .get(category_id)
            .await?
            .filter(|c| c.is_owned_by(user))
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Category, category_id))
    }

    pub async fn create(
        &self,
        user: &UserId,
        category_id: &CategoryId,
        grid_size: Option<GridSize>,
    ) -> Result<Planogram> {
        let category = self.owned_category(user, category_id).await?;
        if category.planogram_id.is_some() {
            return Err(PlanogramError::AlreadyExists {
                category_id: category_id.to_string(),
            });
        }

        let grid_size = grid_size.unwrap_or(self.policy.default_grid);
        let planogram = Planogram::new(category.id.clone(), Some(grid_size))?;
        self.store.save(&planogram).await?;

        if let Err(e) = self.categories.link_planogram(&category.id, &planogram.id).await {
            // 連結失敗時撤回剛建立的 planogram
            self.store.delete(&planogram.id).await?;
            return Err(e);
        }

        tracing::info!(
            "Created planogram {} ({}) for category {}",
            planogram.id,
            planogram.grid_size,
            category.id
        );
        Ok(planogram)
    }

    pub async fn get(&self, user: &UserId, category_id: &CategoryId) -> Result<Planogram> {
        let category = self.owned_category(user, category_id).await?;
        let planogram_id = category
            .planogram_id
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Planogram, category_id))?;
        self.store
            .load(&planogram_id)
            .await?
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Planogram, &planogram_id))
    }

    pub async fn get_by_id(&self, user: &UserId, planogram_id: &PlanogramId) -> Result<Planogram> {
        self.load_authorized(user, planogram_id).await
    }

    async fn load_authorized(&self, user: &UserId, planogram_id: &PlanogramId) -> Result<Planogram> {
        let planogram = self
            .store
            .load(planogram_id)
            .await?
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Planogram, planogram_id))?;

        let category = self
            .categories
            .get(&planogram.category_id)
            .await?
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Category, &planogram.category_id))?;
        if !category.is_owned_by(user) {
            return Err(PlanogramError::Forbidden {
                entity: EntityKind::Planogram,
                id: planogram_id.to_string(),
            });
        }

        Ok(planogram)
    }

    /// `apply` returns whether it changed anything; unchanged planograms are not written back.
    async fn mutate<F>(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        expected_version: Option<u64>,
        operation: &'static str,
        apply: F,
    ) -> Result<Planogram>
    where
        F: FnOnce(&mut Planogram) -> Result<bool> + Send,
    {
        let mut planogram = self.load_authorized(user, planogram_id).await?;

        if let Some(expected) = expected_version {
            if expected != planogram.version {
                tracing::debug!(
                    "{} rejected on planogram {}: expected v{}, found v{}",
                    operation,
                    planogram_id,
                    expected,
                    planogram.version
                );
                return Err(PlanogramError::Conflict {
                    expected,
                    actual: planogram.version,
                });
            }
        }

        let previous_version = planogram.version;
        let changed = match apply(&mut planogram) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::debug!("{} rejected on planogram {}: {}", operation, planogram_id, e);
                return Err(e);
            }
        };

        if changed {
            self.store.save(&planogram).await?;
            tracing::info!(
                "{} applied to planogram {} (v{} -> v{})",
                operation,
                planogram_id,
                previous_version,
                planogram.version
            );
        }
        Ok(planogram)
    }

    pub async fn resize_grid(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        rows: u32,
        cols: u32,
        expected_version: Option<u64>,
    ) -> Result<Planogram> {
        self.mutate(user, planogram_id, expected_version, "resize_grid", |p| {
            p.resize_grid(rows, cols).map(|_| true)
        })
        .await
    }

    /// The new product is the last entry of the returned planogram's products.
    pub async fn add_product(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        product: NewProduct,
        expected_version: Option<u64>,
    ) -> Result<Planogram> {
        self.mutate(user, planogram_id, expected_version, "add_product", |p| {
            p.add_product(product).map(|_| true)
        })
        .await
    }

    pub async fn update_product(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        product_id: &ProductId,
        patch: ProductPatch,
        expected_version: Option<u64>,
    ) -> Result<Planogram> {
        self.mutate(user, planogram_id, expected_version, "update_product", |p| {
            let changed = !patch.is_empty();
            p.update_product(product_id, patch)?;
            Ok(changed)
        })
        .await
    }

    pub async fn delete_product(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        product_id: &ProductId,
        expected_version: Option<u64>,
    ) -> Result<Planogram> {
        self.mutate(user, planogram_id, expected_version, "delete_product", |p| {
            Ok(p.delete_product(product_id))
        })
        .await
    }

    pub async fn update_product_positions(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        product_id: &ProductId,
        positions: Vec<Position>,
        expected_version: Option<u64>,
    ) -> Result<Planogram> {
        let policy = self.policy.facings_policy;
        self.mutate(
            user,
            planogram_id,
            expected_version,
            "update_product_positions",
            |p| {
                p.update_product_positions(product_id, positions, policy)
                    .map(|_| true)
            },
        )
        .await
    }

    pub async fn update_facings(
        &self,
        user: &UserId,
        planogram_id: &PlanogramId,
        product_id: &ProductId,
        facings: u32,
        expected_version: Option<u64>,
    ) -> Result<Planogram> {
        self.mutate(user, planogram_id, expected_version, "update_facings", |p| {
            p.update_facings(product_id, facings).map(|_| true)
        })
        .await
    }
}
