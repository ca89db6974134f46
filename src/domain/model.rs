use crate::domain::grid::{self, OccupancyIndex};
use crate::domain::ids::{CategoryId, PlanogramId, ProductId, UserId};
use crate::utils::error::{EntityKind, PlanogramError, Result};
use crate::utils::validation::{
    validate_finite, validate_non_empty_string, validate_positive_number, validate_range,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::domain::grid::{GridSize, Position};

pub const MIN_FACINGS: u32 = 1;
pub const MAX_GP_PERCENT: f64 = 100.0;

/// A product placed on a planogram. Only exists inside its planogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub mrp: f64,
    pub gp: f64,
    pub facings: u32,
    #[serde(default)]
    pub positions: Vec<Position>,
}

/// Input for `Planogram::add_product`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub mrp: f64,
    pub gp: f64,
    pub facings: u32,
    #[serde(default)]
    pub positions: Vec<Position>,
}

/// Metadata edit: only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub mrp: Option<f64>,
    pub gp: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.mrp.is_none() && self.gp.is_none()
    }
}

/// Whether replacing a product's positions re-checks `positions <= facings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingsPolicy {
    /// Every mutation keeps `positions <= facings`.
    #[default]
    Enforce,
    /// Only `add_product` checks the bound; repositioning may exceed it.
    AddOnly,
}

fn validate_name(name: &str) -> Result<String> {
    validate_non_empty_string("name", name)?;
    Ok(name.trim().to_string())
}

fn validate_mrp(mrp: f64) -> Result<()> {
    validate_finite("mrp", mrp)?;
    if mrp < 0.0 {
        return Err(PlanogramError::validation("mrp", mrp, "MRP cannot be negative"));
    }
    Ok(())
}

fn validate_gp(gp: f64) -> Result<()> {
    validate_finite("gp", gp)?;
    validate_range("gp", gp, 0.0, MAX_GP_PERCENT)
}

fn validate_facings(facings: u32) -> Result<()> {
    validate_positive_number("facings", facings, MIN_FACINGS)
}

fn ensure_facings_cover(facings: u32, positions: usize) -> Result<()> {
    if positions > facings as usize {
        return Err(PlanogramError::InvalidFacings { facings, positions });
    }
    Ok(())
}

/// Shelf layout for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planogram {
    pub id: PlanogramId,
    pub category_id: CategoryId,
    pub grid_size: GridSize,
    #[serde(default)]
    pub products: Vec<Product>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Planogram {
    /// Empty planogram at version 1; the grid defaults to 4x4 and must be at least 2x2.
    pub fn new(category_id: CategoryId, grid_size: Option<GridSize>) -> Result<Self> {
        let grid_size = grid_size.unwrap_or_default();
        if !grid_size.is_valid() {
            return Err(PlanogramError::validation(
                "gridSize",
                grid_size,
                "grid needs at least 2 rows and 2 columns",
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: PlanogramId::generate(),
            category_id,
            grid_size,
            products: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == product_id)
    }

    fn product_index(&self, product_id: &ProductId) -> Result<usize> {
        self.products
            .iter()
            .position(|p| &p.id == product_id)
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Product, product_id))
    }

    pub fn occupancy(&self) -> OccupancyIndex {
        OccupancyIndex::build(&self.products)
    }

    pub fn max_occupied_dimensions(&self) -> (u32, u32) {
        grid::max_occupied_dimensions(&self.products)
    }

    pub fn validate_grid_resize(&self, rows: u32, cols: u32) -> bool {
        let (max_row, max_col) = self.max_occupied_dimensions();
        rows > max_row && cols > max_col
    }

    pub fn is_position_occupied(&self, position: Position, exclude: Option<&ProductId>) -> bool {
        grid::is_position_occupied(&self.products, position, exclude)
    }

    pub fn validate_positions(&self, product_id: Option<&ProductId>, positions: &[Position]) -> bool {
        grid::validate_positions(self.grid_size, &self.products, product_id, positions)
    }

    fn check_positions(&self, product_id: Option<&ProductId>, positions: &[Position]) -> Result<()> {
        grid::check_positions(self.grid_size, &self.products, product_id, positions)?;
        Ok(())
    }

    /// Records a structural change: products or grid size.
    fn commit(&mut self) {
        self.version += 1;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn resize_grid(&mut self, rows: u32, cols: u32) -> Result<()> {
        let grid_size = GridSize::new(rows, cols).ok_or_else(|| PlanogramError::InvalidResize {
            rows,
            cols,
            reason: format!("grid needs at least {} rows and columns", grid::MIN_GRID_DIMENSION),
        })?;

        if !self.validate_grid_resize(rows, cols) {
            let (max_row, max_col) = self.max_occupied_dimensions();
            return Err(PlanogramError::InvalidResize {
                rows,
                cols,
                reason: format!(
                    "products occupy up to row {} and column {}",
                    max_row, max_col
                ),
            });
        }

        self.grid_size = grid_size;
        self.commit();
        Ok(())
    }

    pub fn add_product(&mut self, new_product: NewProduct) -> Result<ProductId> {
        let name = validate_name(&new_product.name)?;
        validate_mrp(new_product.mrp)?;
        validate_gp(new_product.gp)?;
        validate_facings(new_product.facings)?;
        self.check_positions(None, &new_product.positions)?;
        ensure_facings_cover(new_product.facings, new_product.positions.len())?;

        let id = ProductId::generate();
        self.products.push(Product {
            id: id.clone(),
            name,
            mrp: new_product.mrp,
            gp: new_product.gp,
            facings: new_product.facings,
            positions: new_product.positions,
        });
        self.commit();
        Ok(id)
    }

    /// Metadata-only edit; leaves `version` alone.
    pub fn update_product(&mut self, product_id: &ProductId, patch: ProductPatch) -> Result<()> {
        let index = self.product_index(product_id)?;

        let name = patch.name.as_deref().map(validate_name).transpose()?;
        if let Some(mrp) = patch.mrp {
            validate_mrp(mrp)?;
        }
        if let Some(gp) = patch.gp {
            validate_gp(gp)?;
        }

        let changed = !patch.is_empty();
        let product = &mut self.products[index];
        if let Some(name) = name {
            product.name = name;
        }
        if let Some(mrp) = patch.mrp {
            product.mrp = mrp;
        }
        if let Some(gp) = patch.gp {
            product.gp = gp;
        }
        if changed {
            self.touch();
        }
        Ok(())
    }

    /// Removes the product if present. Returns whether anything was removed.
    pub fn delete_product(&mut self, product_id: &ProductId) -> bool {
        let before = self.products.len();
        self.products.retain(|p| &p.id != product_id);
        let removed = self.products.len() != before;
        if removed {
            self.commit();
        }
        removed
    }

    pub fn update_product_positions(
        &mut self,
        product_id: &ProductId,
        positions: Vec<Position>,
        policy: FacingsPolicy,
    ) -> Result<()> {
        let index = self.product_index(product_id)?;
        self.check_positions(Some(product_id), &positions)?;
        if policy == FacingsPolicy::Enforce {
            ensure_facings_cover(self.products[index].facings, positions.len())?;
        }

        self.products[index].positions = positions;
        self.commit();
        Ok(())
    }

    pub fn update_facings(&mut self, product_id: &ProductId, facings: u32) -> Result<()> {
        let index = self.product_index(product_id)?;
        validate_facings(facings)?;
        ensure_facings_cover(facings, self.products[index].positions.len())?;

        self.products[index].facings = facings;
        self.commit();
        Ok(())
    }

    /// Full consistency check of grid size, bounds, cell exclusivity and facings.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if !self.grid_size.is_valid() {
            return Err(format!("grid size {} below minimum", self.grid_size));
        }
        if self.version == 0 {
            return Err("version must start at 1".to_string());
        }

        let mut seen = std::collections::HashMap::new();
        for product in &self.products {
            if product.positions.len() > product.facings as usize {
                return Err(format!(
                    "product {} holds {} positions with {} facings",
                    product.id,
                    product.positions.len(),
                    product.facings
                ));
            }
            for position in &product.positions {
                if !self.grid_size.contains(*position) {
                    return Err(format!(
                        "product {} is outside the grid at {}",
                        product.id, position
                    ));
                }
                if let Some(owner) = seen.insert(*position, &product.id) {
                    return Err(format!(
                        "cell {} held by both {} and {}",
                        position, owner, product.id
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Category as seen by the engine: owner plus the back-reference to its planogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub owner: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planogram_id: Option<PlanogramId>,
    pub last_modified: DateTime<Utc>,
}

impl Category {
    pub fn new(owner: UserId, name: &str) -> Result<Self> {
        Ok(Self {
            id: CategoryId::generate(),
            owner,
            name: validate_name(name)?,
            planogram_id: None,
            last_modified: Utc::now(),
        })
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }
}
