pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryCategoryDirectory, InMemoryPlanogramStore, JsonFileStore};
pub use config::EngineConfig;
pub use crate::core::{EnginePolicy, LayoutFormat, PlanogramService};
pub use domain::grid::{GridSize, Position};
pub use domain::ids::{CategoryId, PlanogramId, ProductId, UserId};
pub use domain::model::{Category, FacingsPolicy, NewProduct, Planogram, Product, ProductPatch};
pub use utils::error::{PlanogramError, Result};
