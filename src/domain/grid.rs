//! Grid geometry: bounds and cell occupancy over a planogram's product list.

use crate::domain::ids::ProductId;
use crate::domain::model::Product;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_GRID_DIMENSION: u32 = 2;
pub const DEFAULT_GRID_ROWS: u32 = 4;
pub const DEFAULT_GRID_COLS: u32 = 4;

/// Bounded coordinate space `[0, rows) x [0, cols)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl GridSize {
    /// Builds a grid size, `None` when either side is below the minimum.
    pub fn new(rows: u32, cols: u32) -> Option<Self> {
        if rows < MIN_GRID_DIMENSION || cols < MIN_GRID_DIMENSION {
            return None;
        }
        Some(Self { rows, cols })
    }

    pub fn is_valid(&self) -> bool {
        self.rows >= MIN_GRID_DIMENSION && self.cols >= MIN_GRID_DIMENSION
    }

    pub fn contains(&self, position: Position) -> bool {
        position.row < self.rows && position.col < self.cols
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            rows: DEFAULT_GRID_ROWS,
            cols: DEFAULT_GRID_COLS,
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = String;

    /// 解析 `row:col` 格式
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (row, col) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected ROW:COL, got '{}'", s))?;
        let row = row
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid row '{}': {}", row, e))?;
        let col = col
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid column '{}': {}", col, e))?;
        Ok(Position::new(row, col))
    }
}

/// Why a candidate position set was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionViolation {
    #[error("position {position} is outside the {grid} grid")]
    OutOfBounds { position: Position, grid: GridSize },

    #[error("position {position} is already taken by product {occupant}")]
    Occupied {
        position: Position,
        occupant: ProductId,
    },

    #[error("position {position} is listed more than once")]
    Duplicate { position: Position },
}

/// Cell -> owning product map for one planogram.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    cells: HashMap<Position, ProductId>,
}

impl OccupancyIndex {
    pub fn build(products: &[Product]) -> Self {
        let mut cells = HashMap::new();
        for product in products {
            for position in &product.positions {
                // 資料已損毀時保留第一個佔用者，check_invariants 會另外回報
                cells.entry(*position).or_insert_with(|| product.id.clone());
            }
        }
        Self { cells }
    }

    pub fn occupant(&self, position: Position) -> Option<&ProductId> {
        self.cells.get(&position)
    }

    pub fn is_occupied(&self, position: Position, exclude: Option<&ProductId>) -> bool {
        match self.cells.get(&position) {
            Some(owner) => exclude != Some(owner),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn max_occupied(&self) -> (u32, u32) {
        self.cells.keys().fold((0, 0), |(max_row, max_col), pos| {
            (max_row.max(pos.row), max_col.max(pos.col))
        })
    }
}

/// Highest row and column index held by any product, `(0, 0)` when empty.
pub fn max_occupied_dimensions(products: &[Product]) -> (u32, u32) {
    products
        .iter()
        .flat_map(|product| product.positions.iter())
        .fold((0, 0), |(max_row, max_col), pos| {
            (max_row.max(pos.row), max_col.max(pos.col))
        })
}

/// True when a product other than `exclude` holds `position`.
pub fn is_position_occupied(
    products: &[Product],
    position: Position,
    exclude: Option<&ProductId>,
) -> bool {
    products
        .iter()
        .filter(|product| exclude != Some(&product.id))
        .any(|product| product.positions.contains(&position))
}

/// Bounds and collision check for `candidates`, reporting the first violation.
///
/// Cells already held by `product_id` count as free, so a product can keep
/// the cells it has while being moved. The facings bound is not checked here.
pub fn check_positions(
    grid: GridSize,
    products: &[Product],
    product_id: Option<&ProductId>,
    candidates: &[Position],
) -> std::result::Result<(), PositionViolation> {
    if let Some(position) = candidates.iter().find(|pos| !grid.contains(**pos)) {
        return Err(PositionViolation::OutOfBounds {
            position: *position,
            grid,
        });
    }

    let index = OccupancyIndex::build(products);
    let mut seen = HashSet::with_capacity(candidates.len());
    for position in candidates {
        if !seen.insert(*position) {
            return Err(PositionViolation::Duplicate {
                position: *position,
            });
        }
        if let Some(occupant) = index
            .occupant(*position)
            .filter(|owner| product_id != Some(*owner))
        {
            return Err(PositionViolation::Occupied {
                position: *position,
                occupant: occupant.clone(),
            });
        }
    }

    Ok(())
}

pub fn validate_positions(
    grid: GridSize,
    products: &[Product],
    product_id: Option<&ProductId>,
    candidates: &[Position],
) -> bool {
    check_positions(grid, products, product_id, candidates).is_ok()
}
