use crate::core::EnginePolicy;
use crate::domain::grid::{GridSize, DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS, MIN_GRID_DIMENSION};
use crate::domain::model::FacingsPolicy;
use crate::utils::error::{PlanogramError, Result};
use crate::utils::validation::{validate_one_of, validate_path, validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub grid: GridConfig,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub default_rows: u32,
    pub default_cols: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_rows: DEFAULT_GRID_ROWS,
            default_cols: DEFAULT_GRID_COLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// `false` restores the old behaviour where moving a product never checks its facings.
    pub enforce_facings_on_reposition: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enforce_facings_on_reposition: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PlanogramError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PlanogramError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PlanogramError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn default_grid(&self) -> GridSize {
        GridSize {
            rows: self.grid.default_rows,
            cols: self.grid.default_cols,
        }
    }

    pub fn facings_policy(&self) -> FacingsPolicy {
        if self.policy.enforce_facings_on_reposition {
            FacingsPolicy::Enforce
        } else {
            FacingsPolicy::AddOnly
        }
    }

    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            default_grid: self.default_grid(),
            facings_policy: self.facings_policy(),
        }
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        validate_path("store.data_dir", &self.store.data_dir)?;
        validate_positive_number("grid.default_rows", self.grid.default_rows, MIN_GRID_DIMENSION)?;
        validate_positive_number("grid.default_cols", self.grid.default_cols, MIN_GRID_DIMENSION)?;
        validate_one_of("logging.level", &self.logging.level, &LOG_LEVELS)?;
        Ok(())
    }
}
