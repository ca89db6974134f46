use crate::domain::grid::PositionViolation;
use std::fmt;
use thiserror::Error;

/// 被引用但不存在的實體種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Planogram,
    Product,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Category => "Category",
            EntityKind::Planogram => "Planogram",
            EntityKind::Product => "Product",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PlanogramError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Planogram already exists for category {category_id}")]
    AlreadyExists { category_id: String },

    #[error("Cannot resize grid to {rows}x{cols}: {reason}")]
    InvalidResize { rows: u32, cols: u32, reason: String },

    #[error("Invalid positions provided: {0}")]
    InvalidPositions(#[from] PositionViolation),

    #[error("Invalid facings {facings}: product holds {positions} positions")]
    InvalidFacings { facings: u32, positions: usize },

    #[error("Validation error on '{field}' (value: '{value}'): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Version conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("Not authorized to access {entity} {id}")]
    Forbidden { entity: EntityKind, id: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Corrupt document at {path}: {message}")]
    CorruptDocument { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端輸入不符合規則
    Client,
    /// 與目前狀態衝突（版本、重複建立）
    State,
    Access,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl PlanogramError {
    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        PlanogramError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: &str, value: impl fmt::Display, reason: impl Into<String>) -> Self {
        PlanogramError::ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, one per error kind.
    pub fn code(&self) -> &'static str {
        match self {
            PlanogramError::NotFound { .. } => "not_found",
            PlanogramError::AlreadyExists { .. } => "already_exists",
            PlanogramError::InvalidResize { .. } => "invalid_resize",
            PlanogramError::InvalidPositions(_) => "invalid_positions",
            PlanogramError::InvalidFacings { .. } => "invalid_facings",
            PlanogramError::ValidationError { .. } => "validation_error",
            PlanogramError::Conflict { .. } => "conflict",
            PlanogramError::Forbidden { .. } => "forbidden",
            PlanogramError::IoError(_) => "io_error",
            PlanogramError::SerializationError(_) => "serialization_error",
            PlanogramError::CsvError(_) => "csv_error",
            PlanogramError::CorruptDocument { .. } => "corrupt_document",
            PlanogramError::ConfigError { .. } | PlanogramError::ConfigValidationError { .. } => {
                "config_error"
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            PlanogramError::NotFound { .. } => 404,
            PlanogramError::AlreadyExists { .. }
            | PlanogramError::InvalidResize { .. }
            | PlanogramError::InvalidPositions(_)
            | PlanogramError::InvalidFacings { .. }
            | PlanogramError::ValidationError { .. } => 400,
            PlanogramError::Conflict { .. } => 409,
            PlanogramError::Forbidden { .. } => 403,
            _ => 500,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PlanogramError::InvalidResize { .. }
            | PlanogramError::InvalidPositions(_)
            | PlanogramError::InvalidFacings { .. }
            | PlanogramError::ValidationError { .. } => ErrorCategory::Client,
            PlanogramError::NotFound { .. }
            | PlanogramError::AlreadyExists { .. }
            | PlanogramError::Conflict { .. } => ErrorCategory::State,
            PlanogramError::Forbidden { .. } => ErrorCategory::Access,
            PlanogramError::IoError(_)
            | PlanogramError::SerializationError(_)
            | PlanogramError::CsvError(_)
            | PlanogramError::CorruptDocument { .. } => ErrorCategory::Storage,
            PlanogramError::ConfigError { .. } | PlanogramError::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client => ErrorSeverity::Medium,
            ErrorCategory::State => match self {
                PlanogramError::Conflict { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Access => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PlanogramError::NotFound { entity, .. } => format!("{} not found", entity),
            PlanogramError::AlreadyExists { .. } => {
                "Planogram already exists for this category".to_string()
            }
            PlanogramError::InvalidResize { .. } => {
                "Cannot resize grid: Products would be out of bounds".to_string()
            }
            PlanogramError::InvalidPositions(_) => "Invalid positions provided".to_string(),
            PlanogramError::InvalidFacings { .. } => {
                "Facings must cover every position the product holds".to_string()
            }
            PlanogramError::ValidationError { field, reason, .. } => {
                format!("Invalid value for {}: {}", field, reason)
            }
            PlanogramError::Conflict { .. } => {
                "The planogram was changed by someone else".to_string()
            }
            PlanogramError::Forbidden { entity, .. } => {
                format!("Not authorized to access this {}", entity.to_string().to_lowercase())
            }
            PlanogramError::ConfigError { .. } | PlanogramError::ConfigValidationError { .. } => {
                format!("Configuration problem: {}", self)
            }
            _ => format!("Storage failure: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlanogramError::NotFound { .. } => "Check the identifier and that the category has a planogram",
            PlanogramError::AlreadyExists { .. } => "Use the existing planogram of this category",
            PlanogramError::InvalidResize { .. } => {
                "Move or delete the products in the outer rows/columns first"
            }
            PlanogramError::InvalidPositions(_) => {
                "Pick free cells inside the grid, each cell at most once"
            }
            PlanogramError::InvalidFacings { .. } => {
                "Raise facings or release positions before lowering facings"
            }
            PlanogramError::ValidationError { .. } => "Correct the field and retry",
            PlanogramError::Conflict { .. } => "Reload the planogram and apply the change again",
            PlanogramError::Forbidden { .. } => "Sign in as the category owner",
            PlanogramError::ConfigError { .. } | PlanogramError::ConfigValidationError { .. } => {
                "Fix the configuration file or command line flags"
            }
            _ => "Check the data directory permissions and contents",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanogramError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Position;

    #[test]
    fn test_status_codes_follow_error_kind() {
        assert_eq!(PlanogramError::not_found(EntityKind::Product, "abc").status_code(), 404);
        assert_eq!(
            PlanogramError::Conflict {
                expected: 2,
                actual: 3
            }
            .status_code(),
            409
        );
        let violation = PositionViolation::Duplicate {
            position: Position::new(0, 0),
        };
        let err = PlanogramError::from(violation);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.code(), "invalid_positions");
        assert_eq!(err.category(), ErrorCategory::Client);
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = PlanogramError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_severity_levels() {
        let rejected = PlanogramError::validation("facings", 0, "must be at least 1");
        assert_eq!(rejected.severity(), ErrorSeverity::Medium);
        let conflict = PlanogramError::Conflict {
            expected: 1,
            actual: 2,
        };
        assert_eq!(conflict.severity(), ErrorSeverity::Medium);
        assert_eq!(
            PlanogramError::not_found(EntityKind::Planogram, "p1").severity(),
            ErrorSeverity::High
        );
        let forbidden = PlanogramError::Forbidden {
            entity: EntityKind::Category,
            id: "c1".to_string(),
        };
        assert_eq!(forbidden.severity(), ErrorSeverity::High);
        assert!(forbidden.severity() < ErrorSeverity::Critical);
    }
}
