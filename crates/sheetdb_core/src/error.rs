//! Error types for sheetdb core.

use crate::types::{ConvertError, ValueType};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in sheetdb core operations.
///
/// None of these are retried internally. A failure in the middle of a
/// batch leaves the earlier in-memory edits in place and skips the flush.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] sheetdb_storage::StorageError),

    /// Workbook model or xlsx codec error.
    #[error("codec error: {0}")]
    Codec(#[from] sheetdb_codec::CodecError),

    /// A column needed by a key-based operation is missing from the header.
    #[error("schema error: column `{column}` does not exist in table `{table}`")]
    Schema {
        /// The table searched.
        table: String,
        /// The missing column.
        column: String,
    },

    /// A cell could not be converted to its property's declared type.
    #[error("conversion error in table `{table}`, row {row}, column `{column}`: cannot convert {found} to {expected}")]
    Conversion {
        /// The table read.
        table: String,
        /// The column read.
        column: String,
        /// The 1-based row read (0 when converting a caller-supplied value).
        row: u32,
        /// The declared type.
        expected: ValueType,
        /// Description of the offending value.
        found: String,
    },

    /// The entity constructor failed.
    #[error("cannot construct entity `{entity}`: {message}")]
    Construction {
        /// The entity type.
        entity: String,
        /// Reason given by the constructor.
        message: String,
    },

    /// The table (sheet) does not exist.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the table.
        name: String,
    },

    /// No descriptor was registered for the entity type.
    #[error("entity type not registered: {type_name}")]
    EntityNotRegistered {
        /// Rust type name of the entity.
        type_name: &'static str,
    },

    /// The entity descriptor is malformed.
    #[error("invalid descriptor for `{entity}`: {message}")]
    InvalidDescriptor {
        /// The entity type.
        entity: String,
        /// What is wrong with it.
        message: String,
    },

    /// A filter rule cannot be compiled against the entity.
    #[error("invalid filter: {message}")]
    InvalidFilter {
        /// What is wrong with the rule.
        message: String,
    },

    /// A background flush task failed to complete.
    #[error("background task failed: {message}")]
    BackgroundTask {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a schema error for a missing column.
    pub fn schema(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a conversion error for a cell at `row` (0 for values that
    /// did not come from the sheet).
    pub fn conversion(
        table: impl Into<String>,
        column: impl Into<String>,
        row: u32,
        err: ConvertError,
    ) -> Self {
        Self::Conversion {
            table: table.into(),
            column: column.into(),
            row,
            expected: err.expected,
            found: err.found,
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Creates an invalid descriptor error.
    pub fn invalid_descriptor(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
        }
    }
}
