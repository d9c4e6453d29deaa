//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while manipulating or (de)serializing a workbook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to read an xlsx package.
    #[error("failed to read workbook: {message}")]
    Read {
        /// Description of the read error.
        message: String,
    },

    /// Failed to write an xlsx package.
    #[error("failed to write workbook: {message}")]
    Write {
        /// Description of the write error.
        message: String,
    },

    /// Sheet name violates the xlsx naming rules.
    #[error("invalid sheet name {name:?}: {reason}")]
    InvalidSheetName {
        /// The rejected name.
        name: String,
        /// Which rule it breaks.
        reason: &'static str,
    },

    /// A sheet with the same name (ignoring ASCII case) already exists.
    #[error("sheet {name:?} already exists")]
    DuplicateSheet {
        /// The duplicated name.
        name: String,
    },

    /// A cell address lies outside the xlsx grid.
    #[error("cell ({row}, {column}) is outside the worksheet grid")]
    CellOutOfRange {
        /// 1-based row.
        row: u32,
        /// 1-based column.
        column: u32,
    },
}

impl CodecError {
    /// Create a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// Create a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }
}
