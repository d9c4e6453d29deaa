//! Database configuration.

use sheetdb_codec::DEFAULT_DATETIME_FORMAT;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key read by [`Config::from_map`].
pub const CONNECTION_STRING_KEY: &str = "connectionString";

/// Configuration for opening a database.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path of the workbook file (the connection string).
    pub path: Option<PathBuf>,

    /// Whether to create missing parent directories when opening.
    pub create_dirs: bool,

    /// xlsx number format applied to date/time columns.
    pub date_time_format: String,

    /// Width given to date/time columns, in character units.
    pub date_column_width: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            create_dirs: true,
            date_time_format: DEFAULT_DATETIME_FORMAT.to_string(),
            date_column_width: 20.0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for the workbook at `path`.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self::default().path(path)
    }

    /// Builds a configuration from string settings.
    ///
    /// Only [`CONNECTION_STRING_KEY`] is read; other keys are ignored.
    #[must_use]
    pub fn from_map<S: std::hash::BuildHasher>(settings: &HashMap<String, String, S>) -> Self {
        let mut config = Self::default();
        config.path = settings.get(CONNECTION_STRING_KEY).map(PathBuf::from);
        config
    }

    /// Sets the workbook path.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets the date/time column number format.
    #[must_use]
    pub fn date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = format.into();
        self
    }

    /// Sets the date/time column width.
    #[must_use]
    pub const fn date_column_width(mut self, width: f64) -> Self {
        self.date_column_width = width;
        self
    }

    /// Name of the database: the workbook file name without extension.
    #[must_use]
    pub fn database_name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// Copy of this configuration pointing at `<name>.xlsx` in the same
    /// directory.
    #[must_use]
    pub fn with_database(&self, name: &str) -> Self {
        let file = format!("{name}.xlsx");
        let path = match self.path.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        Self {
            path: Some(path),
            ..self.clone()
        }
    }
}
