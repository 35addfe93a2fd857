//! Wiring configuration for repositories and backends.
//!
//! # Responsibility
//! - Name the database/collection a repository is bound to.
//! - Select which document store backend serves the domain service.
//!
//! # Invariants
//! - Database and collection names match `[A-Za-z_][A-Za-z0-9_.-]*`.
//! - Collection names never contain `::`, which is reserved for entity references.

use crate::store::Namespace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_BACKEND: &str = "SHELF_BACKEND";
pub const ENV_DB_PATH: &str = "SHELF_DB_PATH";
pub const ENV_DATABASE: &str = "SHELF_DATABASE";
pub const ENV_COLLECTION: &str = "SHELF_COLLECTION";

pub const DEFAULT_DATABASE: &str = "library";
pub const DEFAULT_BOOK_COLLECTION: &str = "books";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid name regex"));

/// Configuration error raised while validating wiring input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidName { field: &'static str, value: String },
    UnknownBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName { field, value } => {
                write!(f, "invalid {field} name `{value}`")
            }
            Self::UnknownBackend(value) => {
                write!(f, "unknown backend `{value}`; expected memory|sqlite")
            }
        }
    }
}

impl Error for ConfigError {}

/// Database + collection a repository is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionBinding {
    pub database: String,
    pub collection: String,
}

impl CollectionBinding {
    /// Builds a validated binding.
    pub fn new(
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let binding = Self {
            database: database.into(),
            collection: collection.into(),
        };
        binding.validate()?;
        Ok(binding)
    }

    /// Checks both names; useful after deserializing from external input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name("database", &self.database)?;
        validate_name("collection", &self.collection)
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.database.clone(), self.collection.clone())
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            field,
            value: value.to_string(),
        })
    }
}

/// Document store backend selected by wiring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        })
    }
}

/// Full wiring for the book domain service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStoreConfig {
    pub backend: BackendKind,
    /// File path for the sqlite backend; `None` means in-memory.
    pub db_path: Option<PathBuf>,
    pub binding: CollectionBinding,
}

impl Default for BookStoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            db_path: None,
            binding: CollectionBinding {
                database: DEFAULT_DATABASE.to_string(),
                collection: DEFAULT_BOOK_COLLECTION.to_string(),
            },
        }
    }
}

impl BookStoreConfig {
    /// Reads `SHELF_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, applying defaults for
    /// unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match lookup(ENV_BACKEND) {
            Some(value) => value.parse()?,
            None => BackendKind::default(),
        };
        let db_path = lookup(ENV_DB_PATH)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let binding = CollectionBinding::new(
            lookup(ENV_DATABASE).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            lookup(ENV_COLLECTION).unwrap_or_else(|| DEFAULT_BOOK_COLLECTION.to_string()),
        )?;

        Ok(Self {
            backend,
            db_path,
            binding,
        })
    }
}
