//! Shared state for the report API.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::config::{AppConfig, ClassifierConfig};
use crate::db;

/// Shared context for all API routes.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub classifier: ClassifierConfig,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, classifier: ClassifierConfig) -> Self {
        Self {
            db_path: Arc::new(db_path),
            classifier,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.db_path.clone(), config.classifier)
    }

    /// Opens a fresh connection for one request.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(ApiError::from)
    }
}

/// Splits a comma-separated query value, dropping blanks.
pub fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_blanks() {
        assert_eq!(split_csv(Some(" a, b ,,c ")), vec!["a", "b", "c"]);
        assert!(split_csv(Some(" , ")).is_empty());
        assert!(split_csv(None).is_empty());
    }
}
