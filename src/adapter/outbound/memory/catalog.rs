//! Catalog held in memory, optionally loaded from a JSON file.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{Screen, ScreenId};
use crate::error::Result;
use crate::port::outbound::ScreenCatalog;

/// Fixed list of raw screen records.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    screens: Vec<Screen>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(screens: Vec<Screen>) -> Self {
        Self { screens }
    }

    /// Parse a JSON array of screen records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::error::Error::Json) for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a JSON array of screen records from `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a JSON error if it
    /// cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let catalog = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), screens = catalog.len(), "Loaded screen catalog");
        Ok(catalog)
    }

    #[must_use]
    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

#[async_trait]
impl ScreenCatalog for StaticCatalog {
    async fn all_screens(&self) -> Result<Vec<Screen>> {
        Ok(self.screens.clone())
    }

    async fn screen(&self, screen_id: &ScreenId) -> Result<Option<Screen>> {
        Ok(self.screens.iter().find(|s| &s.id == screen_id).cloned())
    }
}
