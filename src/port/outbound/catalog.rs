//! Raw screen catalog port.

use async_trait::async_trait;

use crate::domain::{Screen, ScreenId};
use crate::error::Result;

/// Flat inventory of raw screen records.
///
/// The catalog is the only data source the rule-based fallback relies on.
#[async_trait]
pub trait ScreenCatalog: Send + Sync {
    async fn all_screens(&self) -> Result<Vec<Screen>>;

    async fn screen(&self, screen_id: &ScreenId) -> Result<Option<Screen>>;
}
