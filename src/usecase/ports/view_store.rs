use anyhow::Result;

use crate::domain::entities::view::SavedView;

/// Device-local persistence for saved views, keyed by collection name.
/// The toolbar is written against this interface so the storage mechanism
/// stays swappable.
pub trait ViewStore: Send + Sync {
    fn load(&self, collection: &str) -> Result<Vec<SavedView>>;
    fn save(&self, collection: &str, views: &[SavedView]) -> Result<()>;
}
