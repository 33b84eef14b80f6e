use std::sync::Arc;

use anyhow::Result;

use crate::domain::entities::view::SavedView;
use crate::usecase::ports::view_store::ViewStore;

/// Saved-view use cases for one collection, behind the injected store.
/// The whole list is persisted on every change, matching the storage
/// contract of one JSON array per collection key.
#[derive(Clone)]
pub struct ViewService {
    store: Arc<dyn ViewStore>,
    collection: String,
}

impl PartialEq for ViewService {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store) && self.collection == other.collection
    }
}

impl ViewService {
    pub fn new(store: Arc<dyn ViewStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn load(&self) -> Vec<SavedView> {
        match self.store.load(&self.collection) {
            Ok(views) => views,
            Err(err) => {
                tracing::warn!(
                    collection = %self.collection,
                    error = %err,
                    "failed to load saved views"
                );
                Vec::new()
            }
        }
    }

    /// Snapshot the current structured filter under a user-chosen name.
    pub fn save(
        &self,
        views: &mut Vec<SavedView>,
        name: &str,
        filter: &str,
        sort: &str,
    ) -> Result<()> {
        views.push(SavedView::new(name, filter, sort));
        self.store.save(&self.collection, views)
    }

    pub fn delete(&self, views: &mut Vec<SavedView>, id: &str) -> Result<()> {
        views.retain(|view| view.id != id);
        self.store.save(&self.collection, views)
    }
}
