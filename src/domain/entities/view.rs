use serde::{Deserialize, Serialize};

/// A named filter preset for one collection, persisted on this device.
/// Created and deleted only by explicit user action, never expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedView {
    pub id: String,
    pub name: String,
    pub filter: String,
    pub sort: String,
}

impl SavedView {
    pub fn new(name: impl Into<String>, filter: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            filter: filter.into(),
            sort: sort.into(),
        }
    }
}
