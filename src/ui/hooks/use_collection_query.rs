use std::sync::Arc;

use dioxus::prelude::*;

use crate::domain::entities::query::SortSpec;
use crate::usecase::ports::collection::{CollectionClient, ListQuery};
use crate::usecase::services::query_controller::{
    FetchApplied, QueryController, FILTER_DEBOUNCE,
};

/// Handle for one remote collection listing: the controller state machine in
/// a signal, plus the client the fetches run against. Cloned freely into
/// event handlers, the way the shared `db_path` handle is in the rest of
/// the UI.
#[derive(Clone)]
pub struct UseCollectionQuery {
    pub controller: Signal<QueryController>,
    client: Arc<dyn CollectionClient>,
}

impl PartialEq for UseCollectionQuery {
    fn eq(&self, other: &Self) -> bool {
        self.controller == other.controller
    }
}

pub fn use_collection_query(
    client: Arc<dyn CollectionClient>,
    collection: &str,
    sort: Option<SortSpec>,
) -> UseCollectionQuery {
    let collection = collection.to_string();
    let controller = use_signal(move || QueryController::new(collection, sort));
    let query = UseCollectionQuery { controller, client };

    let initial = query.clone();
    use_effect(move || initial.refresh());

    query
}

impl UseCollectionQuery {
    /// Re-issue the current query unconditionally, e.g. after a screen's
    /// create/update/delete side effect.
    pub fn refresh(&self) {
        self.spawn_fetch();
    }

    /// Store the raw input immediately, then try to commit it once the
    /// debounce window elapses. Rapid edits each spawn a sleep, but only
    /// the newest ticket commits, so one fetch fires per settled input.
    pub fn set_filter(&self, raw: String) {
        let mut controller = self.controller;
        let ticket = controller.write().set_filter(raw);
        let query = self.clone();
        spawn(async move {
            tokio::time::sleep(FILTER_DEBOUNCE).await;
            let mut controller = query.controller;
            let committed = controller.write().commit_filter(ticket);
            if committed {
                query.spawn_fetch();
            }
        });
    }

    pub fn set_structured_filter(&self, expression: String) {
        let mut controller = self.controller;
        controller.write().set_structured_filter(expression);
        self.spawn_fetch();
    }

    pub fn set_page(&self, page: u32) {
        let mut controller = self.controller;
        controller.write().set_page(page);
        self.spawn_fetch();
    }

    pub fn set_per_page(&self, per_page: u32) {
        let mut controller = self.controller;
        controller.write().set_per_page(per_page);
        self.spawn_fetch();
    }

    pub fn toggle_sort(&self, field: &str) {
        let mut controller = self.controller;
        controller.write().toggle_sort(field);
        self.spawn_fetch();
    }

    pub fn set_sort(&self, sort: Option<SortSpec>) {
        let mut controller = self.controller;
        controller.write().set_sort(sort);
        self.spawn_fetch();
    }

    /// The unpaginated query for CSV export.
    pub fn export_query(&self) -> ListQuery {
        self.controller.peek().export_query()
    }

    fn spawn_fetch(&self) {
        let mut controller = self.controller;
        let client = self.client.clone();
        let collection = controller.peek().collection().to_string();
        let mut ticket = controller.write().begin_fetch();
        spawn(async move {
            loop {
                let outcome = client.list(&collection, &ticket.query).await;
                let applied = controller.write().apply_fetch(&ticket, outcome);
                match applied {
                    // The page was clamped against a shrunken result set;
                    // fetch the page that actually exists.
                    FetchApplied::Applied { needs_refetch: true } => {
                        ticket = controller.write().begin_fetch();
                    }
                    _ => break,
                }
            }
        });
    }
}
