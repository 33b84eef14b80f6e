use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::page::RecordPage;
use crate::domain::entities::record::Record;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Options for a collection listing. Empty strings mean "not set"; the
/// filter and sort strings are handed to the backend verbatim, in its own
/// query grammar (`field = "value"`, `field ~ "substring"`, `&&`, `||`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub sort: String,
    pub filter: String,
    pub expand: String,
    pub fields: String,
}

/// One named collection of a remote backend. Screens and the query
/// controller only ever talk to this port; the backend stays a black box.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<RecordPage, ClientError>;

    /// All records matching the query's filter and sort, ignoring its page
    /// bounds. Used by CSV export.
    async fn get_full_list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<Vec<Record>, ClientError>;

    async fn create(
        &self,
        collection: &str,
        data: &Map<String, Value>,
    ) -> Result<Record, ClientError>;

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<Record, ClientError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ClientError>;
}
