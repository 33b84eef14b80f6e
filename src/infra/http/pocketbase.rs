use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::entities::page::RecordPage;
use crate::domain::entities::record::Record;
use crate::usecase::ports::collection::{ClientError, CollectionClient, ListQuery};

/// Batch size used to satisfy a full-list fetch; the backend caps page
/// sizes, so "unpaginated" is one logical call made of sequential batches.
const FULL_LIST_BATCH: u32 = 500;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("CLASSDESK_BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8090".to_string()),
            auth_token: std::env::var("CLASSDESK_AUTH_TOKEN").ok(),
        }
    }
}

/// PocketBase-compatible implementation of the collection port, against
/// `/api/collections/{name}/records`.
pub struct PocketBaseClient {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(rename = "totalItems")]
    total_items: u64,
    #[serde(rename = "totalPages")]
    total_pages: u32,
    items: Vec<Record>,
}

impl From<ListEnvelope> for RecordPage {
    fn from(envelope: ListEnvelope) -> Self {
        RecordPage {
            items: envelope.items,
            total_items: envelope.total_items,
            total_pages: envelope.total_pages,
        }
    }
}

pub fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if query.page > 0 {
        params.push(("page", query.page.to_string()));
    }
    if query.per_page > 0 {
        params.push(("perPage", query.per_page.to_string()));
    }
    for (name, value) in [
        ("sort", &query.sort),
        ("filter", &query.filter),
        ("expand", &query.expand),
        ("fields", &query.fields),
    ] {
        if !value.is_empty() {
            params.push((name, value.clone()));
        }
    }
    params
}

impl PocketBaseClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token,
        }
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{collection}/records", self.base_url)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{id}", self.records_url(collection))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("Authorization", token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_record(&self, response: Response) -> Result<Record, ClientError> {
        response
            .json::<Record>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl CollectionClient for PocketBaseClient {
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<RecordPage, ClientError> {
        let request = self
            .http
            .get(self.records_url(collection))
            .query(&list_params(query));
        let envelope = self
            .send(request)
            .await?
            .json::<ListEnvelope>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(envelope.into())
    }

    async fn get_full_list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<Vec<Record>, ClientError> {
        let mut batch_query = query.clone();
        batch_query.per_page = FULL_LIST_BATCH;
        batch_query.page = 1;

        let mut records = Vec::new();
        loop {
            let page = self.list(collection, &batch_query).await?;
            let fetched = page.items.len();
            records.extend(page.items);
            if fetched == 0 || batch_query.page >= page.total_pages {
                return Ok(records);
            }
            batch_query.page += 1;
        }
    }

    async fn create(
        &self,
        collection: &str,
        data: &Map<String, Value>,
    ) -> Result<Record, ClientError> {
        let request = self.http.post(self.records_url(collection)).json(data);
        let response = self.send(request).await?;
        self.read_record(response).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<Record, ClientError> {
        let request = self.http.patch(self.record_url(collection, id)).json(data);
        let response = self.send(request).await?;
        self.read_record(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.record_url(collection, id));
        self.send(request).await?;
        Ok(())
    }
}
