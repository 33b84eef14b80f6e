use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::infra::export::csv::csv_bytes;
use crate::usecase::ports::collection::{ClientError, CollectionClient, ListQuery};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no matching records to export")]
    Empty,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write csv: {0}")]
    Write(#[from] anyhow::Error),
}

/// Fetch every record matching the query and write them as CSV. An empty
/// result set produces no file at all, not a header-only one.
pub async fn export_collection(
    client: Arc<dyn CollectionClient>,
    collection: &str,
    query: &ListQuery,
    path: &Path,
) -> Result<usize, ExportError> {
    let records = client.get_full_list(collection, query).await?;
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let bytes = csv_bytes(&records)?;
    std::fs::write(path, bytes)
        .map_err(|err| anyhow::anyhow!("{}: {err}", path.display()))
        .map_err(ExportError::Write)?;

    tracing::info!(
        collection,
        rows = records.len(),
        path = %path.display(),
        "exported csv"
    );
    Ok(records.len())
}
