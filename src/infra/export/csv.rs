use anyhow::{Context, Result};

use crate::domain::entities::record::Record;

/// Serialize records to CSV. The header row comes from the first record's
/// keys in insertion order; later records are assumed to share the schema
/// and are read by those same keys. Quoting and escaping are the csv
/// crate's RFC 4180 handling; nested values appear as inline JSON.
pub fn csv_bytes(records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let headers: Vec<String> = match records.first() {
        Some(first) => first.fields.keys().cloned().collect(),
        None => return Err(anyhow::anyhow!("cannot serialize an empty record set")),
    };
    writer
        .write_record(&headers)
        .context("failed to write csv header")?;

    for record in records {
        let row: Vec<String> = headers.iter().map(|key| record.display(key)).collect();
        writer.write_record(&row).context("failed to write csv row")?;
    }

    writer.flush().context("failed to flush csv writer")?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to finish csv writer: {err}"))
}
