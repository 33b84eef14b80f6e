use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record fetched from a remote collection. The backend owns the schema,
/// so fields are kept as an ordered JSON map; every record carries a unique
/// `id` field assigned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn id(&self) -> &str {
        self.fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Cell text for tables and CSV: scalars render plainly, missing and
    /// null fields render empty, nested values render as inline JSON.
    pub fn display(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(Value::Bool(flag)) => flag.to_string(),
            Some(Value::Number(number)) => number.to_string(),
            Some(nested) => serde_json::to_string(nested).unwrap_or_default(),
        }
    }
}

/// Build a field map from literal pairs, preserving insertion order.
pub fn fields_from<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut fields = Map::new();
    for (key, value) in pairs {
        fields.insert(key.into(), value.into());
    }
    fields
}
