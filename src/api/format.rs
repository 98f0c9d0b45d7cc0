use mongodb::bson::{Bson, Document};
use serde_json::{Map, Number, Value};

/// Convert a store document into its public JSON shape.
///
/// Identifiers become plain hex strings and dates RFC 3339 strings, so clients
/// never see extended-JSON wrappers such as `{"$oid": ...}`.
pub fn document_to_json(document: &Document) -> Value {
    let mut obj = Map::new();
    for (key, value) in document {
        obj.insert(key.clone(), bson_to_json(value));
    }
    Value::Object(obj)
}

pub fn documents_to_json(documents: &[Document]) -> Value {
    Value::Array(documents.iter().map(document_to_json).collect())
}

pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(inner) => document_to_json(inner),
        other => other.clone().into_relaxed_extjson(),
    }
}
