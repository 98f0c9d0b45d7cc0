// In-process document store with the same pipeline semantics as the MongoDB backend.
// Backs the test suite and `--memory` local runs.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::pipeline::{Pipeline, SortDirection, Stage};
use super::store::{parse_object_id, DeletedCount, DocumentStore, MatchedCount, StoreError};

type Collections = HashMap<String, Vec<Document>>;

#[derive(Default)]
pub struct MemoryStore {
    databases: RwLock<HashMap<String, Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in a collection
    pub async fn count(&self, database: &str, collection: &str) -> usize {
        let databases = self.databases.read().await;
        databases
            .get(database)
            .and_then(|db| db.get(collection))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self, _database: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, StoreError> {
        let databases = self.databases.read().await;
        let mut names: Vec<String> = databases
            .get(database)
            .map(|db| db.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), StoreError> {
        let mut databases = self.databases.write().await;
        let db = databases.entry(database.to_string()).or_default();
        if db.contains_key(name) {
            return Err(StoreError::Query(format!("collection already exists: {}", name)));
        }
        db.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn insert(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<ObjectId, StoreError> {
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(StoreError::Query(format!("unsupported _id value: {}", other)))
            }
            None => ObjectId::new(),
        };

        // `_id` leads the stored document, as the server does
        let mut stored = Document::new();
        stored.insert("_id", id);
        for (key, value) in document {
            if key != "_id" {
                stored.insert(key, value);
            }
        }

        let mut databases = self.databases.write().await;
        let documents = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if documents.iter().any(|d| d.get_object_id("_id").ok() == Some(id)) {
            return Err(StoreError::Query(format!("duplicate key _id: {}", id)));
        }
        documents.push(stored);
        Ok(id)
    }

    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError> {
        let databases = self.databases.read().await;
        let empty = Collections::new();
        let db = databases.get(database).unwrap_or(&empty);

        let mut documents = db.get(collection).cloned().unwrap_or_default();
        for stage in pipeline.stages() {
            documents = apply_stage(documents, stage, db)?;
        }
        Ok(documents)
    }

    async fn update_partial(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<MatchedCount, StoreError> {
        let object_id = parse_object_id(id)?;
        let mut databases = self.databases.write().await;

        let document = databases
            .get_mut(database)
            .and_then(|db| db.get_mut(collection))
            .and_then(|docs| {
                docs.iter_mut()
                    .find(|d| d.get_object_id("_id").ok() == Some(object_id))
            })
            .ok_or(StoreError::NotFound)?;

        for (key, value) in fields {
            if key == "_id" {
                return Err(StoreError::Query("_id is immutable".to_string()));
            }
            document.insert(key, value);
        }
        Ok(1)
    }

    async fn delete(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> Result<DeletedCount, StoreError> {
        let object_id = parse_object_id(id)?;
        let mut databases = self.databases.write().await;

        let documents = databases
            .get_mut(database)
            .and_then(|db| db.get_mut(collection))
            .ok_or(StoreError::NotFound)?;

        let position = documents
            .iter()
            .position(|d| d.get_object_id("_id").ok() == Some(object_id))
            .ok_or(StoreError::NotFound)?;
        documents.remove(position);
        Ok(1)
    }
}

fn apply_stage(
    documents: Vec<Document>,
    stage: &Stage,
    db: &Collections,
) -> Result<Vec<Document>, StoreError> {
    match stage {
        Stage::Match(filter) => {
            let mut kept = Vec::with_capacity(documents.len());
            for document in documents {
                if matches_filter(&document, filter)? {
                    kept.push(document);
                }
            }
            Ok(kept)
        }
        Stage::Sort { field, direction } => {
            let mut sorted = documents;
            sorted.sort_by(|a, b| {
                let ordering = compare_values(
                    get_path(a, field).unwrap_or(&Bson::Null),
                    get_path(b, field).unwrap_or(&Bson::Null),
                );
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
            Ok(sorted)
        }
        Stage::Exclude(fields) => Ok(documents
            .into_iter()
            .map(|mut document| {
                for field in fields {
                    remove_path(&mut document, field);
                }
                document
            })
            .collect()),
        Stage::Lookup {
            from,
            local_field,
            foreign_field,
            as_field,
        } => {
            let foreign = db.get(from).map(Vec::as_slice).unwrap_or(&[]);
            Ok(documents
                .into_iter()
                .map(|mut document| {
                    let local = get_path(&document, local_field).cloned().unwrap_or(Bson::Null);
                    let joined: Vec<Bson> = foreign
                        .iter()
                        .filter(|candidate| {
                            let value = get_path(candidate, foreign_field).unwrap_or(&Bson::Null);
                            match &local {
                                Bson::Array(items) => items.iter().any(|item| values_equal(item, value)),
                                single => values_equal(single, value),
                            }
                        })
                        .cloned()
                        .map(Bson::Document)
                        .collect();
                    document.insert(as_field.clone(), Bson::Array(joined));
                    document
                })
                .collect())
        }
        Stage::Concat {
            field,
            prefix,
            source,
        } => Ok(documents
            .into_iter()
            .map(|mut document| {
                let value = match get_path(&document, source) {
                    Some(Bson::String(s)) => Bson::String(format!("{}{}", prefix, s)),
                    _ => Bson::Null,
                };
                document.insert(field.clone(), value);
                document
            })
            .collect()),
    }
}

fn matches_filter(document: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (field, condition) in filter {
        let value = get_path(document, field);

        let satisfied = match condition {
            Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
                let mut all = true;
                for (op, operand) in ops {
                    if !evaluate_operator(value, op, operand)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            expected => field_equals(value, expected),
        };

        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn evaluate_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> Result<bool, StoreError> {
    let ordered = |accept: fn(Ordering) -> bool| match value {
        Some(v) if type_rank(v) == type_rank(operand) => accept(compare_values(v, operand)),
        _ => false,
    };

    Ok(match op {
        "$eq" => field_equals(value, operand),
        "$ne" => !field_equals(value, operand),
        "$gt" => ordered(|o| o == Ordering::Greater),
        "$gte" => ordered(|o| o != Ordering::Less),
        "$lt" => ordered(|o| o == Ordering::Less),
        "$lte" => ordered(|o| o != Ordering::Greater),
        "$in" => match operand {
            Bson::Array(options) => options.iter().any(|o| field_equals(value, o)),
            _ => return Err(StoreError::Query("$in needs an array".to_string())),
        },
        "$nin" => match operand {
            Bson::Array(options) => !options.iter().any(|o| field_equals(value, o)),
            _ => return Err(StoreError::Query("$nin needs an array".to_string())),
        },
        "$exists" => value.is_some() == operand.as_bool().unwrap_or(true),
        other => return Err(StoreError::Query(format!("unsupported operator: {}", other))),
    })
}

/// Equality as a filter sees it: missing equals null, arrays match on any element
fn field_equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(v) => values_equal(v, expected),
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b) && compare_values(a, b) == Ordering::Equal
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(*n as f64),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Cross-type ordering, lowest first
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        _ => 12,
    }
}

fn compare_values(a: &Bson, b: &Bson) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Array(x), Bson::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Bson::Document(x), Bson::Document(y)) => {
            if x == y {
                Ordering::Equal
            } else {
                x.to_string().cmp(&y.to_string())
            }
        }
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ if a == b => Ordering::Equal,
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

/// Resolve a dotted path ("categoria.nombre") inside nested documents
fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn remove_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::provision_collections;
    use mongodb::bson::doc;

    const DB: &str = "tienda_test";

    async fn seeded() -> (MemoryStore, ObjectId) {
        let store = MemoryStore::new();
        let category = store
            .insert(DB, "categorias", doc! { "nombre": "Frutas", "slug": "frutas" })
            .await
            .unwrap();
        store
            .insert(DB, "productos", doc! { "nombre": "Manzana", "precio": 500_i64, "categoria_id": category })
            .await
            .unwrap();
        store
            .insert(DB, "productos", doc! { "nombre": "Pera", "precio": 700_i64, "categoria_id": ObjectId::new() })
            .await
            .unwrap();
        (store, category)
    }

    #[tokio::test]
    async fn empty_pipeline_returns_whole_collection() {
        let (store, _) = seeded().await;
        let all = store.aggregate(DB, "productos", &Pipeline::new()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn missing_collection_aggregates_to_empty() {
        let store = MemoryStore::new();
        let docs = store.aggregate(DB, "nada", &Pipeline::new()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn lookup_with_dangling_reference_yields_empty_join() {
        let (store, category) = seeded().await;
        let pipeline = Pipeline::new()
            .matching(doc! {})
            .lookup("categorias", "categoria_id", "_id", "categoria")
            .exclude(["categoria_id"]);

        let docs = store.aggregate(DB, "productos", &pipeline).await.unwrap();
        assert_eq!(docs.len(), 2, "no product may be dropped by the join");

        let manzana = docs.iter().find(|d| d.get_str("nombre").ok() == Some("Manzana")).unwrap();
        let joined = manzana.get_array("categoria").unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(
            joined[0].as_document().unwrap().get_object_id("_id").unwrap(),
            category
        );
        assert!(manzana.get("categoria_id").is_none());

        let pera = docs.iter().find(|d| d.get_str("nombre").ok() == Some("Pera")).unwrap();
        assert!(pera.get_array("categoria").unwrap().is_empty());
    }

    #[tokio::test]
    async fn sort_descending_puts_newest_first() {
        let (store, _) = seeded().await;
        let docs = store
            .aggregate(DB, "productos", &Pipeline::new().sort_desc("_id"))
            .await
            .unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.get_str("nombre").unwrap()).collect();
        assert_eq!(names, vec!["Pera", "Manzana"]);
    }

    #[tokio::test]
    async fn match_supports_comparison_operators() {
        let (store, _) = seeded().await;
        let cheap = store
            .aggregate(DB, "productos", &Pipeline::new().matching(doc! { "precio": { "$lt": 600 } }))
            .await
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].get_str("nombre").unwrap(), "Manzana");

        let exact = store
            .aggregate(DB, "productos", &Pipeline::new().matching(doc! { "precio": 700 }))
            .await
            .unwrap();
        assert_eq!(exact[0].get_str("nombre").unwrap(), "Pera");

        let err = store
            .aggregate(DB, "productos", &Pipeline::new().matching(doc! { "precio": { "$regex": "x" } }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn concat_builds_download_urls() {
        let store = MemoryStore::new();
        store
            .insert(DB, "productos_fotos", doc! { "nombre": "1700000000.png", "timestamp": 1_i64 })
            .await
            .unwrap();
        let pipeline = Pipeline::new()
            .exclude(["timestamp"])
            .concat("nombre", "http://localhost:8086/imagenes/", "nombre");

        let docs = store.aggregate(DB, "productos_fotos", &pipeline).await.unwrap();
        assert_eq!(
            docs[0].get_str("nombre").unwrap(),
            "http://localhost:8086/imagenes/1700000000.png"
        );
        assert!(docs[0].get("timestamp").is_none());
    }

    #[tokio::test]
    async fn find_by_id_pipeline_distinguishes_not_found() {
        let (store, _) = seeded().await;
        let pipeline = Pipeline::new().matching(doc! { "_id": ObjectId::new() });
        let err = store.find_by_id_pipeline(DB, "productos", &pipeline).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let none = store
            .find_existing(DB, "productos", doc! { "nombre": "Kiwi" })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn empty_patch_never_mutates() {
        let (store, category) = seeded().await;
        let before = store
            .find_existing(DB, "categorias", doc! { "_id": category })
            .await
            .unwrap();

        let matched = store
            .update_partial(DB, "categorias", &category.to_hex(), Document::new())
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let after = store
            .find_existing(DB, "categorias", doc! { "_id": category })
            .await
            .unwrap();
        assert_eq!(before, after);

        let missing = store
            .update_partial(DB, "categorias", &ObjectId::new().to_hex(), Document::new())
            .await
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound));
    }

    #[tokio::test]
    async fn partial_update_keeps_absent_fields() {
        let (store, category) = seeded().await;
        store
            .update_partial(DB, "categorias", &category.to_hex(), doc! { "nombre": "Verduras" })
            .await
            .unwrap();

        let doc = &store
            .find_existing(DB, "categorias", doc! { "_id": category })
            .await
            .unwrap()[0];
        assert_eq!(doc.get_str("nombre").unwrap(), "Verduras");
        assert_eq!(doc.get_str("slug").unwrap(), "frutas");
    }

    #[tokio::test]
    async fn malformed_ids_fail_before_touching_data() {
        let (store, _) = seeded().await;
        let update = store
            .update_partial(DB, "categorias", "nope", doc! { "nombre": "x" })
            .await
            .unwrap_err();
        assert!(matches!(update, StoreError::InvalidId(_)));

        let delete = store.delete(DB, "categorias", "nope").await.unwrap_err();
        assert!(matches!(delete, StoreError::InvalidId(_)));
        assert_eq!(store.count(DB, "categorias").await, 1);
    }

    #[tokio::test]
    async fn delete_reports_not_found_second_time() {
        let (store, category) = seeded().await;
        let id = category.to_hex();
        assert_eq!(store.delete(DB, "categorias", &id).await.unwrap(), 1);
        assert!(matches!(
            store.delete(DB, "categorias", &id).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn provisioning_is_idempotent() {
        let store = MemoryStore::new();
        store.create_collection(DB, "categorias").await.unwrap();
        store
            .insert(DB, "categorias", doc! { "nombre": "Existente" })
            .await
            .unwrap();

        let created = provision_collections(&store, DB, &["categorias", "productos"])
            .await
            .unwrap();
        assert_eq!(created, vec!["productos".to_string()]);
        assert_eq!(store.count(DB, "categorias").await, 1, "existing data untouched");

        let again = provision_collections(&store, DB, &["categorias", "productos"])
            .await
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(
            store.collection_names(DB).await.unwrap(),
            vec!["categorias".to_string(), "productos".to_string()]
        );
    }
}
