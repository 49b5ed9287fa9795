use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chambers_data::db::drivers::mongo::{DocumentSession, MongoConnection};
use mongodb::bson::{oid::ObjectId, Bson, Document, RawDocumentBuf, Regex};

use super::{lock, Shared, TIMEOUT};

/// Collections keyed by `(database, collection)`.
#[derive(Default)]
pub struct DocumentStore {
    pub collections: BTreeMap<(String, String), Vec<Document>>,
    pub calls: usize,
    pub closes: usize,
    pub fail_next: Option<String>,
}

impl DocumentStore {
    pub fn collection(&self, database: &str, collection: &str) -> &[Document] {
        self.collections
            .get(&(database.to_string(), collection.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn touch(&mut self) -> anyhow::Result<()> {
        self.calls += 1;
        match self.fail_next.take() {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }
}

pub struct FakeDocuments {
    store: Shared<DocumentStore>,
}

#[async_trait]
impl DocumentSession for FakeDocuments {
    async fn find(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
        projection: Option<Document>,
    ) -> anyhow::Result<Vec<RawDocumentBuf>> {
        let mut store = lock(&self.store);
        store.touch()?;
        store
            .collection(&database, &collection)
            .iter()
            .filter(|doc| matches(doc, &filter))
            .map(|doc| project(doc, projection.as_ref()))
            .map(|doc| RawDocumentBuf::from_document(&doc).map_err(anyhow::Error::from))
            .collect()
    }

    async fn insert_many(
        &mut self,
        database: String,
        collection: String,
        documents: Vec<Document>,
    ) -> anyhow::Result<u64> {
        let mut store = lock(&self.store);
        store.touch()?;
        let inserted = documents.len() as u64;
        let target = store.collections.entry((database, collection)).or_default();
        for document in documents {
            let mut stored = Document::new();
            if !document.contains_key("_id") {
                stored.insert("_id", ObjectId::new());
            }
            for (key, value) in document {
                stored.insert(key, value);
            }
            target.push(stored);
        }
        Ok(inserted)
    }

    async fn update_many(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
        update: Document,
    ) -> anyhow::Result<u64> {
        let mut store = lock(&self.store);
        store.touch()?;
        let set = update
            .get_document("$set")
            .map_err(|_| anyhow::anyhow!("only $set updates are supported"))?
            .clone();
        let mut modified = 0;
        if let Some(docs) = store.collections.get_mut(&(database, collection)) {
            for doc in docs.iter_mut().filter(|doc| matches(doc, &filter)) {
                let before = doc.clone();
                for (key, value) in &set {
                    doc.insert(key.clone(), value.clone());
                }
                if *doc != before {
                    modified += 1;
                }
            }
        }
        Ok(modified)
    }

    async fn delete_many(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
    ) -> anyhow::Result<u64> {
        let mut store = lock(&self.store);
        store.touch()?;
        let Some(docs) = store.collections.get_mut(&(database, collection)) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !matches(doc, &filter));
        Ok((before - docs.len()) as u64)
    }

    async fn count_documents(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
    ) -> anyhow::Result<u64> {
        let mut store = lock(&self.store);
        store.touch()?;
        let count = store
            .collection(&database, &collection)
            .iter()
            .filter(|doc| matches(doc, &filter))
            .count();
        Ok(count as u64)
    }

    async fn create_collection(
        &mut self,
        database: String,
        collection: String,
    ) -> anyhow::Result<()> {
        let mut store = lock(&self.store);
        store.touch()?;
        let key = (database, collection);
        anyhow::ensure!(!store.collections.contains_key(&key), "collection already exists");
        store.collections.insert(key, Vec::new());
        Ok(())
    }

    async fn drop_collection(
        &mut self,
        database: String,
        collection: String,
    ) -> anyhow::Result<()> {
        let mut store = lock(&self.store);
        store.touch()?;
        store.collections.remove(&(database, collection));
        Ok(())
    }

    async fn drop_database(&mut self, database: String) -> anyhow::Result<()> {
        let mut store = lock(&self.store);
        store.touch()?;
        store.collections.retain(|(db, _), _| *db != database);
        Ok(())
    }

    async fn list_collections(&mut self, database: String) -> anyhow::Result<Vec<String>> {
        let mut store = lock(&self.store);
        store.touch()?;
        Ok(store
            .collections
            .keys()
            .filter(|(db, _)| *db == database)
            .map(|(_, collection)| collection.clone())
            .collect())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        lock(&self.store).closes += 1;
        Ok(())
    }
}

pub fn connection() -> (MongoConnection, Shared<DocumentStore>) {
    let store = Arc::new(Mutex::new(DocumentStore::default()));
    let session = FakeDocuments { store: store.clone() };
    let conn = MongoConnection::with_session(Box::new(session), TIMEOUT).unwrap();
    (conn, store)
}

fn project(doc: &Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection else {
        return doc.clone();
    };
    doc.iter()
        .filter(|(key, _)| *key == "_id" || projection.contains_key(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Evaluates the subset of the query language the filter compiler emits.
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, cond)| match key.as_str() {
        "$and" => sub_filters(cond).iter().all(|f| matches(doc, f)),
        "$or" => sub_filters(cond).iter().any(|f| matches(doc, f)),
        field => field_matches(doc.get(field), cond),
    })
}

fn sub_filters(cond: &Bson) -> Vec<Document> {
    match cond {
        Bson::Array(items) => items
            .iter()
            .filter_map(|item| item.as_document().cloned())
            .collect(),
        other => panic!("expected an array of filters, got {other:?}"),
    }
}

fn is_operator_document(cond: &Bson) -> bool {
    matches!(cond, Bson::Document(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')))
}

fn field_matches(value: Option<&Bson>, cond: &Bson) -> bool {
    match cond {
        Bson::Document(ops) if is_operator_document(cond) => {
            ops.iter().all(|(op, arg)| operator_matches(value, op, arg))
        }
        Bson::RegularExpression(re) => regex_matches(value, re),
        Bson::Null => value.map_or(true, |v| *v == Bson::Null),
        expected => value.is_some_and(|v| compare(v, expected) == Some(Ordering::Equal)),
    }
}

fn operator_matches(value: Option<&Bson>, op: &str, arg: &Bson) -> bool {
    let ordered =
        |accept: fn(Ordering) -> bool| value.and_then(|v| compare(v, arg)).is_some_and(accept);
    match op {
        "$ne" | "$not" => !field_matches(value, arg),
        "$lt" => ordered(Ordering::is_lt),
        "$lte" => ordered(Ordering::is_le),
        "$gt" => ordered(Ordering::is_gt),
        "$gte" => ordered(Ordering::is_ge),
        "$in" => in_list(value, arg),
        "$nin" => !in_list(value, arg),
        other => panic!("unsupported operator {other}"),
    }
}

fn in_list(value: Option<&Bson>, arg: &Bson) -> bool {
    match arg {
        Bson::Array(items) => items.iter().any(|item| field_matches(value, item)),
        other => panic!("$in needs an array, got {other:?}"),
    }
}

fn regex_matches(value: Option<&Bson>, re: &Regex) -> bool {
    let pattern = regex::RegexBuilder::new(&re.pattern)
        .case_insensitive(re.options.contains('i'))
        .build()
        .expect("valid pattern");
    matches!(value, Some(Bson::String(s)) if pattern.is_match(s))
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(x) => Some(*x),
        _ => None,
    }
}

/// Orders two values of comparable kinds; numbers compare across widths.
fn compare(left: &Bson, right: &Bson) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (number(left), number(right)) {
        return l.partial_cmp(&r);
    }
    match (left, right) {
        (Bson::String(l), Bson::String(r)) => Some(l.cmp(r)),
        (l, r) if l == r => Some(Ordering::Equal),
        _ => None,
    }
}
