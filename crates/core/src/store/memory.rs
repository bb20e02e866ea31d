use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ListQuery, Record, RemoteStore};
use crate::error::StoreError;

type Row = Map<String, Value>;

/// Thread-safe in-process table store with the same semantics as the hosted backend.
///
/// Rows are kept as JSON objects so every read and write goes through the
/// same serde mapping the REST client uses.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<&'static str, Vec<Row>>,
    unavailable: HashSet<&'static str>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `collection` fail as if the backend were down.
    pub fn set_unavailable(&self, collection: &'static str, unavailable: bool) {
        let mut inner = self.inner.write();
        if unavailable {
            inner.unavailable.insert(collection);
        } else {
            inner.unavailable.remove(collection);
        }
    }

    /// Number of rows currently held in `collection`.
    pub fn row_count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .tables
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_available(inner: &Inner, collection: &'static str) -> Result<(), StoreError> {
        if inner.unavailable.contains(collection) {
            return Err(StoreError::Rejected {
                collection,
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn to_row(collection: &'static str, value: &impl Serialize) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(StoreError::Decode {
            collection,
            message: format!("expected an object, got {other}"),
        }),
        Err(err) => Err(StoreError::Decode {
            collection,
            message: err.to_string(),
        }),
    }
}

fn from_row<R: DeserializeOwned>(collection: &'static str, row: &Row) -> Result<R, StoreError> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|err| StoreError::Decode {
        collection,
        message: err.to_string(),
    })
}

fn matches(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(text)) => text == expected,
        Some(Value::Null) | None => expected == "null",
        Some(other) => other.to_string() == expected,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn position(rows: &[Row], id: &str) -> Option<usize> {
    rows.iter().position(|row| matches(row.get("id"), id))
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list<R: Record>(&self, query: &ListQuery) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.read();
        Self::check_available(&inner, R::COLLECTION)?;
        let mut rows: Vec<&Row> = inner
            .tables
            .get(R::COLLECTION)
            .map(|rows| rows.iter().collect())
            .unwrap_or_default();

        if let Some(filter) = &query.filter {
            rows.retain(|row| matches(row.get(filter.column), &filter.value));
        }
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(order.column), b.get(order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        rows.into_iter()
            .map(|row| from_row(R::COLLECTION, row))
            .collect()
    }

    async fn get_by_id<R: Record>(&self, id: &R::Id) -> Result<R, StoreError> {
        let inner = self.inner.read();
        Self::check_available(&inner, R::COLLECTION)?;
        let key = id.to_string();
        let rows = inner
            .tables
            .get(R::COLLECTION)
            .map(Vec::as_slice)
            .unwrap_or_default();
        match position(rows, &key) {
            Some(index) => from_row(R::COLLECTION, &rows[index]),
            None => Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id: key,
            }),
        }
    }

    async fn insert<R: Record>(&self, fields: &R::Insert) -> Result<R, StoreError> {
        let mut inner = self.inner.write();
        Self::check_available(&inner, R::COLLECTION)?;
        let mut row = to_row(R::COLLECTION, fields)?;
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        row.insert("created_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        let record = from_row(R::COLLECTION, &row)?;
        inner.tables.entry(R::COLLECTION).or_default().push(row);
        Ok(record)
    }

    async fn update<R: Record>(&self, id: &R::Id, changes: &R::Update) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        Self::check_available(&inner, R::COLLECTION)?;
        let changes = to_row(R::COLLECTION, changes)?;
        let key = id.to_string();
        let rows = inner.tables.entry(R::COLLECTION).or_default();
        let Some(index) = position(rows, &key) else {
            return Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id: key,
            });
        };

        let mut updated = rows[index].clone();
        updated.extend(changes);
        // Refuse writes that would leave the row undecodable, as a typed column would.
        from_row::<R>(R::COLLECTION, &updated)?;
        rows[index] = updated;
        Ok(())
    }

    async fn delete<R: Record>(&self, id: &R::Id) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        Self::check_available(&inner, R::COLLECTION)?;
        let key = id.to_string();
        let rows = inner.tables.entry(R::COLLECTION).or_default();
        match position(rows, &key) {
            Some(index) => {
                rows.remove(index);
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id: key,
            }),
        }
    }
}
