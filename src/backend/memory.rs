//! In-memory data source
//!
//! Collections are insertion-ordered vectors; identifiers come from a
//! per-collection sequence starting at 1. Reads go through a `StagingCache`
//! unless the read is read-only or bypasses staging. Named queries stand in
//! for explicit query text.
//!
//! Not thread-safe: the staging cache and counters use interior mutability.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use crate::query::RawQuery;
use crate::record::{Record, RecordId};

use super::errors::{BackendError, BackendResult};
use super::source::{DataSource, FieldSelection, LockMode, ReadOptions};
use super::staging::{StagingCache, StagingConfig, StagingKey, StagingStats};

/// Filter backing a named query
pub type NamedQueryFn = Box<dyn Fn(&Record, &RawQuery) -> bool>;

struct NamedQuery {
    collection: String,
    filter: NamedQueryFn,
}

impl std::fmt::Debug for NamedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedQuery")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Collection {
    records: Vec<Record>,
    positions: HashMap<RecordId, usize>,
    next_id: u64,
}

impl Collection {
    fn position(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    fn reindex(&mut self) {
        self.positions = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id(), pos))
            .collect();
    }
}

/// Call counters, for asserting access patterns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub scans: u64,
    pub point_lookups: u64,
    pub batch_lookups: u64,
    pub direct_writes: u64,
    pub raw_queries: u64,
}

#[derive(Debug, Default)]
struct Counters {
    scans: Cell<u64>,
    point_lookups: Cell<u64>,
    batch_lookups: Cell<u64>,
    direct_writes: Cell<u64>,
    raw_queries: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

/// In-memory `DataSource`
#[derive(Debug)]
pub struct MemoryBackend {
    collections: BTreeMap<String, Collection>,
    staging: RefCell<StagingCache>,
    named_queries: HashMap<String, NamedQuery>,
    counters: Counters,
    last_lock: Cell<LockMode>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(StagingConfig::default())
    }
}

impl MemoryBackend {
    pub fn new(staging: StagingConfig) -> Self {
        Self {
            collections: BTreeMap::new(),
            staging: RefCell::new(StagingCache::new(staging)),
            named_queries: HashMap::new(),
            counters: Counters::default(),
            last_lock: Cell::new(LockMode::None),
        }
    }

    /// Declares a collection; writes to undeclared collections fail
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.create_collection(name);
        self
    }

    pub fn create_collection(&mut self, name: impl Into<String>) {
        self.collections.entry(name.into()).or_insert_with(|| Collection {
            next_id: 1,
            ..Collection::default()
        });
    }

    /// Registers a named query evaluated for `QueryDescriptor::text(name)`
    pub fn register_named_query<F>(&mut self, name: impl Into<String>, collection: impl Into<String>, filter: F)
    where
        F: Fn(&Record, &RawQuery) -> bool + 'static,
    {
        self.named_queries.insert(
            name.into(),
            NamedQuery {
                collection: collection.into(),
                filter: Box::new(filter),
            },
        );
    }

    /// Access counters since creation
    pub fn stats(&self) -> BackendStats {
        BackendStats {
            scans: self.counters.scans.get(),
            point_lookups: self.counters.point_lookups.get(),
            batch_lookups: self.counters.batch_lookups.get(),
            direct_writes: self.counters.direct_writes.get(),
            raw_queries: self.counters.raw_queries.get(),
        }
    }

    pub fn staging_stats(&self) -> StagingStats {
        self.staging.borrow().stats().clone()
    }

    /// Number of staged records
    pub fn staged_len(&self) -> usize {
        self.staging.borrow().len()
    }

    /// Returns true if the record is currently staged
    pub fn is_staged(&self, collection: &str, id: RecordId) -> bool {
        self.staging.borrow().contains(&StagingKey::new(collection, id))
    }

    /// Lock mode of the most recent read
    pub fn last_lock(&self) -> LockMode {
        self.last_lock.get()
    }

    fn collection(&self, name: &str) -> BackendResult<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| BackendError::UnknownCollection(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> BackendResult<&mut Collection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| BackendError::UnknownCollection(name.to_string()))
    }

    /// Resolves one stored record through the staging layer
    fn read_through(&self, collection: &str, stored: &Record, options: &ReadOptions) -> Record {
        if options.bypass_staging {
            return stored.clone();
        }
        let key = StagingKey::new(collection, stored.id());
        let mut staging = self.staging.borrow_mut();
        if let Some(staged) = staging.get(&key) {
            return staged.clone();
        }
        if !options.read_only {
            staging.stage(key, stored.clone());
        }
        stored.clone()
    }
}

impl DataSource for MemoryBackend {
    fn insert(&mut self, collection: &str, fields: Map<String, Value>) -> BackendResult<Record> {
        let coll = self.collection_mut(collection)?;
        let id = RecordId(coll.next_id);
        coll.next_id += 1;

        let record = Record::new(id, fields);
        coll.positions.insert(id, coll.records.len());
        coll.records.push(record.clone());

        self.staging
            .get_mut()
            .stage(StagingKey::new(collection, id), record.clone());
        Ok(record)
    }

    fn update(&mut self, collection: &str, record: Record) -> BackendResult<()> {
        let coll = self.collection_mut(collection)?;
        let pos = coll
            .position(record.id())
            .ok_or_else(|| BackendError::MissingRecord {
                collection: collection.to_string(),
                id: record.id(),
            })?;
        coll.records[pos] = record.clone();

        self.staging
            .get_mut()
            .replace(StagingKey::new(collection, record.id()), record);
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: RecordId) -> BackendResult<bool> {
        let coll = self.collection_mut(collection)?;
        let Some(pos) = coll.position(id) else {
            return Ok(false);
        };
        coll.records.remove(pos);
        coll.reindex();

        self.staging.get_mut().remove(&StagingKey::new(collection, id));
        Ok(true)
    }

    fn count(&self, collection: &str) -> BackendResult<usize> {
        Ok(self.collection(collection)?.records.len())
    }

    fn scan(
        &self,
        collection: &str,
        selection: &FieldSelection,
        options: &ReadOptions,
    ) -> BackendResult<Vec<Record>> {
        bump(&self.counters.scans);
        self.last_lock.set(options.lock);

        let coll = self.collection(collection)?;
        Ok(coll
            .records
            .iter()
            .map(|stored| selection.apply(self.read_through(collection, stored, options)))
            .collect())
    }

    fn get(
        &self,
        collection: &str,
        id: RecordId,
        options: &ReadOptions,
    ) -> BackendResult<Option<Record>> {
        bump(&self.counters.point_lookups);
        self.last_lock.set(options.lock);

        let coll = self.collection(collection)?;
        Ok(coll
            .position(id)
            .map(|pos| self.read_through(collection, &coll.records[pos], options)))
    }

    fn get_many(
        &self,
        collection: &str,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> BackendResult<Vec<Record>> {
        bump(&self.counters.batch_lookups);

        let coll = self.collection(collection)?;
        let options = ReadOptions::read_only();
        Ok(ids
            .iter()
            .filter_map(|id| coll.position(*id))
            .map(|pos| selection.apply(self.read_through(collection, &coll.records[pos], &options)))
            .collect())
    }

    fn write_direct(&mut self, collection: &str, records: Vec<Record>) -> BackendResult<usize> {
        bump(&self.counters.direct_writes);

        let coll = self.collection_mut(collection)?;
        let mut positions = Vec::with_capacity(records.len());
        for record in &records {
            let pos = coll
                .position(record.id())
                .ok_or_else(|| BackendError::MissingRecord {
                    collection: collection.to_string(),
                    id: record.id(),
                })?;
            positions.push(pos);
        }

        let written = records.len();
        for (pos, record) in positions.into_iter().zip(records) {
            coll.records[pos] = record;
        }
        Ok(written)
    }

    fn invalidate(&mut self, collection: &str, ids: &[RecordId]) -> usize {
        self.staging.get_mut().invalidate(collection, ids)
    }

    fn clear_staging(&mut self) {
        self.staging.get_mut().clear();
    }

    fn evaluate_raw(
        &self,
        collection: &str,
        query: &RawQuery,
        options: &ReadOptions,
    ) -> BackendResult<Vec<Record>> {
        bump(&self.counters.raw_queries);
        self.last_lock.set(options.lock);

        let named = self
            .named_queries
            .get(&query.text)
            .filter(|named| named.collection == collection)
            .ok_or_else(|| BackendError::UnsupportedQuery(query.text.clone()))?;

        let coll = self.collection(collection)?;
        Ok(coll
            .records
            .iter()
            .map(|stored| self.read_through(collection, stored, options))
            .filter(|record| (named.filter)(record, query))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::default().with_collection("member")
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut backend = backend();
        let a = backend.insert("member", fields(json!({"username": "a"}))).unwrap();
        let b = backend.insert("member", fields(json!({"username": "b"}))).unwrap();

        assert_eq!(a.id(), RecordId(1));
        assert_eq!(b.id(), RecordId(2));
        assert_eq!(backend.count("member").unwrap(), 2);
        assert!(backend.is_staged("member", a.id()));
    }

    #[test]
    fn test_unknown_collection() {
        let mut backend = backend();
        let err = backend.insert("team", Map::new()).unwrap_err();
        assert_eq!(err, BackendError::UnknownCollection("team".into()));
    }

    #[test]
    fn test_scan_insertion_order_and_selection() {
        let mut backend = backend();
        for name in ["c", "a", "b"] {
            backend
                .insert("member", fields(json!({"username": name, "age": 1})))
                .unwrap();
        }

        let rows = backend
            .scan(
                "member",
                &FieldSelection::only(["username"]),
                &ReadOptions::default(),
            )
            .unwrap();
        let names: Vec<&str> = rows.iter().filter_map(|r| r.get_str("username")).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert!(rows[0].get("age").is_none());
    }

    #[test]
    fn test_direct_write_bypasses_staging() {
        let mut backend = backend();
        let mut record = backend
            .insert("member", fields(json!({"username": "a", "age": 10})))
            .unwrap();

        record.set("age", json!(11)).unwrap();
        backend.write_direct("member", vec![record.clone()]).unwrap();

        // staged copy is stale until invalidated
        let staged = backend
            .get("member", record.id(), &ReadOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(staged.get_i64("age"), Some(10));

        let direct = backend
            .get("member", record.id(), &ReadOptions::direct())
            .unwrap()
            .unwrap();
        assert_eq!(direct.get_i64("age"), Some(11));

        assert_eq!(backend.invalidate("member", &[record.id()]), 1);
        let fresh = backend
            .get("member", record.id(), &ReadOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(fresh.get_i64("age"), Some(11));
    }

    #[test]
    fn test_direct_write_all_or_nothing() {
        let mut backend = backend();
        let mut a = backend.insert("member", fields(json!({"age": 1}))).unwrap();
        a.set("age", json!(2)).unwrap();
        let ghost = Record::new(RecordId(99), Map::new());

        let err = backend.write_direct("member", vec![a.clone(), ghost]).unwrap_err();
        assert_eq!(err.code(), "AERO_BACKEND_MISSING_RECORD");

        let stored = backend.get("member", a.id(), &ReadOptions::direct()).unwrap().unwrap();
        assert_eq!(stored.get_i64("age"), Some(1));
    }

    #[test]
    fn test_read_only_not_staged() {
        let mut backend = backend();
        let a = backend.insert("member", fields(json!({"age": 1}))).unwrap();
        backend.clear_staging();

        backend.get("member", a.id(), &ReadOptions::read_only()).unwrap();
        assert!(!backend.is_staged("member", a.id()));

        backend.get("member", a.id(), &ReadOptions::default()).unwrap();
        assert!(backend.is_staged("member", a.id()));
    }

    #[test]
    fn test_delete_reindexes() {
        let mut backend = backend();
        let a = backend.insert("member", fields(json!({"username": "a"}))).unwrap();
        let b = backend.insert("member", fields(json!({"username": "b"}))).unwrap();

        assert!(backend.delete("member", a.id()).unwrap());
        assert!(!backend.delete("member", a.id()).unwrap());

        let found = backend.get("member", b.id(), &ReadOptions::direct()).unwrap();
        assert_eq!(found.and_then(|r| r.get_str("username").map(String::from)), Some("b".into()));
    }

    #[test]
    fn test_get_many_single_call() {
        let mut backend = backend();
        let ids: Vec<RecordId> = (0..3)
            .map(|i| backend.insert("member", fields(json!({"age": i}))).unwrap().id())
            .collect();

        let rows = backend
            .get_many("member", &[ids[2], RecordId(42), ids[0]], &FieldSelection::All)
            .unwrap();
        assert_eq!(rows.iter().map(Record::id).collect::<Vec<_>>(), vec![ids[2], ids[0]]);
        assert_eq!(backend.stats().batch_lookups, 1);
    }

    #[test]
    fn test_get_many_read_only() {
        let mut backend = backend();
        let a = backend.insert("member", fields(json!({"age": 1}))).unwrap();
        let b = backend.insert("member", fields(json!({"age": 2}))).unwrap();
        backend.clear_staging();
        backend.get("member", a.id(), &ReadOptions::default()).unwrap();
        backend
            .write_direct("member", vec![Record::new(a.id(), fields(json!({"age": 10})))])
            .unwrap();

        let rows = backend
            .get_many("member", &[a.id(), b.id()], &FieldSelection::All)
            .unwrap();

        // staged copy still served, nothing new staged
        assert_eq!(rows[0].get_i64("age"), Some(1));
        assert!(!backend.is_staged("member", b.id()));
        assert_eq!(backend.staged_len(), 1);
    }

    #[test]
    fn test_named_query() {
        let mut backend = backend();
        backend.insert("member", fields(json!({"username": "AAA"}))).unwrap();
        backend.insert("member", fields(json!({"username": "BBB"}))).unwrap();
        backend.register_named_query("Member.findByUsername", "member", |record, query| {
            query.param("username") == record.get("username")
        });

        let mut params = std::collections::BTreeMap::new();
        params.insert("username".to_string(), json!("BBB"));
        let query = RawQuery {
            text: "Member.findByUsername".into(),
            params,
        };
        let rows = backend
            .evaluate_raw("member", &query, &ReadOptions::default())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("username"), Some("BBB"));

        let unknown = RawQuery {
            text: "select m from Member m".into(),
            params: Default::default(),
        };
        assert!(matches!(
            backend.evaluate_raw("member", &unknown, &ReadOptions::default()),
            Err(BackendError::UnsupportedQuery(_))
        ));
    }

    #[test]
    fn test_last_lock_recorded() {
        let backend = backend();
        backend
            .scan(
                "member",
                &FieldSelection::All,
                &ReadOptions::locked(LockMode::PessimisticWrite),
            )
            .unwrap();
        assert_eq!(backend.last_lock(), LockMode::PessimisticWrite);
    }
}
