//! Document store facade.
//!
//! Executes list/insert/find/update/delete/count against a (database, collection)
//! pair. Databases and collections are created implicitly on first write; reading
//! from one that does not exist yields nothing.

pub mod filter;

use serde_json::{Map, Value as JsonValue};
use stratadb::{BranchId, Command, Output};

use crate::convert::{json_to_value, output_to_document};
use crate::error::{McpError, Result};
use crate::session::StoreSession;

pub use filter::ID_FIELD;

/// Default number of documents returned by [`DocumentStore::find`].
pub const DEFAULT_FIND_LIMIT: usize = 10;

const LIST_PAGE: u64 = 1000;

/// A (database, collection) pair identifying a document collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHandle<'a> {
    /// Database name
    pub database: &'a str,
    /// Collection name
    pub collection: &'a str,
}

impl<'a> ResourceHandle<'a> {
    /// Create a handle. Names are passed through to the backend unvalidated.
    pub fn new(database: &'a str, collection: &'a str) -> Self {
        Self {
            database,
            collection,
        }
    }

    fn branch(&self) -> Option<BranchId> {
        Some(BranchId::from(self.database.to_string()))
    }

    fn space(&self) -> Option<String> {
        Some(self.collection.to_string())
    }
}

/// CRUD facade over the embedded document engine.
pub struct DocumentStore {
    session: StoreSession,
}

impl DocumentStore {
    /// Wrap an open backend session.
    pub fn new(session: StoreSession) -> Self {
        Self { session }
    }

    /// List every database.
    pub fn list_databases(&mut self) -> Result<Vec<String>> {
        self.session.list_databases()
    }

    /// List the collections of `database`; empty if the database does not exist.
    pub fn list_collections(&mut self, database: &str) -> Result<Vec<String>> {
        if !self.session.database_exists(database)? {
            return Ok(Vec::new());
        }
        self.session.list_collections(database)
    }

    /// Insert a document and return its `_id`.
    ///
    /// A caller-supplied `_id` of any type is kept; otherwise a UUID string is
    /// assigned. Inserting a second document with the same `_id` fails.
    pub fn insert(&mut self, handle: ResourceHandle<'_>, mut document: Map<String, JsonValue>) -> Result<JsonValue> {
        let id = match document.get(ID_FIELD) {
            Some(id) => id.clone(),
            None => {
                let id = JsonValue::String(uuid::Uuid::new_v4().to_string());
                document.insert(ID_FIELD.to_string(), id.clone());
                id
            }
        };
        let key = document_key(&id)?;

        self.with_context(handle, |store| {
            store.session.ensure_collection(handle.database, handle.collection)?;
            if store.get(handle, &key)?.is_some() {
                return Err(McpError::InvalidArg {
                    name: "document".to_string(),
                    reason: format!("duplicate _id {}", id),
                });
            }
            store
                .session
                .execute(set_command(handle, &key, JsonValue::Object(document))?)?;
            Ok(())
        })?;

        tracing::debug!(database = handle.database, collection = handle.collection, %id, "inserted document");
        Ok(id)
    }

    /// Return up to `limit` documents matching `query`, in the engine's key order.
    ///
    /// A `limit` of 0 means no limit.
    pub fn find(
        &mut self,
        handle: ResourceHandle<'_>,
        query: &Map<String, JsonValue>,
        limit: usize,
    ) -> Result<Vec<JsonValue>> {
        filter::validate(query)?;
        let limit = if limit == 0 { usize::MAX } else { limit };
        self.with_context(handle, |store| {
            let mut found = Vec::new();
            for key in store.keys(handle)? {
                if let Some(doc) = store.get(handle, &key)? {
                    if filter::matches(&doc, query) {
                        found.push(doc);
                        if found.len() >= limit {
                            break;
                        }
                    }
                }
            }
            Ok(found)
        })
    }

    /// Set the fields of `update` on every document matching `query`.
    ///
    /// Every matching document is rewritten in memory first; the writes then go
    /// out in one transaction, so a failure leaves the collection untouched.
    /// Returns how many documents actually changed.
    pub fn update(
        &mut self,
        handle: ResourceHandle<'_>,
        query: &Map<String, JsonValue>,
        update: &Map<String, JsonValue>,
    ) -> Result<u64> {
        filter::validate(query)?;
        filter::validate_update(update)?;
        let modified = self.with_context(handle, |store| {
            let mut changed = Vec::new();
            for key in store.keys(handle)? {
                let Some(mut doc) = store.get(handle, &key)? else {
                    continue;
                };
                if filter::matches(&doc, query) && filter::apply_set(&mut doc, update)? {
                    changed.push((key, doc));
                }
            }

            let modified = changed.len() as u64;
            if !changed.is_empty() {
                store.session.transaction(handle.database, |session| {
                    for (key, doc) in changed {
                        session.execute(set_command(handle, &key, doc)?)?;
                    }
                    Ok(())
                })?;
            }
            Ok(modified)
        })?;
        tracing::debug!(database = handle.database, collection = handle.collection, modified, "updated documents");
        Ok(modified)
    }

    /// Remove every document matching `query`; returns how many were removed.
    ///
    /// The deletes run in one transaction.
    pub fn delete(&mut self, handle: ResourceHandle<'_>, query: &Map<String, JsonValue>) -> Result<u64> {
        filter::validate(query)?;
        let deleted = self.with_context(handle, |store| {
            let mut doomed = Vec::new();
            for key in store.keys(handle)? {
                if let Some(doc) = store.get(handle, &key)? {
                    if filter::matches(&doc, query) {
                        doomed.push(key);
                    }
                }
            }

            let deleted = doomed.len() as u64;
            if !doomed.is_empty() {
                store.session.transaction(handle.database, |session| {
                    for key in doomed {
                        session.execute(Command::JsonDelete {
                            branch: handle.branch(),
                            space: handle.space(),
                            key,
                            path: "$".to_string(),
                        })?;
                    }
                    Ok(())
                })?;
            }
            Ok(deleted)
        })?;
        tracing::debug!(database = handle.database, collection = handle.collection, deleted, "deleted documents");
        Ok(deleted)
    }

    /// Count documents matching `query` without returning them.
    pub fn count(&mut self, handle: ResourceHandle<'_>, query: &Map<String, JsonValue>) -> Result<u64> {
        filter::validate(query)?;
        self.with_context(handle, |store| {
            let mut count = 0;
            for key in store.keys(handle)? {
                if let Some(doc) = store.get(handle, &key)? {
                    if filter::matches(&doc, query) {
                        count += 1;
                    }
                }
            }
            Ok(count)
        })
    }

    /// Run `f`, tagging backend errors with the collection they came from.
    fn with_context<T>(
        &mut self,
        handle: ResourceHandle<'_>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        f(self).map_err(|e| e.in_collection(handle.database, handle.collection))
    }

    /// All document keys in the collection; empty if it does not exist.
    fn keys(&mut self, handle: ResourceHandle<'_>) -> Result<Vec<String>> {
        if !self.session.collection_exists(handle.database, handle.collection)? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut cursor = None;
        loop {
            let output = self.session.execute(Command::JsonList {
                branch: handle.branch(),
                space: handle.space(),
                prefix: None,
                cursor: cursor.take(),
                limit: LIST_PAGE,
            })?;
            match output {
                Output::JsonListResult { keys: page, cursor: next } => {
                    keys.extend(page);
                    match next {
                        Some(c) => cursor = Some(c),
                        None => break,
                    }
                }
                _ => return Err(McpError::Internal("Unexpected output for JsonList".to_string())),
            }
        }
        Ok(keys)
    }

    fn get(&mut self, handle: ResourceHandle<'_>, key: &str) -> Result<Option<JsonValue>> {
        let output = self.session.execute(Command::JsonGet {
            branch: handle.branch(),
            space: handle.space(),
            key: key.to_string(),
            path: "$".to_string(),
        })?;
        Ok(output_to_document(output))
    }
}

/// Backend key of a document: the canonical JSON text of its `_id`.
fn document_key(id: &JsonValue) -> Result<String> {
    Ok(serde_json::to_string(id)?)
}

fn set_command(handle: ResourceHandle<'_>, key: &str, document: JsonValue) -> Result<Command> {
    Ok(Command::JsonSet {
        branch: handle.branch(),
        space: handle.space(),
        key: key.to_string(),
        path: "$".to_string(),
        value: json_to_value(document)?,
    })
}
