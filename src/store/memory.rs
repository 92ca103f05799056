// In-memory document store
//
// Each write holds the dashmap shard lock for its key while it checks the
// precondition and swaps in the new document, so writes to one document are
// serialized.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::{
    apply_write, DocumentPath, DocumentStore, Fields, Precondition, Snapshot, StoreError,
    StoredDocument, WriteMode, WriteResult,
};

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<DashMap<String, StoredDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn write(
        &self,
        path: &DocumentPath,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<WriteResult, StoreError> {
        let document = match self.documents.entry(path.to_string()) {
            Entry::Occupied(mut entry) => {
                let document = apply_write(path, Some(entry.get()), fields, mode)?;
                entry.insert(document.clone());
                document
            }
            Entry::Vacant(entry) => {
                let document = apply_write(path, None, fields, mode)?;
                entry.insert(document.clone());
                document
            }
        };

        tracing::debug!(path = %path, version = document.version, "Wrote document");

        Ok(WriteResult {
            version: document.version,
            update_time: document.update_time,
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Snapshot>, StoreError> {
        Ok(self
            .documents
            .get(&path.to_string())
            .map(|entry| entry.value().snapshot()))
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<WriteResult, StoreError> {
        self.write(path, fields, WriteMode::Update)
    }

    async fn set_merge(
        &self,
        path: &DocumentPath,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<WriteResult, StoreError> {
        self.write(path, fields, WriteMode::SetMerge(precondition))
    }
}
