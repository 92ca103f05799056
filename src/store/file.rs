// File-backed document store
//
// One pretty-printed JSON file per document, mirroring the document path:
// `users/u1/journals/j1` lives at `<root>/users/u1/journals/j1.json`.
// Writes take an exclusive lock on `<root>/.lock` around the
// read-check-write and replace the file with an atomic rename.

use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{
    apply_write, DocumentPath, DocumentStore, Fields, Precondition, Snapshot, StoreError,
    StoredDocument, WriteMode, WriteResult,
};

const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::info!(root = %root.display(), "Opened file document store");
        Ok(Self { root })
    }

    fn document_file(&self, path: &DocumentPath) -> PathBuf {
        let mut file = self.root.clone();
        let segments = path.segments();
        if let Some((last, parents)) = segments.split_last() {
            for segment in parents {
                file.push(segment);
            }
            file.push(format!("{}.json", last));
        }
        file
    }

    fn read_document(file: &Path) -> Result<Option<StoredDocument>, StoreError> {
        match fs::read_to_string(file) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_blocking(
        root: &Path,
        file: &Path,
        path: &DocumentPath,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<WriteResult, StoreError> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(root.join(LOCK_FILE))?;
        lock_file.lock_exclusive()?;

        let current = Self::read_document(file)?;
        let document = apply_write(path, current.as_ref(), fields, mode)?;

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically (write to temp, then rename)
        let temp_path = file.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(&document)?)?;
        fs::rename(&temp_path, file)?;

        // Lock released when lock_file drops
        Ok(WriteResult {
            version: document.version,
            update_time: document.update_time,
        })
    }

    async fn write(
        &self,
        path: &DocumentPath,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<WriteResult, StoreError> {
        let root = self.root.clone();
        let file = self.document_file(path);
        let path = path.clone();

        let result = tokio::task::spawn_blocking(move || {
            Self::write_blocking(&root, &file, &path, fields, mode)
        })
        .await??;

        tracing::debug!(version = result.version, "Wrote document file");
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Snapshot>, StoreError> {
        let file = self.document_file(path);
        let document = tokio::task::spawn_blocking(move || Self::read_document(&file)).await??;
        Ok(document.map(|doc| doc.snapshot()))
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<WriteResult, StoreError> {
        self.write(path, fields, WriteMode::Update).await
    }

    async fn set_merge(
        &self,
        path: &DocumentPath,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<WriteResult, StoreError> {
        self.write(path, fields, WriteMode::SetMerge(precondition)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_file_layout() {
        let root = std::env::temp_dir().join("mindmitra_layout_test");
        let store = FileDocumentStore::new(&root).unwrap();
        let path = DocumentPath::journal("u1", "entry.v2").unwrap();

        let file = store.document_file(&path);
        assert_eq!(
            file,
            root.join("users").join("u1").join("journals").join("entry.v2.json")
        );
    }
}
