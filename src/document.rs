//! Document identifiers and filesystem document storage.
//!
//! Documents are stored by their [`DocumentId`] in the data directory:
//! - `<doc_id>.automerge`: automerge document binary
//! - `index-doc-id`: text file holding the blog index document ID
//!
//! The pointer file is environment-local. Two devices that never exchange
//! it will each lazily create their own index document, which is the one
//! spot where replicas can diverge outside the CRDT's control;
//! `AUTOBLOG_INDEX_ID` exists so deployments can pin a shared index.

use automerge::AutoCommit;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use uuid::Uuid;

use crate::error::{AutoblogError, Result};

const DOCUMENT_EXTENSION: &str = "automerge";
const INDEX_POINTER_FILE: &str = "index-doc-id";

/// Opaque identifier for an automerge document.
///
/// 16 random bytes, displayed as bs58check, which keeps IDs interchangeable
/// with automerge-repo peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId([u8; 16]);

impl DocumentId {
    /// Mint a fresh random identifier
    pub fn new() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(&self.0).with_check().into_string())
    }
}

impl FromStr for DocumentId {
    type Err = AutoblogError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| AutoblogError::InvalidDocumentId(format!("{s}: {e}")))?;
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| {
            AutoblogError::InvalidDocumentId(format!("{s}: expected 16 bytes"))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Filesystem storage adapter for automerge documents
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    data_dir: PathBuf,
}

impl DocumentStorage {
    /// Open (creating if needed) the storage directory
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self, id: &DocumentId) -> PathBuf {
        self.data_dir.join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    fn pointer_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_POINTER_FILE)
    }

    /// Persist a document, returning the number of bytes written
    pub async fn save_document(&self, id: &DocumentId, doc: &mut AutoCommit) -> Result<usize> {
        let bytes = doc.save();
        fs::write(self.document_path(id), &bytes).await?;
        log::debug!("saved document {id} ({} bytes)", bytes.len());
        Ok(bytes.len())
    }

    /// Load a document from disk
    pub async fn load_document(&self, id: &DocumentId) -> Result<AutoCommit> {
        let path = self.document_path(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AutoblogError::DocumentNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(AutoCommit::load(&bytes)?)
    }

    pub async fn contains(&self, id: &DocumentId) -> bool {
        fs::try_exists(self.document_path(id)).await.unwrap_or(false)
    }

    /// Delete a document's backing file
    pub async fn remove_document(&self, id: &DocumentId) -> Result<()> {
        match fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AutoblogError::DocumentNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All document IDs present in the data directory
    pub async fn list_documents(&self) -> Result<Vec<DocumentId>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = stem.parse() {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// On-disk size of a document in bytes
    pub async fn document_size(&self, id: &DocumentId) -> Result<u64> {
        let meta = fs::metadata(self.document_path(id)).await?;
        Ok(meta.len())
    }

    /// Read the persisted index pointer, if one exists
    pub async fn load_index_pointer(&self) -> Result<Option<DocumentId>> {
        match fs::read_to_string(self.pointer_path()).await {
            Ok(raw) => Ok(Some(raw.trim().parse()?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the index pointer for subsequent runs
    pub async fn store_index_pointer(&self, id: &DocumentId) -> Result<()> {
        fs::write(self.pointer_path(), format!("{id}\n")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, DocumentStorage) {
        let dir = TempDir::new().unwrap();
        let storage = DocumentStorage::open(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[test]
    fn test_document_id_round_trip() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_document_id_rejects_garbage() {
        assert!("not base58 0OIl".parse::<DocumentId>().is_err());
        // Valid bs58check but wrong payload length
        let short = bs58::encode(&[1u8, 2, 3]).with_check().into_string();
        assert!(short.parse::<DocumentId>().is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_document() {
        let (_dir, storage) = open_temp().await;
        let id = DocumentId::new();

        let mut entries = std::collections::HashMap::new();
        entries.insert("greeting".to_string(), "hello".to_string());

        let mut doc = AutoCommit::new();
        autosurgeon::reconcile(&mut doc, &entries).unwrap();
        let written = storage.save_document(&id, &mut doc).await.unwrap();
        assert!(written > 0);
        assert_eq!(storage.document_size(&id).await.unwrap(), written as u64);

        let loaded = storage.load_document(&id).await.unwrap();
        let restored: std::collections::HashMap<String, String> =
            autosurgeon::hydrate(&loaded).unwrap();
        assert_eq!(restored, entries);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let (_dir, storage) = open_temp().await;
        let id = DocumentId::new();
        assert!(!storage.contains(&id).await);
        assert!(matches!(
            storage.load_document(&id).await,
            Err(AutoblogError::DocumentNotFound(_))
        ));
        assert!(matches!(
            storage.remove_document(&id).await,
            Err(AutoblogError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_documents() {
        let (_dir, storage) = open_temp().await;
        let a = DocumentId::new();
        let b = DocumentId::new();
        for id in [&a, &b] {
            let mut doc = AutoCommit::new();
            storage.save_document(id, &mut doc).await.unwrap();
        }
        let mut listed = storage.list_documents().await.unwrap();
        listed.sort_by_key(|id| id.to_string());
        let mut expected = vec![a, b];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn test_index_pointer_round_trip() {
        let (_dir, storage) = open_temp().await;
        assert_eq!(storage.load_index_pointer().await.unwrap(), None);
        let id = DocumentId::new();
        storage.store_index_pointer(&id).await.unwrap();
        assert_eq!(storage.load_index_pointer().await.unwrap(), Some(id));
    }
}
