//! The blog index: one automerge document mapping slugs to post document
//! IDs, created lazily per environment and rediscovered through the pointer
//! file in [`DocumentStorage`].

use automerge::AutoCommit;
use autosurgeon::{Hydrate, Reconcile};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::document::{DocumentId, DocumentStorage};
use crate::error::Result;

/// Typed view of the index document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Reconcile, Hydrate)]
pub struct BlogIndex {
    /// slug -> post document ID (bs58check string form)
    pub posts: HashMap<String, String>,
    /// Unix milliseconds of the last insert or remove
    pub updated_at: i64,
}

/// An open handle on the index document.
///
/// Mutations update the typed view, reconcile it back into the automerge
/// document, and leave persistence to [`IndexHandle::save`].
pub struct IndexHandle {
    id: DocumentId,
    doc: AutoCommit,
    index: BlogIndex,
}

impl IndexHandle {
    /// Load the index via the pointer file, creating it on first use.
    ///
    /// `pinned` overrides the pointer file so every environment of a
    /// deployment can converge on one shared index document.
    pub async fn get_or_create(
        storage: &DocumentStorage,
        pinned: Option<DocumentId>,
    ) -> Result<Self> {
        let pointer = storage.load_index_pointer().await?;
        let id = match pinned.or(pointer) {
            Some(id) => id,
            None => {
                let id = DocumentId::new();
                log::info!("creating new blog index {id}");
                id
            }
        };

        let (doc, index) = if storage.contains(&id).await {
            let doc = storage.load_document(&id).await?;
            let index: BlogIndex = autosurgeon::hydrate(&doc)?;
            (doc, index)
        } else {
            let index = BlogIndex {
                posts: HashMap::new(),
                updated_at: Utc::now().timestamp_millis(),
            };
            let mut doc = AutoCommit::new();
            autosurgeon::reconcile(&mut doc, &index)?;
            storage.save_document(&id, &mut doc).await?;
            (doc, index)
        };
        // Opening is a read path; only touch the pointer file when it moves.
        if pointer != Some(id) {
            storage.store_index_pointer(&id).await?;
        }

        Ok(Self { id, doc, index })
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Map a slug to a document ID, overwriting any previous mapping
    pub fn insert(&mut self, slug: &str, doc_id: &DocumentId) -> Result<()> {
        self.index.posts.insert(slug.to_string(), doc_id.to_string());
        self.touch()
    }

    /// Remove a slug; returns false if it was not present
    pub fn remove(&mut self, slug: &str) -> Result<bool> {
        if self.index.posts.remove(slug).is_none() {
            return Ok(false);
        }
        self.touch()?;
        Ok(true)
    }

    /// Look up the document ID for a slug
    pub fn find(&self, slug: &str) -> Result<Option<DocumentId>> {
        self.index.posts.get(slug).map(|raw| raw.parse()).transpose()
    }

    /// All (slug, document ID) entries
    pub fn entries(&self) -> Result<Vec<(String, DocumentId)>> {
        self.index
            .posts
            .iter()
            .map(|(slug, raw)| Ok((slug.clone(), raw.parse()?)))
            .collect()
    }

    /// All slugs in the index, sorted
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.index.posts.keys().cloned().collect();
        slugs.sort();
        slugs
    }

    pub fn len(&self) -> usize {
        self.index.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.posts.is_empty()
    }

    pub fn updated_at(&self) -> i64 {
        self.index.updated_at
    }

    /// Persist the index document
    pub async fn save(&mut self, storage: &DocumentStorage) -> Result<()> {
        storage.save_document(&self.id, &mut self.doc).await?;
        Ok(())
    }

    /// Access the underlying automerge document (for sync)
    pub fn document_mut(&mut self) -> &mut AutoCommit {
        &mut self.doc
    }

    /// Re-hydrate the typed view after the document changed underneath us
    /// (after a sync merge).
    pub fn refresh(&mut self) -> Result<()> {
        self.index = autosurgeon::hydrate(&self.doc)?;
        Ok(())
    }

    fn touch(&mut self) -> Result<()> {
        self.index.updated_at = Utc::now().timestamp_millis();
        autosurgeon::reconcile(&mut self.doc, &self.index)?;
        Ok(())
    }
}
