//! High-level blog operations shared by the CLI and the web viewer.
//!
//! Every operation is a short sequential script: load the index, call one
//! or two document operations, persist. The CLI is a short-lived process,
//! so mutations write through to disk immediately.

use automerge::AutoCommit;
use std::path::Path;

use crate::config::Config;
use crate::document::{DocumentId, DocumentStorage};
use crate::error::{AutoblogError, Result};
use crate::index::IndexHandle;
use crate::markdown;
use crate::post::{BlogPost, PostSummary};

/// Result of an upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub slug: String,
    pub document_id: DocumentId,
    /// True when a new document was created, false on re-upload
    pub created: bool,
    /// Size of the saved document in bytes
    pub bytes: usize,
}

/// Result of a listing
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Posts available locally, newest first
    pub posts: Vec<PostSummary>,
    /// Index entries whose document is not in local storage
    pub missing: Vec<(String, DocumentId)>,
}

/// The blog store: index plus document storage behind one API
pub struct BlogStore {
    config: Config,
    storage: DocumentStorage,
    pinned_index: Option<DocumentId>,
}

impl BlogStore {
    /// Open the store described by `config`
    pub async fn open(config: Config) -> Result<Self> {
        Self::open_with_index(config, None).await
    }

    /// Open the store with an explicit index document ID (web viewer and
    /// multi-device deployments pin one shared index this way)
    pub async fn open_with_index(
        config: Config,
        pinned_index: Option<DocumentId>,
    ) -> Result<Self> {
        let storage = DocumentStorage::open(config.storage.data_dir.clone()).await?;
        Ok(Self {
            config,
            storage,
            pinned_index,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &DocumentStorage {
        &self.storage
    }

    async fn index(&self) -> Result<IndexHandle> {
        IndexHandle::get_or_create(&self.storage, self.pinned_index).await
    }

    /// Parse a markdown file and publish it into the store.
    ///
    /// The slug is the identity key: a matching slug updates the existing
    /// document rather than minting a new ID, so re-upload mutates in place.
    pub async fn upload(&self, path: &Path) -> Result<UploadOutcome> {
        let source = tokio::fs::read_to_string(path).await?;
        let post = markdown::parse_post(&source)?;

        let mut index = self.index().await?;
        let existing = index.find(&post.slug)?;
        let document_id = existing.unwrap_or_default();

        let mut doc = if existing.is_some() && self.storage.contains(&document_id).await {
            self.storage.load_document(&document_id).await?
        } else {
            AutoCommit::new()
        };
        autosurgeon::reconcile(&mut doc, &post)?;
        let bytes = self.storage.save_document(&document_id, &mut doc).await?;

        index.insert(&post.slug, &document_id)?;
        index.save(&self.storage).await?;

        log::info!(
            "{} post {} as {document_id}",
            if existing.is_some() { "updated" } else { "created" },
            post.slug
        );
        Ok(UploadOutcome {
            slug: post.slug,
            document_id,
            created: existing.is_none(),
            bytes,
        })
    }

    /// Summaries of every indexed post, newest first.
    ///
    /// Entries whose document has not reached this device yet are reported
    /// in [`Listing::missing`] rather than failing the whole listing.
    pub async fn list(&self) -> Result<Listing> {
        let index = self.index().await?;
        let mut listing = Listing::default();
        for (slug, document_id) in index.entries()? {
            if !self.storage.contains(&document_id).await {
                listing.missing.push((slug, document_id));
                continue;
            }
            let doc = self.storage.load_document(&document_id).await?;
            let post: BlogPost = autosurgeon::hydrate(&doc)?;
            listing.posts.push(PostSummary {
                slug,
                title: post.title,
                author: post.author,
                published: post.published,
                status: post.status,
                document_id: document_id.to_string(),
            });
        }
        listing.posts.sort_by(|a, b| b.published.cmp(&a.published));
        listing.missing.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(listing)
    }

    /// Load the full post for a slug
    pub async fn get(&self, slug: &str) -> Result<BlogPost> {
        let index = self.index().await?;
        let document_id = index
            .find(slug)?
            .ok_or_else(|| AutoblogError::PostNotFound(slug.to_string()))?;
        let doc = self.storage.load_document(&document_id).await?;
        Ok(autosurgeon::hydrate(&doc)?)
    }

    /// Remove a post from the index and delete its document
    pub async fn delete(&self, slug: &str) -> Result<DocumentId> {
        let mut index = self.index().await?;
        let document_id = index
            .find(slug)?
            .ok_or_else(|| AutoblogError::PostNotFound(slug.to_string()))?;

        index.remove(slug)?;
        index.save(&self.storage).await?;

        // The index entry is gone either way; a document that never reached
        // this device is not an error here.
        match self.storage.remove_document(&document_id).await {
            Ok(()) | Err(AutoblogError::DocumentNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        log::info!("deleted post {slug} ({document_id})");
        Ok(document_id)
    }
}
