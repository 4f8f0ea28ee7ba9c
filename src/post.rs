//! Blog post data model.
//!
//! A post is stored as a single automerge document; [`BlogPost`] is the
//! typed view hydrated from (and reconciled into) that document.

use autosurgeon::{Hydrate, Reconcile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AutoblogError;

/// Publication status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reconcile, Hydrate)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = AutoblogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(AutoblogError::InvalidPost(format!(
                "unknown status {other:?}, expected \"draft\" or \"published\""
            ))),
        }
    }
}

/// A blog post as held in its automerge document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reconcile, Hydrate)]
pub struct BlogPost {
    pub title: String,
    pub author: String,
    /// Publish date as unix milliseconds
    pub published: i64,
    pub status: PostStatus,
    pub slug: String,
    pub description: String,
    /// Markdown body
    pub content: String,
    pub image_url: Option<String>,
}

impl BlogPost {
    /// Publish date as a chrono timestamp
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.published)
    }
}

/// Lightweight listing entry: everything but the body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub published: i64,
    pub status: PostStatus,
    pub document_id: String,
}

impl PostSummary {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.published)
    }
}
