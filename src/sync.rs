//! WebSocket sync client.
//!
//! Conflict resolution and the sync algorithm itself belong to automerge;
//! this module only shuttles encoded sync messages over a WebSocket until
//! both sides are quiescent. One connection is opened per document: the
//! first frame is the document ID as text, every following binary frame is
//! an encoded `automerge::sync::Message`.

use automerge::sync::{self, SyncDoc};
use automerge::AutoCommit;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::config::Config;
use crate::document::{DocumentId, DocumentStorage};
use crate::error::{AutoblogError, Result};
use crate::index::IndexHandle;

/// How long to wait for a server frame when we have nothing left to send
/// before declaring the exchange quiescent.
const QUIESCENT_GRACE: Duration = Duration::from_millis(500);

/// Outcome of syncing one document
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub document_id: DocumentId,
    /// True when the exchange changed our local document
    pub changed: bool,
}

/// Client for a remote automerge sync server
pub struct SyncClient {
    url: String,
    timeout: Duration,
}

impl SyncClient {
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.sync.url.clone(),
            timeout: Duration::from_millis(config.sync.timeout_ms),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sync one document, bounded by the configured timeout
    pub async fn sync_document(
        &self,
        doc: &mut AutoCommit,
        id: &DocumentId,
    ) -> Result<SyncReport> {
        tokio::time::timeout(self.timeout, self.run_exchange(doc, id))
            .await
            .map_err(|_| {
                AutoblogError::Sync(format!(
                    "timed out after {}ms syncing {id}",
                    self.timeout.as_millis()
                ))
            })?
    }

    /// Sync the index document first, then every post it references.
    ///
    /// Syncing the index first means entries merged in from other devices
    /// get their documents fetched in the same pass.
    pub async fn sync_all(&self, storage: &DocumentStorage) -> Result<Vec<SyncReport>> {
        let mut index = IndexHandle::get_or_create(storage, None).await?;
        let index_id = *index.id();
        let index_report = self.sync_document(index.document_mut(), &index_id).await?;
        if index_report.changed {
            index.refresh()?;
        }
        index.save(storage).await?;

        let mut reports = vec![index_report];
        for (slug, document_id) in index.entries()? {
            let mut doc = if storage.contains(&document_id).await {
                storage.load_document(&document_id).await?
            } else {
                AutoCommit::new()
            };
            let report = self.sync_document(&mut doc, &document_id).await?;
            storage.save_document(&document_id, &mut doc).await?;
            log::debug!("synced {slug} ({document_id}), changed: {}", report.changed);
            reports.push(report);
        }
        Ok(reports)
    }

    async fn run_exchange(&self, doc: &mut AutoCommit, id: &DocumentId) -> Result<SyncReport> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| AutoblogError::Sync(format!("websocket connection failed: {e}")))?;
        let (mut tx, mut rx) = ws.split();

        tx.send(WsMessage::Text(id.to_string()))
            .await
            .map_err(|e| AutoblogError::Sync(format!("websocket send failed: {e}")))?;

        let heads_before = doc.get_heads();
        let mut state = sync::State::new();
        loop {
            let outgoing = next_frame(doc, &mut state);
            let sent_something = outgoing.is_some();
            if let Some(frame) = outgoing {
                tx.send(WsMessage::Binary(frame))
                    .await
                    .map_err(|e| AutoblogError::Sync(format!("websocket send failed: {e}")))?;
            }

            match tokio::time::timeout(QUIESCENT_GRACE, rx.next()).await {
                Err(_) if !sent_something => break,
                Err(_) => continue,
                Ok(None) => break,
                Ok(Some(frame)) => {
                    let frame = frame
                        .map_err(|e| AutoblogError::Sync(format!("websocket receive failed: {e}")))?;
                    match frame {
                        WsMessage::Binary(bytes) => accept_frame(doc, &mut state, &bytes)?,
                        WsMessage::Close(_) => break,
                        _ => {}
                    }
                }
            }
        }
        tx.send(WsMessage::Close(None)).await.ok();

        Ok(SyncReport {
            document_id: *id,
            changed: doc.get_heads() != heads_before,
        })
    }
}

/// Produce the next encoded sync message for the peer, if any
fn next_frame(doc: &mut AutoCommit, state: &mut sync::State) -> Option<Vec<u8>> {
    doc.sync()
        .generate_sync_message(state)
        .map(|message| message.encode())
}

/// Apply an encoded sync message received from the peer
fn accept_frame(doc: &mut AutoCommit, state: &mut sync::State, bytes: &[u8]) -> Result<()> {
    let message = sync::Message::decode(bytes)
        .map_err(|e| AutoblogError::Sync(format!("undecodable sync message: {e}")))?;
    doc.sync().receive_sync_message(state, message)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosurgeon::{hydrate, reconcile};
    use std::collections::HashMap;

    /// Shuttle frames between two documents until neither has anything to say
    fn converge(a: &mut AutoCommit, b: &mut AutoCommit) {
        let mut state_a = sync::State::new();
        let mut state_b = sync::State::new();
        loop {
            let from_a = next_frame(a, &mut state_a);
            let from_b = next_frame(b, &mut state_b);
            if from_a.is_none() && from_b.is_none() {
                break;
            }
            if let Some(frame) = from_a {
                accept_frame(b, &mut state_b, &frame).unwrap();
            }
            if let Some(frame) = from_b {
                accept_frame(a, &mut state_a, &frame).unwrap();
            }
        }
    }

    #[test]
    fn test_frames_converge_two_documents() {
        let mut a = AutoCommit::new();
        let mut map: HashMap<String, String> = HashMap::new();
        map.insert("hello-world".into(), "doc-one".into());
        reconcile(&mut a, &map).unwrap();

        let mut b = AutoCommit::new();
        converge(&mut a, &mut b);

        let merged: HashMap<String, String> = hydrate(&b).unwrap();
        assert_eq!(merged, map);
        assert_eq!(a.get_heads(), b.get_heads());
    }

    #[test]
    fn test_concurrent_edits_merge() {
        let mut a = AutoCommit::new();
        reconcile(&mut a, &HashMap::<String, String>::new()).unwrap();
        let mut b = a.fork();

        let mut map_a: HashMap<String, String> = hydrate(&a).unwrap();
        map_a.insert("from-a".into(), "id-a".into());
        reconcile(&mut a, &map_a).unwrap();

        let mut map_b: HashMap<String, String> = hydrate(&b).unwrap();
        map_b.insert("from-b".into(), "id-b".into());
        reconcile(&mut b, &map_b).unwrap();

        converge(&mut a, &mut b);

        let merged: HashMap<String, String> = hydrate(&a).unwrap();
        assert_eq!(merged.get("from-a"), Some(&"id-a".to_string()));
        assert_eq!(merged.get("from-b"), Some(&"id-b".to_string()));
    }

    #[test]
    fn test_undecodable_frame_is_an_error() {
        let mut doc = AutoCommit::new();
        let mut state = sync::State::new();
        assert!(accept_frame(&mut doc, &mut state, b"junk").is_err());
    }

    #[test]
    fn test_client_reads_config() {
        let mut config = Config::default();
        config.sync.url = "ws://localhost:3030".into();
        config.sync.timeout_ms = 1500;
        let client = SyncClient::new(&config);
        assert_eq!(client.url(), "ws://localhost:3030");
        assert_eq!(client.timeout(), Duration::from_millis(1500));
    }
}
