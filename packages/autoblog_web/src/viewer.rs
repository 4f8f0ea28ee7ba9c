//! Runtime configuration for the viewer.
//!
//! The viewer reads the shared core config (which already honors
//! `AUTOBLOG_SYNC_URL` and `AUTOBLOG_DATA_PATH`) plus two viewer-specific
//! variables injected by the environment:
//!
//! - `AUTOBLOG_INDEX_ID`: pin the blog index document to share one index
//!   across devices instead of the locally persisted pointer
//! - `AUTOBLOG_HTTP_ADDR`: listen address, default `127.0.0.1:8080`

use autoblog::{AutoblogError, Config, DocumentId, Result};
use std::net::SocketAddr;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

pub struct ViewerConfig {
    pub core: Config,
    pub index_id: Option<DocumentId>,
    pub http_addr: SocketAddr,
}

impl ViewerConfig {
    pub async fn from_env() -> Result<Self> {
        let core = Config::load().await?;
        Self::with_lookup(core, |name| std::env::var(name).ok())
    }

    fn with_lookup(core: Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let index_id = lookup("AUTOBLOG_INDEX_ID")
            .map(|raw| raw.parse::<DocumentId>())
            .transpose()?;

        let raw_addr = lookup("AUTOBLOG_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.into());
        let http_addr = raw_addr.parse().map_err(|_| {
            AutoblogError::Config(format!(
                "AUTOBLOG_HTTP_ADDR must be a socket address, got {raw_addr:?}"
            ))
        })?;

        Ok(Self {
            core,
            index_id,
            http_addr,
        })
    }
}
