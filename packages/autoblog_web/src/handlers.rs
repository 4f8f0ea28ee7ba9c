//! Request handlers.
//!
//! Store reads are wrapped in the core retry helper so a transient storage
//! hiccup does not surface as an error page; anything that still fails is
//! bucketed by message through `autoblog::classify` for display.

use autoblog::post::{BlogPost, PostStatus, PostSummary};
use autoblog::util::retry_if;
use autoblog::{AutoblogError, BlogStore, Listing};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;
use warp::Reply;

use crate::html;

const READ_ATTEMPTS: u32 = 3;
const READ_BASE_DELAY: Duration = Duration::from_millis(250);

/// Deterministic failures get their response immediately; only errors that
/// might clear up (I/O hiccups, a mid-write document) are worth the backoff.
fn is_transient(err: &AutoblogError) -> bool {
    !matches!(
        err,
        AutoblogError::PostNotFound(_)
            | AutoblogError::DocumentNotFound(_)
            | AutoblogError::InvalidDocumentId(_)
    )
}

async fn load_listing(store: &BlogStore) -> Result<Listing, AutoblogError> {
    retry_if(READ_ATTEMPTS, READ_BASE_DELAY, || store.list(), is_transient).await
}

async fn load_post(store: &BlogStore, slug: &str) -> Result<BlogPost, AutoblogError> {
    retry_if(READ_ATTEMPTS, READ_BASE_DELAY, || store.get(slug), is_transient).await
}

fn published_only(listing: Listing) -> Vec<PostSummary> {
    listing
        .posts
        .into_iter()
        .filter(|post| post.status == PostStatus::Published)
        .collect()
}

fn status_for(err: &AutoblogError) -> StatusCode {
    match err {
        AutoblogError::PostNotFound(_) | AutoblogError::DocumentNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn home(store: Arc<BlogStore>) -> Result<impl Reply, Infallible> {
    let reply = match load_listing(&store).await {
        Ok(listing) => warp::reply::with_status(
            warp::reply::html(html::render_home(&published_only(listing))),
            StatusCode::OK,
        ),
        Err(e) => {
            log::error!("listing failed: {e}");
            warp::reply::with_status(
                warp::reply::html(html::render_error(e.kind(), &e.to_string())),
                status_for(&e),
            )
        }
    };
    Ok(reply)
}

pub async fn post(slug: String, store: Arc<BlogStore>) -> Result<impl Reply, Infallible> {
    let reply = match load_post(&store, &slug).await {
        // Drafts are invisible on the public surface.
        Ok(post) if post.status == PostStatus::Draft => {
            let e = AutoblogError::PostNotFound(slug);
            warp::reply::with_status(
                warp::reply::html(html::render_error(e.kind(), &e.to_string())),
                StatusCode::NOT_FOUND,
            )
        }
        Ok(post) => warp::reply::with_status(
            warp::reply::html(html::render_post(&post)),
            StatusCode::OK,
        ),
        Err(e) => {
            log::error!("loading post failed: {e}");
            warp::reply::with_status(
                warp::reply::html(html::render_error(e.kind(), &e.to_string())),
                status_for(&e),
            )
        }
    };
    Ok(reply)
}

pub async fn api_list(store: Arc<BlogStore>) -> Result<impl Reply, Infallible> {
    let reply = match load_listing(&store).await {
        Ok(listing) => warp::reply::with_status(
            warp::reply::json(&published_only(listing)),
            StatusCode::OK,
        ),
        Err(e) => error_json(&e),
    };
    Ok(reply)
}

pub async fn api_post(slug: String, store: Arc<BlogStore>) -> Result<impl Reply, Infallible> {
    let reply = match load_post(&store, &slug).await {
        Ok(post) if post.status == PostStatus::Draft => {
            error_json(&AutoblogError::PostNotFound(slug))
        }
        Ok(post) => warp::reply::with_status(warp::reply::json(&post), StatusCode::OK),
        Err(e) => error_json(&e),
    };
    Ok(reply)
}

fn error_json(err: &AutoblogError) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = json!({
        "error": err.to_string(),
        "kind": err.kind().as_str(),
    });
    warp::reply::with_status(warp::reply::json(&body), status_for(err))
}
