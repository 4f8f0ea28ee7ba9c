//! Autoblog web viewer.
//!
//! A read-only warp server over the shared document store: it loads the
//! same index and post documents the CLI writes and renders them as HTML.

mod handlers;
mod html;
mod viewer;

use autoblog::{BlogStore, Result};
use std::sync::Arc;
use warp::Filter;

use viewer::ViewerConfig;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Viewer failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let viewer = ViewerConfig::from_env().await?;
    let http_addr = viewer.http_addr;
    let store = Arc::new(BlogStore::open_with_index(viewer.core, viewer.index_id).await?);

    let with_store = {
        let store = store.clone();
        warp::any().map(move || store.clone())
    };

    let home = warp::path::end()
        .and(warp::get())
        .and(with_store.clone())
        .and_then(handlers::home);
    let post = warp::path!("posts" / String)
        .and(warp::get())
        .and(with_store.clone())
        .and_then(handlers::post);
    let api_list = warp::path!("api" / "posts")
        .and(warp::get())
        .and(with_store.clone())
        .and_then(handlers::api_list);
    let api_post = warp::path!("api" / "posts" / String)
        .and(warp::get())
        .and(with_store.clone())
        .and_then(handlers::api_post);
    let health = warp::path!("healthz").and(warp::get()).map(|| "ok");

    let routes = home
        .or(post)
        .or(api_list)
        .or(api_post)
        .or(health)
        .with(warp::log("autoblog_web"));

    log::info!("serving blog on http://{http_addr}");
    warp::serve(routes).run(http_addr).await;
    Ok(())
}
