//! Command handlers: validate input, call into the core library, print
//! human-readable results.

use autoblog::util::format_bytes;
use autoblog::{BlogStore, Config, Result, SyncClient};
use chrono::DateTime;
use std::path::Path;

use crate::ConfigAction;

async fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            Config::load_from(path).await
        }
        None => Config::load().await,
    }
}

async fn open_store(path: Option<&Path>) -> Result<BlogStore> {
    BlogStore::open(load_config(path).await?).await
}

fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn upload(config: Option<&Path>, file: &Path) -> Result<()> {
    let store = open_store(config).await?;
    let outcome = store.upload(file).await?;
    println!(
        "Uploaded \"{}\" ({})",
        outcome.slug,
        if outcome.created { "created" } else { "updated" }
    );
    println!("  document: {}", outcome.document_id);
    println!("  size:     {}", format_bytes(outcome.bytes as u64));
    Ok(())
}

pub async fn list(config: Option<&Path>) -> Result<()> {
    let store = open_store(config).await?;
    let listing = store.list().await?;

    if listing.posts.is_empty() && listing.missing.is_empty() {
        println!("No posts yet.");
        return Ok(());
    }

    println!(
        "{:<24} {:<10} {:<12} TITLE",
        "SLUG", "STATUS", "PUBLISHED"
    );
    for post in &listing.posts {
        println!(
            "{:<24} {:<10} {:<12} {}",
            post.slug,
            post.status,
            format_date(post.published),
            post.title
        );
    }
    for (slug, document_id) in &listing.missing {
        println!("{slug:<24} (document {document_id} not available locally)");
    }
    println!(
        "\n{} post(s), {} not available locally",
        listing.posts.len() + listing.missing.len(),
        listing.missing.len()
    );
    Ok(())
}

pub async fn delete(config: Option<&Path>, slug: &str) -> Result<()> {
    let store = open_store(config).await?;
    let document_id = store.delete(slug).await?;
    println!("Deleted \"{slug}\" (document {document_id})");
    Ok(())
}

pub async fn sync(config: Option<&Path>) -> Result<()> {
    let config = load_config(config).await?;
    let client = SyncClient::new(&config);
    let store = BlogStore::open(config).await?;

    println!("Syncing with {} ...", client.url());
    let reports = client.sync_all(store.storage()).await?;
    for report in &reports {
        println!(
            "  {}  {}",
            report.document_id,
            if report.changed { "changed" } else { "unchanged" }
        );
    }
    let changed = reports.iter().filter(|r| r.changed).count();
    println!("Synced {} document(s), {changed} changed", reports.len());
    Ok(())
}

pub async fn config(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    let file_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::file_path()?,
    };

    match action {
        ConfigAction::List => {
            let config = load_config(config_path).await?;
            for (key, value) in config.entries() {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Get { key } => {
            let config = load_config(config_path).await?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            // Edit the file form so environment overrides never leak in.
            let mut config = Config::load_file(&file_path).await?;
            config.set(&key, &value)?;
            config.save_to(&file_path).await?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Reset => {
            Config::default().save_to(&file_path).await?;
            println!("Reset configuration to defaults");
        }
        ConfigAction::Path => {
            println!("{}", file_path.display());
        }
    }
    Ok(())
}
