//! Markdown input handling: YAML front matter, slug generation, and HTML
//! rendering for the web viewer.
//!
//! The input format is a `---` fenced YAML block followed by a markdown body:
//!
//! ```text
//! ---
//! title: Hello, World!
//! author: Ada
//! published: 2024-01-15
//! status: published
//! description: A first post
//! imageUrl: https://example.com/cover.png
//! ---
//!
//! Body text.
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};

use crate::error::{AutoblogError, Result};
use crate::post::{BlogPost, PostStatus};

/// Front matter fields, camelCase on the wire to match the authoring format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter {
    title: Option<String>,
    author: Option<String>,
    published: Option<String>,
    status: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

/// Parse a markdown source (front matter + body) into a [`BlogPost`].
///
/// Title and author are required. Status defaults to draft, the publish
/// date to now, and the slug to [`generate_slug`] of the title.
pub fn parse_post(source: &str) -> Result<BlogPost> {
    let (front, body) = split_front_matter(source)?;
    let front: FrontMatter = serde_yaml::from_str(front)?;

    let title = front
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AutoblogError::InvalidPost("front matter is missing a title".into()))?;
    let author = front
        .author
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AutoblogError::InvalidPost("front matter is missing an author".into()))?;

    let status = match front.status {
        Some(raw) => raw.parse()?,
        None => PostStatus::Draft,
    };
    let published = match front.published {
        Some(raw) => parse_published(&raw)?,
        None => Utc::now().timestamp_millis(),
    };
    let slug = front
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| generate_slug(&title));

    Ok(BlogPost {
        title,
        author,
        published,
        status,
        slug,
        description: front.description.unwrap_or_default(),
        content: body.to_string(),
        image_url: front.image_url,
    })
}

/// Render a [`BlogPost`] back into its markdown source form
pub fn to_markdown(post: &BlogPost) -> Result<String> {
    let front = FrontMatter {
        title: Some(post.title.clone()),
        author: Some(post.author.clone()),
        published: post.published_at().map(|d| d.to_rfc3339()),
        status: Some(post.status.as_str().to_string()),
        slug: Some(post.slug.clone()),
        description: Some(post.description.clone()),
        image_url: post.image_url.clone(),
    };
    let yaml = serde_yaml::to_string(&front)?;
    Ok(format!("---\n{yaml}---\n\n{}", post.content))
}

/// Derive a URL-safe slug from a title.
///
/// Lowercases, drops non-word characters, and turns runs of whitespace,
/// hyphens and underscores into single hyphens. Idempotent.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }
    slug
}

/// Render a markdown body to HTML with tables and strikethrough enabled
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Split a source file into its front matter block and body
fn split_front_matter(source: &str) -> Result<(&str, &str)> {
    let missing = || AutoblogError::InvalidPost("missing `---` front matter block".into());
    let rest = source.strip_prefix("---").ok_or_else(missing)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).ok_or_else(missing)?;
    let end = rest.find("\n---").ok_or_else(missing)?;
    let front = &rest[..end];
    let mut body = &rest[end + "\n---".len()..];
    // Drop the remainder of the closing fence line, then one blank line.
    body = match body.find('\n') {
        Some(i) => &body[i + 1..],
        None => "",
    };
    let body = body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')).unwrap_or(body);
    Ok((front, body))
}

fn parse_published(raw: &str) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    Err(AutoblogError::InvalidPost(format!(
        "unparseable publish date {raw:?}, expected RFC 3339 or YYYY-MM-DD"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\n\
title: Hello, World!\n\
author: Ada\n\
published: 2024-01-15\n\
status: published\n\
description: A first post\n\
imageUrl: https://example.com/cover.png\n\
---\n\
\n\
# Hello\n\
\n\
Body text.\n";

    #[test]
    fn test_generate_slug_strips_punctuation() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Spaces   everywhere  "), "spaces-everywhere");
        assert_eq!(generate_slug("snake_case_title"), "snake-case-title");
        assert_eq!(generate_slug("100% Rust!"), "100-rust");
    }

    #[test]
    fn test_generate_slug_is_idempotent() {
        let once = generate_slug("Hello, World!");
        assert_eq!(generate_slug(&once), once);
    }

    #[test]
    fn test_parse_post_full_front_matter() {
        let post = parse_post(SAMPLE).unwrap();
        assert_eq!(post.title, "Hello, World!");
        assert_eq!(post.author, "Ada");
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.description, "A first post");
        assert_eq!(post.image_url.as_deref(), Some("https://example.com/cover.png"));
        assert_eq!(
            post.published_at().unwrap().format("%Y-%m-%d").to_string(),
            "2024-01-15"
        );
        assert_eq!(post.content, "# Hello\n\nBody text.\n");
    }

    #[test]
    fn test_parse_post_defaults() {
        let source = "---\ntitle: Quick note\nauthor: Ada\n---\nbody\n";
        let post = parse_post(source).unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.slug, "quick-note");
        assert!(post.published > 0);
        assert!(post.image_url.is_none());
    }

    #[test]
    fn test_parse_post_requires_title_and_author() {
        assert!(parse_post("---\nauthor: Ada\n---\nbody").is_err());
        assert!(parse_post("---\ntitle: No author\n---\nbody").is_err());
        assert!(parse_post("no front matter at all").is_err());
    }

    #[test]
    fn test_front_matter_round_trip() {
        let post = parse_post(SAMPLE).unwrap();
        let rendered = to_markdown(&post).unwrap();
        let reparsed = parse_post(&rendered).unwrap();
        assert_eq!(reparsed, post);
    }

    #[test]
    fn test_render_html() {
        let html = render_html("# Title\n\nSome *emphasis*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn test_publish_date_rejects_garbage() {
        let source = "---\ntitle: T\nauthor: A\npublished: someday\n---\nbody";
        assert!(parse_post(source).is_err());
    }
}
