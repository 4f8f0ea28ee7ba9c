//! Minimal HTML rendering for the viewer pages.

use autoblog::markdown::render_html;
use autoblog::post::{BlogPost, PostSummary};
use autoblog::ErrorKind;
use chrono::DateTime;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{}</title>\n\
<style>\n\
body {{ font-family: system-ui, sans-serif; max-width: 42rem; margin: 2rem auto; padding: 0 1rem; line-height: 1.6; }}\n\
a {{ color: #1a5fb4; }}\n\
.meta {{ color: #666; font-size: 0.9rem; }}\n\
.error {{ color: #a51d2d; }}\n\
img {{ max-width: 100%; }}\n\
</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

/// The front page: published posts, newest first
pub fn render_home(posts: &[PostSummary]) -> String {
    let mut body = String::from("<h1>Blog</h1>\n");
    if posts.is_empty() {
        body.push_str("<p>No published posts yet.</p>\n");
    }
    for post in posts {
        body.push_str(&format!(
            "<article>\n<h2><a href=\"/posts/{}\">{}</a></h2>\n\
<p class=\"meta\">{} &middot; {}</p>\n</article>\n",
            escape(&post.slug),
            escape(&post.title),
            escape(&post.author),
            format_date(post.published),
        ));
    }
    page("Blog", &body)
}

/// A single post page
pub fn render_post(post: &BlogPost) -> String {
    let mut body = format!(
        "<p><a href=\"/\">&larr; All posts</a></p>\n<h1>{}</h1>\n\
<p class=\"meta\">{} &middot; {}</p>\n",
        escape(&post.title),
        escape(&post.author),
        format_date(post.published),
    );
    if let Some(image_url) = &post.image_url {
        body.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            escape(image_url),
            escape(&post.title)
        ));
    }
    if !post.description.is_empty() {
        body.push_str(&format!("<p><em>{}</em></p>\n", escape(&post.description)));
    }
    body.push_str(&render_html(&post.content));
    page(&post.title, &body)
}

/// An error page carrying the coarse error bucket
pub fn render_error(kind: ErrorKind, message: &str) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p class=\"error\">[{}] {}</p>\n\
<p><a href=\"/\">&larr; All posts</a></p>\n",
        kind,
        escape(message)
    );
    page("Error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblog::post::PostStatus;

    fn summary() -> PostSummary {
        PostSummary {
            slug: "hello-world".into(),
            title: "Hello, <World>!".into(),
            author: "Ada".into(),
            published: 1_705_276_800_000, // 2024-01-15
            status: PostStatus::Published,
            document_id: "abc".into(),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_home_escapes_titles_and_links_slugs() {
        let html = render_home(&[summary()]);
        assert!(html.contains("Hello, &lt;World&gt;!"));
        assert!(html.contains("href=\"/posts/hello-world\""));
        assert!(!html.contains("Hello, <World>!"));
    }

    #[test]
    fn test_post_renders_markdown_body() {
        let post = BlogPost {
            title: "T".into(),
            author: "A".into(),
            published: 0,
            status: PostStatus::Published,
            slug: "t".into(),
            description: "desc".into(),
            content: "# Heading\n\nbody".into(),
            image_url: None,
        };
        let html = render_post(&post);
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("<em>desc</em>"));
    }

    #[test]
    fn test_error_page_names_the_bucket() {
        let html = render_error(ErrorKind::Network, "connection refused");
        assert!(html.contains("[network]"));
        assert!(html.contains("connection refused"));
    }
}
