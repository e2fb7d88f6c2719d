//! Page templates.
//!
//! Every page is rendered from a named template and a structured [`Page`]
//! value. Two sources of templates exist:
//!
//! - **Built-in theme**: compiled in with [maud](https://maud.lambda.xyz/),
//!   auto-escaped and type-checked. Used for any page without an override.
//! - **Overrides**: an HTML file in `data/templates/` with the same name as
//!   the page template (`post.html`, `index.html`, `tag.html`,
//!   `all_tags.html`) replaces the built-in one and is rendered with Tera.
//!   Other files in that directory (e.g. a `base.html` to extend) are
//!   registered too.
//!
//! ## Override context
//!
//! | template | keys |
//! |----------|------|
//! | all | `website_name`, `website_author`, `website_description`, `website_keywords`, `home_max_posts`, `current_year`, extra config keys |
//! | `post.html` | `post`, `content` |
//! | `index.html` | `latest_posts` |
//! | `tag.html` | `tag`, `latest_posts` |
//! | `all_tags.html` | `all_tags` |
//!
//! A post is `{title, date, url, tags: [{name, url}], fields}`. Tera escapes
//! `.html` templates, so the rendered body must be output as
//! `{{ content | safe }}`.

use crate::blog::tag_url;
use crate::config::SiteGlobals;
use crate::post::{FieldValue, Post};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};
use thiserror::Error;

pub const POST_TEMPLATE: &str = "post.html";
pub const INDEX_TEMPLATE: &str = "index.html";
pub const TAG_TEMPLATE: &str = "tag.html";
pub const ALL_TAGS_TEMPLATE: &str = "all_tags.html";

const STYLESHEET_HREF: &str = "/style.css";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
}

/// A tag with the URL of its page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

impl TagLink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: tag_url(name),
        }
    }
}

/// What templates see of a post.
#[derive(Debug, Clone, Serialize)]
pub struct PostView<'a> {
    pub title: &'a str,
    pub date: String,
    pub url: String,
    pub tags: Vec<TagLink>,
    pub fields: &'a BTreeMap<String, FieldValue>,
}

impl<'a> PostView<'a> {
    pub fn new(post: &'a Post, url: String) -> Self {
        Self {
            title: post.title(),
            date: post.date().format("%Y-%m-%d").to_string(),
            url,
            tags: post.tags().iter().map(|t| TagLink::new(t)).collect(),
            fields: &post.metadata().extra,
        }
    }
}

/// A page to render, with the values its template needs.
#[derive(Debug)]
pub enum Page<'a> {
    Post {
        post: PostView<'a>,
        content: &'a str,
    },
    Index {
        posts: Vec<PostView<'a>>,
    },
    Tag {
        tag: &'a str,
        posts: Vec<PostView<'a>>,
    },
    AllTags {
        tags: Vec<TagLink>,
    },
}

impl Page<'_> {
    pub fn template_name(&self) -> &'static str {
        match self {
            Page::Post { .. } => POST_TEMPLATE,
            Page::Index { .. } => INDEX_TEMPLATE,
            Page::Tag { .. } => TAG_TEMPLATE,
            Page::AllTags { .. } => ALL_TAGS_TEMPLATE,
        }
    }

    fn insert_into(&self, context: &mut Context) {
        match self {
            Page::Post { post, content } => {
                context.insert("post", post);
                context.insert("content", content);
            }
            Page::Index { posts } => context.insert("latest_posts", posts),
            Page::Tag { tag, posts } => {
                context.insert("tag", tag);
                context.insert("latest_posts", posts);
            }
            Page::AllTags { tags } => context.insert("all_tags", tags),
        }
    }
}

/// Built-in theme plus any overrides found on disk.
pub struct Templates {
    overrides: Tera,
}

impl Templates {
    /// Built-in theme only.
    pub fn builtin() -> Self {
        Self {
            overrides: Tera::default(),
        }
    }

    /// Register every `*.html` file in `dir` as an override, named by file
    /// name. A missing directory means no overrides.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut overrides = Tera::default();
        if dir.is_dir() {
            let mut files = Vec::new();
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                let is_html = path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case("html"));
                if path.is_file() && is_html {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned());
                    files.push((path, name));
                }
            }
            files.sort();
            overrides.add_template_files(files)?;
        }
        Ok(Self { overrides })
    }

    pub fn has_override(&self, name: &str) -> bool {
        self.overrides.get_template_names().any(|n| n == name)
    }

    pub fn render(&self, page: &Page<'_>, globals: &SiteGlobals) -> Result<String, TemplateError> {
        let name = page.template_name();
        if self.has_override(name) {
            let mut context = Context::from_serialize(globals)?;
            page.insert_into(&mut context);
            return Ok(self.overrides.render(name, &context)?);
        }
        Ok(render_builtin(page, globals).into_string())
    }
}

// ============================================================================
// Built-in theme
// ============================================================================

fn render_builtin(page: &Page<'_>, globals: &SiteGlobals) -> Markup {
    match page {
        Page::Post { post, content } => {
            let body = html! {
                article.post {
                    h1 { (post.title) }
                    p.post-meta {
                        time datetime=(post.date) { (post.date) }
                    }
                    (tag_list(&post.tags))
                    div.post-content {
                        (PreEscaped(*content))
                    }
                }
            };
            base_document(post.title, globals, body)
        }
        Page::Index { posts } => {
            let body = html! {
                section.latest-posts {
                    h1 { "Latest posts" }
                    (post_list(posts))
                }
            };
            base_document(site_title(globals), globals, body)
        }
        Page::Tag { tag, posts } => {
            let body = html! {
                section.tagged-posts {
                    h1 { "Posts tagged " em { (tag) } }
                    (post_list(posts))
                }
            };
            base_document(tag, globals, body)
        }
        Page::AllTags { tags } => {
            let body = html! {
                section.all-tags {
                    h1 { "Tags" }
                    (tag_list(tags))
                }
            };
            base_document("Tags", globals, body)
        }
    }
}

fn site_title(globals: &SiteGlobals) -> &str {
    match globals.config.website_name.as_str() {
        "" => "Home",
        name => name,
    }
}

/// Renders the base HTML document structure
fn base_document(title: &str, globals: &SiteGlobals, content: Markup) -> Markup {
    let site = &globals.config;
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !site.website_description.is_empty() {
                    meta name="description" content=(site.website_description);
                }
                @if !site.website_keywords.is_empty() {
                    meta name="keywords" content=(site.website_keywords);
                }
                @if !site.website_author.is_empty() {
                    meta name="author" content=(site.website_author);
                }
                title { (title) }
                link rel="stylesheet" href=(STYLESHEET_HREF);
            }
            body {
                (site_header(globals))
                main {
                    (content)
                }
                (site_footer(globals))
            }
        }
    }
}

fn site_header(globals: &SiteGlobals) -> Markup {
    html! {
        header.site-header {
            a.site-name href="/" { (site_title(globals)) }
            nav.site-nav {
                a href="/" { "Home" }
                a href="/tags.html" { "Tags" }
            }
        }
    }
}

fn site_footer(globals: &SiteGlobals) -> Markup {
    let author = &globals.config.website_author;
    html! {
        footer.site-footer {
            "© " (globals.current_year)
            @if !author.is_empty() {
                " " (author)
            }
        }
    }
}

fn post_list(posts: &[PostView<'_>]) -> Markup {
    html! {
        ul.post-list {
            @for post in posts {
                li {
                    time datetime=(post.date) { (post.date) }
                    " "
                    a href=(post.url) { (post.title) }
                }
            }
        }
    }
}

fn tag_list(tags: &[TagLink]) -> Markup {
    html! {
        ul.tag-list {
            @for tag in tags {
                li { a href=(tag.url) { (tag.name) } }
            }
        }
    }
}
