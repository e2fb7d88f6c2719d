//! Writing pages into `public/`.
//!
//! [`SiteRenderer`] turns posts into files: one page per post, the home page,
//! one page per tag, and the all-tags index. It knows where pages go; what
//! they look like is up to [`crate::templates`].

use crate::blog::Blog;
use crate::config::SiteGlobals;
use crate::post::{Post, PostError};
use crate::templates::{Page, PostView, TagLink, TemplateError, Templates};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const INDEX_PAGE: &str = "index.html";
pub const ALL_TAGS_PAGE: &str = "tags.html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Tag pages written by [`SiteRenderer::tag_pages`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPages {
    /// Distinct tags, sorted.
    pub tags: Vec<String>,
    /// Pages of tags that no longer exist.
    pub removed: Vec<PathBuf>,
}

pub struct SiteRenderer<'a> {
    blog: &'a Blog,
    templates: &'a Templates,
    globals: &'a SiteGlobals,
}

impl<'a> SiteRenderer<'a> {
    pub fn new(blog: &'a Blog, templates: &'a Templates, globals: &'a SiteGlobals) -> Self {
        Self {
            blog,
            templates,
            globals,
        }
    }

    fn view<'p>(&self, post: &'p Post) -> PostView<'p> {
        PostView::new(post, self.blog.url_for(post.target_path()))
    }

    /// Render a post to its target path.
    pub fn post(&self, post: &Post) -> Result<(), RenderError> {
        let content = post.content_html()?;
        let page = Page::Post {
            post: self.view(post),
            content: &content,
        };
        write_page(post.target_path(), &self.templates.render(&page, self.globals)?)
    }

    /// Render the home page from `posts`, which must be public and sorted
    /// newest first. Only the first `home_max_posts` are listed.
    pub fn home(&self, posts: &[&Post]) -> Result<PathBuf, RenderError> {
        let max = self.globals.config.home_max_posts;
        let page = Page::Index {
            posts: posts.iter().take(max).map(|p| self.view(p)).collect(),
        };
        let path = self.blog.website_path.join(INDEX_PAGE);
        write_page(&path, &self.templates.render(&page, self.globals)?)?;
        Ok(path)
    }

    /// Render one page per distinct tag and the all-tags index, then remove
    /// pages of tags no post carries any more.
    ///
    /// `posts` must be public and sorted newest first; each tag page lists at
    /// most `home_max_posts` of them.
    pub fn tag_pages(&self, posts: &[&Post]) -> Result<TagPages, RenderError> {
        let max = self.globals.config.home_max_posts;
        let tags: BTreeSet<&str> = posts
            .iter()
            .flat_map(|p| p.tags())
            .map(String::as_str)
            .collect();

        let mut written = HashSet::new();
        for &tag in &tags {
            let page = Page::Tag {
                tag,
                posts: posts
                    .iter()
                    .filter(|p| p.tags().iter().any(|t| t == tag))
                    .take(max)
                    .map(|p| self.view(p))
                    .collect(),
            };
            let path = self.blog.tag_page_path(tag);
            write_page(&path, &self.templates.render(&page, self.globals)?)?;
            written.insert(path);
        }

        let page = Page::AllTags {
            tags: tags.iter().map(|t| TagLink::new(t)).collect(),
        };
        write_page(
            &self.blog.website_path.join(ALL_TAGS_PAGE),
            &self.templates.render(&page, self.globals)?,
        )?;

        let removed = remove_stale_pages(&self.blog.website_tags_path, &written)?;
        Ok(TagPages {
            tags: tags.into_iter().map(String::from).collect(),
            removed,
        })
    }
}

fn write_page(path: &Path, html: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    Ok(())
}

fn remove_stale_pages(dir: &Path, keep: &HashSet<PathBuf>) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if !dir.is_dir() {
        return Ok(removed);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_html = path.extension().is_some_and(|e| e == "html");
        if path.is_file() && is_html && !keep.contains(&path) {
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}
