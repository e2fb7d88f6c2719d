//! Incremental site build.
//!
//! A build brings `public/` in line with `posts/`, `config.json` and the
//! stylesheets, doing as little work as the modification times allow.
//!
//! ## Stages
//!
//! ```text
//! config.json ──► SiteGlobals ─┐
//! data/templates/ ──► Templates ┼──► SiteRenderer
//!                               │
//! marker mtime ──► stylesheet_updated ──► copy data/style_sheets/ over public/
//!              └─► config_updated ─┬──► rebuild_all (also set by --force)
//!                                  │
//! posts/**.md ──► ensure_date ──► Post ──► render if public and (dirty or rebuild_all)
//!                                      └─► withdraw target if draft
//! public/posts/**.html ──► delete orphans
//!                                  │
//!                rebuild_all or any post written/deleted
//!                                  ▼
//!                     index.html, tags.html, tags/<tag>.html
//! ```
//!
//! ## Dirty tracking
//!
//! A post is dirty when its target is missing or strictly older than its
//! source. Config and stylesheet changes are detected against a single marker
//! file. When either trigger fires, the marker is set to the build's start
//! time after all posts are rendered, so a build that aborts on a bad post
//! leaves the trigger armed. Nothing else is persisted between builds.
//!
//! A changed stylesheet is copied but does not rebuild posts: pages link the
//! stylesheet, they do not embed it.

use crate::blog::{Blog, SiteError};
use crate::config::{ConfigError, SiteConfig, SiteGlobals};
use crate::post::{self, Post, PostError};
use crate::render::{RenderError, SiteRenderer};
use crate::templates::{TemplateError, Templates};
use chrono::{Datelike, Local, NaiveDate};
use filetime::FileTime;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Inputs of a build that do not come from the site itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Re-render every public post and the aggregate pages.
    pub force: bool,
    /// Date injected into undated posts; its year is `current_year`.
    pub today: NaiveDate,
}

impl BuildOptions {
    pub fn new(force: bool) -> Self {
        Self {
            force,
            today: Local::now().date_naive(),
        }
    }
}

/// Aggregate pages written by a build.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub home: PathBuf,
    pub tags: Vec<String>,
    pub removed_tag_pages: Vec<PathBuf>,
}

/// What a build did. Paths are absolute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub stylesheet_copied: bool,
    pub config_updated: bool,
    /// Sources that received a `date:` line.
    pub dated: Vec<PathBuf>,
    /// Targets rendered.
    pub built: Vec<PathBuf>,
    /// Draft sources.
    pub skipped_drafts: Vec<PathBuf>,
    /// Targets deleted because their post became a draft.
    pub withdrawn: Vec<PathBuf>,
    /// Targets deleted because their source is gone.
    pub orphans_deleted: Vec<PathBuf>,
    pub aggregates: Option<AggregateReport>,
    /// Posts found under `posts/`, drafts included.
    pub post_count: usize,
}

impl BuildReport {
    /// True when the build wrote and deleted nothing.
    pub fn is_noop(&self) -> bool {
        !self.stylesheet_copied
            && self.dated.is_empty()
            && self.built.is_empty()
            && self.withdrawn.is_empty()
            && self.orphans_deleted.is_empty()
            && self.aggregates.is_none()
    }
}

/// Build the site at `blog`. A malformed post aborts the whole build.
pub fn build(blog: &Blog, options: &BuildOptions) -> Result<BuildReport, BuildError> {
    let started = FileTime::now();
    let config = SiteConfig::load(&blog.config_path)?;
    let globals = SiteGlobals::new(config, options.today.year());
    let templates = Templates::load(&blog.templates_path)?;
    let renderer = SiteRenderer::new(blog, &templates, &globals);
    let mut report = BuildReport::default();

    let last_build = blog.last_build_time()?;
    let stylesheet_updated = is_newer(newest_mtime(&blog.style_sheets_path)?, last_build);
    let config_mtime = fs::metadata(&blog.config_path)?.modified()?;
    report.config_updated = is_newer(Some(config_mtime), last_build);

    if stylesheet_updated {
        copy_tree(&blog.style_sheets_path, &blog.website_path)?;
        info!("Copied stylesheets to {}", blog.website_path.display());
        report.stylesheet_copied = true;
    }
    let rebuild_all = report.config_updated || options.force;

    let mut posts = Vec::new();
    let mut aggregates_dirty = false;
    for source in blog.markdown_post_paths()? {
        if post::ensure_date(&source, options.today)? {
            report.dated.push(source.clone());
        }
        let target = blog.target_path_for(&source)?;
        let post = Post::load(source, target)?;

        if post.is_public() {
            if rebuild_all || post.is_dirty(post.target_path())? {
                debug!("Building {}", post.source_path().display());
                renderer.post(&post)?;
                report.built.push(post.target_path().to_path_buf());
                aggregates_dirty = true;
            } else {
                debug!("Up to date: {}", post.source_path().display());
            }
        } else {
            debug!("Skipping draft {}", post.source_path().display());
            report.skipped_drafts.push(post.source_path().to_path_buf());
            if post.target_path().is_file() {
                fs::remove_file(post.target_path())?;
                info!("Withdrew draft {}", post.target_path().display());
                report.withdrawn.push(post.target_path().to_path_buf());
                aggregates_dirty = true;
            }
        }
        posts.push(post);
    }
    report.post_count = posts.len();

    for orphan in blog.orphan_target_paths()? {
        fs::remove_file(&orphan)?;
        info!("Deleted orphan {}", orphan.display());
        report.orphans_deleted.push(orphan);
        aggregates_dirty = true;
    }

    if rebuild_all || aggregates_dirty {
        let mut public: Vec<&Post> = posts.iter().filter(|p| p.is_public()).collect();
        // Stable: equal dates keep enumeration order.
        public.sort_by(|a, b| b.date().cmp(&a.date()));

        let home = renderer.home(&public)?;
        let tag_pages = renderer.tag_pages(&public)?;
        for removed in &tag_pages.removed {
            info!("Deleted stale tag page {}", removed.display());
        }
        report.aggregates = Some(AggregateReport {
            home,
            tags: tag_pages.tags,
            removed_tag_pages: tag_pages.removed,
        });
    }

    // Last, so an aborted build sees the same triggers again.
    if stylesheet_updated || report.config_updated {
        blog.touch_last_build(started)?;
    }

    Ok(report)
}

/// `None` for a missing `last` means everything is newer.
fn is_newer(time: Option<SystemTime>, last: Option<SystemTime>) -> bool {
    match (time, last) {
        (Some(time), Some(last)) => time > last,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Newest mtime of `root` and everything below it, `None` if it is missing.
fn newest_mtime(root: &Path) -> Result<Option<SystemTime>, BuildError> {
    if !root.exists() {
        return Ok(None);
    }
    let mut newest = None;
    for entry in WalkDir::new(root) {
        let modified = entry?.metadata()?.modified()?;
        if newest.is_none_or(|n| modified > n) {
            newest = Some(modified);
        }
    }
    Ok(newest)
}

/// Merge `src` into `dst`, overwriting files. Nothing in `dst` is deleted.
fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
