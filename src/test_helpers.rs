//! Shared test utilities.
//!
//! [`TestSite`] scaffolds a fresh site in a temp directory and wraps the
//! common moves of a build test: write a post, build, pin timestamps, read
//! the output back.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new();
//! site.write_post("a.md", &post_text(false, "2022-12-11", "A", &["rust"]));
//! site.build(false);
//! site.settle();
//!
//! assert!(site.build(false).is_noop());
//! ```

use chrono::NaiveDate;
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::blog::Blog;
use crate::build::{BuildError, BuildOptions, BuildReport, build};

// =========================================================================
// Site fixture
// =========================================================================

/// A freshly created site that lives as long as the value.
pub struct TestSite {
    _tmp: TempDir,
    pub blog: Blog,
}

impl TestSite {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path().join("test_blog"));
        blog.create().unwrap();
        Self { _tmp: tmp, blog }
    }

    /// Write a post at `rel` under `posts/`, creating directories.
    pub fn write_post(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.blog.posts_path.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    pub fn try_build(&self, force: bool) -> Result<BuildReport, BuildError> {
        let options = BuildOptions {
            force,
            today: today(),
        };
        build(&self.blog, &options)
    }

    pub fn build(&self, force: bool) -> BuildReport {
        self.try_build(force).unwrap()
    }

    /// Pin timestamps so that nothing looks changed since the last build:
    /// config, stylesheets and sources at 1000, the marker at 2000.
    ///
    /// Outputs keep their real (much later) mtimes.
    pub fn settle(&self) {
        set_mtime(&self.blog.config_path, 1_000);
        set_tree_mtime(&self.blog.style_sheets_path, 1_000);
        set_tree_mtime(&self.blog.posts_path, 1_000);
        set_mtime(&self.blog.last_build_path, 2_000);
    }

    /// Path of `rel` under `public/`.
    pub fn output_path(&self, rel: &str) -> PathBuf {
        self.blog.website_path.join(rel)
    }

    pub fn read_output(&self, rel: &str) -> String {
        let path = self.output_path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    }
}

/// Build date used by [`TestSite::build`].
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 12, 13).unwrap()
}

// =========================================================================
// Post sources
// =========================================================================

/// A well-formed post whose body reads `Body of <title>`.
pub fn post_text(draft: bool, date: &str, title: &str, tags: &[&str]) -> String {
    let draft = if draft { "yes" } else { "no" };
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!("tags: [{}]\n", tags.join(", "))
    };
    format!("draft: {draft}\ndate: {date}\n{tags}\n# {title}\n\nBody of {title}\n")
}

// =========================================================================
// Timestamps
// =========================================================================

/// Set the mtime of `path` to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0))
        .unwrap_or_else(|e| panic!("cannot set mtime of {}: {e}", path.display()));
}

/// Set the mtime of `root` and everything under it.
pub fn set_tree_mtime(root: &Path, secs: i64) {
    for entry in WalkDir::new(root) {
        set_mtime(entry.unwrap().path(), secs);
    }
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}
