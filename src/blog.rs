//! Site layout on disk and the operations that only need paths.
//!
//! ```text
//! <root>/
//! ├── config.json                 # SiteConfig
//! ├── .yabi.modified              # last-build marker (only its mtime matters)
//! ├── posts/                      # markdown sources, any nesting
//! │   └── notes/first.md
//! ├── data/
//! │   ├── templates/              # optional overrides: post.html, index.html, ...
//! │   └── style_sheets/style.css  # copied over public/ when changed
//! └── public/                     # generated site
//!     ├── index.html
//!     ├── tags.html
//!     ├── style.css
//!     ├── posts/notes/first.html  # mirrors posts/
//!     └── tags/<tag>.html
//! ```

use crate::config::{ConfigError, SiteConfig};
use filetime::{FileTime, set_file_mtime};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

pub const WEBSITE_DIR_NAME: &str = "public";
pub const POSTS_DIR_NAME: &str = "posts";
pub const TAGS_DIR_NAME: &str = "tags";
pub const DATA_DIR_NAME: &str = "data";
pub const TEMPLATE_DIR_NAME: &str = "templates";
pub const STYLE_SHEET_DIR_NAME: &str = "style_sheets";
pub const CSS_FILE_NAME: &str = "style.css";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LAST_BUILD_FILE_NAME: &str = ".yabi.modified";

const DEFAULT_STYLESHEET: &str = include_str!("../static/style.css");

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("{0} does not contain a blog")]
    NotABlog(PathBuf),
    #[error("{0} already contains a blog")]
    AlreadyABlog(PathBuf),
    #[error("{0} already exists and is not empty, choose another path for the blog")]
    PathOccupied(PathBuf),
    #[error("{0} is not inside the posts directory")]
    OutsidePosts(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Paths of one blog site.
#[derive(Debug, Clone)]
pub struct Blog {
    pub root: PathBuf,
    pub website_path: PathBuf,
    pub website_posts_path: PathBuf,
    pub website_tags_path: PathBuf,
    pub posts_path: PathBuf,
    pub data_path: PathBuf,
    pub templates_path: PathBuf,
    pub style_sheets_path: PathBuf,
    pub config_path: PathBuf,
    pub last_build_path: PathBuf,
}

impl Blog {
    /// Describe the layout rooted at `root`. Nothing is read or created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let website_path = root.join(WEBSITE_DIR_NAME);
        let data_path = root.join(DATA_DIR_NAME);
        Self {
            website_posts_path: website_path.join(POSTS_DIR_NAME),
            website_tags_path: website_path.join(TAGS_DIR_NAME),
            posts_path: root.join(POSTS_DIR_NAME),
            templates_path: data_path.join(TEMPLATE_DIR_NAME),
            style_sheets_path: data_path.join(STYLE_SHEET_DIR_NAME),
            config_path: root.join(CONFIG_FILE_NAME),
            last_build_path: root.join(LAST_BUILD_FILE_NAME),
            website_path,
            data_path,
            root,
        }
    }

    /// Open an existing site, failing if `root` is not one.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SiteError> {
        let blog = Self::new(root);
        if !blog.is_blog() {
            return Err(SiteError::NotABlog(blog.root));
        }
        Ok(blog)
    }

    /// A site has its output, posts and data directories plus a config file.
    pub fn is_blog(&self) -> bool {
        self.website_path.is_dir()
            && self.posts_path.is_dir()
            && self.data_path.is_dir()
            && self.config_path.is_file()
    }

    /// Scaffold a new site at `root`.
    ///
    /// `root` may be missing or an empty directory. The marker is dated at the
    /// Unix epoch so the first build treats config and stylesheet as changed.
    pub fn create(&self) -> Result<(), SiteError> {
        if self.is_blog() {
            return Err(SiteError::AlreadyABlog(self.root.clone()));
        }
        if self.root.exists() && !is_empty_dir(&self.root)? {
            return Err(SiteError::PathOccupied(self.root.clone()));
        }

        for dir in [
            &self.posts_path,
            &self.website_posts_path,
            &self.website_tags_path,
            &self.templates_path,
            &self.style_sheets_path,
        ] {
            fs::create_dir_all(dir)?;
        }
        fs::write(self.style_sheets_path.join(CSS_FILE_NAME), DEFAULT_STYLESHEET)?;

        let name = fs::canonicalize(&self.root)?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        SiteConfig::for_site(&name).save(&self.config_path)?;

        fs::write(&self.last_build_path, "")?;
        set_file_mtime(&self.last_build_path, FileTime::zero())?;
        Ok(())
    }

    /// Output path for a source under `posts/`: same relative location under
    /// `public/posts/`, with an `.html` extension.
    pub fn target_path_for(&self, source: &Path) -> Result<PathBuf, SiteError> {
        let rel = source
            .strip_prefix(&self.posts_path)
            .map_err(|_| SiteError::OutsidePosts(source.to_path_buf()))?;
        Ok(self.website_posts_path.join(rel).with_extension("html"))
    }

    /// All `.md` files under `posts/`, recursively, in file-name order.
    pub fn markdown_post_paths(&self) -> Result<Vec<PathBuf>, walkdir::Error> {
        files_with_extension(&self.posts_path, "md")
    }

    /// `.html` files under `public/posts/` whose stem matches no markdown
    /// source anywhere under `posts/`. Directory depth is not compared.
    pub fn orphan_target_paths(&self) -> Result<Vec<PathBuf>, walkdir::Error> {
        let stems: HashSet<OsString> = self
            .markdown_post_paths()?
            .iter()
            .filter_map(|p| p.file_stem().map(OsString::from))
            .collect();

        if !self.website_posts_path.exists() {
            return Ok(Vec::new());
        }
        Ok(files_with_extension(&self.website_posts_path, "html")?
            .into_iter()
            .filter(|p| p.file_stem().is_none_or(|stem| !stems.contains(stem)))
            .collect())
    }

    /// Modification time of the last-build marker, `None` if it is missing.
    pub fn last_build_time(&self) -> io::Result<Option<SystemTime>> {
        match fs::metadata(&self.last_build_path) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set the marker's mtime to `time`, creating it if needed.
    pub fn touch_last_build(&self, time: FileTime) -> io::Result<()> {
        if !self.last_build_path.exists() {
            fs::write(&self.last_build_path, "")?;
        }
        set_file_mtime(&self.last_build_path, time)
    }

    /// Site-absolute URL of a file under `public/`.
    pub fn url_for(&self, output: &Path) -> String {
        let rel = output.strip_prefix(&self.website_path).unwrap_or(output);
        let segments: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("/{}", segments.join("/"))
    }

    /// Output path of the page listing posts tagged `tag`.
    pub fn tag_page_path(&self, tag: &str) -> PathBuf {
        self.website_tags_path
            .join(format!("{}.html", tag_slug(tag)))
    }
}

/// File-name form of a tag: the tag percent-encoded, so distinct tags never
/// share a page and `/` cannot escape the tags directory.
pub fn tag_slug(tag: &str) -> String {
    urlencoding::encode(tag).into_owned()
}

/// Site-absolute URL of a tag page. The slug is encoded once more because
/// `%` is part of the file name.
pub fn tag_url(tag: &str) -> String {
    format!("/{TAGS_DIR_NAME}/{}.html", urlencoding::encode(&tag_slug(tag)))
}

fn files_with_extension(root: &Path, ext: &str) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let matches = entry
            .path()
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if entry.file_type().is_file() && matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_blog(tmp: &TempDir) -> Blog {
        Blog::new(tmp.path().join("test_blog"))
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn create_scaffolds_site() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        assert!(!blog.is_blog());

        blog.create().unwrap();

        assert!(blog.is_blog());
        assert!(blog.website_posts_path.is_dir());
        assert!(blog.website_tags_path.is_dir());
        assert!(blog.templates_path.is_dir());
        assert!(blog.style_sheets_path.join(CSS_FILE_NAME).is_file());

        let config = SiteConfig::load(&blog.config_path).unwrap();
        assert_eq!(config.website_name, "test_blog");
    }

    #[test]
    fn create_dates_marker_at_epoch() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        blog.create().unwrap();

        assert_eq!(
            blog.last_build_time().unwrap(),
            Some(SystemTime::UNIX_EPOCH)
        );
    }

    #[test]
    fn create_twice_is_error() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        blog.create().unwrap();
        assert!(matches!(blog.create(), Err(SiteError::AlreadyABlog(_))));
    }

    #[test]
    fn create_in_occupied_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        touch(&blog.root.join("notes.txt"));
        assert!(matches!(blog.create(), Err(SiteError::PathOccupied(_))));
        assert!(!blog.posts_path.exists());
    }

    #[test]
    fn create_over_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        touch(&blog.root);
        assert!(matches!(blog.create(), Err(SiteError::PathOccupied(_))));
    }

    #[test]
    fn create_in_empty_dir_is_allowed() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        fs::create_dir_all(&blog.root).unwrap();
        blog.create().unwrap();
        assert!(blog.is_blog());
    }

    #[test]
    fn open_requires_a_site() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Blog::open(tmp.path()),
            Err(SiteError::NotABlog(_))
        ));

        let blog = new_blog(&tmp);
        blog.create().unwrap();
        assert!(Blog::open(&blog.root).is_ok());
    }

    #[test]
    fn target_path_mirrors_subdirectories() {
        let blog = Blog::new("/site");
        let target = blog
            .target_path_for(Path::new("/site/posts/travel/2022/lisbon.md"))
            .unwrap();
        assert_eq!(target, PathBuf::from("/site/public/posts/travel/2022/lisbon.html"));
    }

    #[test]
    fn target_path_outside_posts_is_error() {
        let blog = Blog::new("/site");
        assert!(matches!(
            blog.target_path_for(Path::new("/elsewhere/post.md")),
            Err(SiteError::OutsidePosts(_))
        ));
    }

    #[test]
    fn markdown_paths_are_recursive_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        blog.create().unwrap();
        touch(&blog.posts_path.join("b.md"));
        touch(&blog.posts_path.join("a/nested.md"));
        touch(&blog.posts_path.join("notes.txt"));

        let rel: Vec<PathBuf> = blog
            .markdown_post_paths()
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(&blog.posts_path).unwrap().to_path_buf())
            .collect();
        assert_eq!(rel, vec![PathBuf::from("a/nested.md"), PathBuf::from("b.md")]);
    }

    #[test]
    fn orphans_match_by_stem_regardless_of_depth() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        blog.create().unwrap();

        touch(&blog.posts_path.join("level_1/level2/a_test_post_1.md"));
        touch(&blog.posts_path.join("a_test_post_2.md"));
        touch(&blog.website_posts_path.join("a_test_post_1.html"));
        touch(&blog.website_posts_path.join("a_test_post_2.html"));
        touch(&blog.website_posts_path.join("a_test_post_3.html"));
        touch(&blog.website_posts_path.join("deep/a_test_post_4.html"));

        let orphans: HashSet<PathBuf> = blog.orphan_target_paths().unwrap().into_iter().collect();
        assert_eq!(
            orphans,
            HashSet::from([
                blog.website_posts_path.join("a_test_post_3.html"),
                blog.website_posts_path.join("deep/a_test_post_4.html"),
            ])
        );
    }

    #[test]
    fn touch_last_build_moves_marker_forward() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        blog.create().unwrap();

        blog.touch_last_build(FileTime::now()).unwrap();
        let marker = blog.last_build_time().unwrap().unwrap();
        assert!(marker > SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn missing_marker_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let blog = new_blog(&tmp);
        assert_eq!(blog.last_build_time().unwrap(), None);
    }

    #[test]
    fn urls_are_site_absolute() {
        let blog = Blog::new("/site");
        assert_eq!(
            blog.url_for(Path::new("/site/public/posts/a/b.html")),
            "/posts/a/b.html"
        );
        assert_eq!(tag_url("rust"), "/tags/rust.html");
        assert_eq!(tag_url("open source"), "/tags/open%2520source.html");
        assert_eq!(
            blog.tag_page_path("a/b"),
            PathBuf::from("/site/public/tags/a%2Fb.html")
        );
    }

    #[test]
    fn similar_tags_get_distinct_pages() {
        let blog = Blog::new("/site");
        let tags = ["open source", "open-source", "open/source", "open_source"];
        let pages: HashSet<PathBuf> = tags.iter().map(|t| blog.tag_page_path(t)).collect();
        let urls: HashSet<String> = tags.iter().map(|t| tag_url(t)).collect();

        assert_eq!(pages.len(), tags.len());
        assert_eq!(urls.len(), tags.len());
        assert!(pages.iter().all(|p| p.parent() == Some(blog.website_tags_path.as_path())));
    }
}
