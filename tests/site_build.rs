//! End-to-end test: init a blog, build it, edit it, build again.
//!
//! Drives only the public API, the same calls `yabi init` and `yabi build`
//! make. Timestamps are pinned with `filetime` so the incremental decisions do
//! not depend on filesystem clock resolution.

use chrono::NaiveDate;
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use yabi::blog::Blog;
use yabi::build::{BuildOptions, BuildReport, build};
use yabi::config::SiteConfig;

const FIRST: &str = "draft: no
tags: [travel, Lisbon]
date: 2022-12-11

# Tram 28

Up the hill and *down again*.
";

const SECOND: &str = "draft: no
date: 2022-12-12

# Winter notes

Short days.
";

const WIP: &str = "draft: yes

# Not yet

Half an idea.
";

fn run(blog: &Blog, force: bool) -> BuildReport {
    let options = BuildOptions {
        force,
        today: NaiveDate::from_ymd_opt(2022, 12, 13).unwrap(),
    };
    build(blog, &options).unwrap()
}

fn pin(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// Make every input look older than the last build.
fn settle(blog: &Blog) {
    pin(&blog.config_path, 1_000);
    for entry in walkdir::WalkDir::new(&blog.style_sheets_path) {
        pin(entry.unwrap().path(), 1_000);
    }
    for entry in walkdir::WalkDir::new(&blog.posts_path) {
        pin(entry.unwrap().path(), 1_000);
    }
    pin(&blog.last_build_path, 2_000);
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn blog_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let blog = Blog::new(tmp.path().join("field notes"));
    blog.create().unwrap();
    assert!(Blog::open(&blog.root).is_ok());

    fs::create_dir_all(blog.posts_path.join("2022")).unwrap();
    fs::write(blog.posts_path.join("2022/tram.md"), FIRST).unwrap();
    fs::write(blog.posts_path.join("winter.md"), SECOND).unwrap();
    fs::write(blog.posts_path.join("wip.md"), WIP).unwrap();

    // First build: everything is new.
    let report = run(&blog, false);
    assert!(report.stylesheet_copied);
    assert!(report.config_updated);
    assert_eq!(report.built.len(), 2);
    assert_eq!(report.dated, vec![blog.posts_path.join("wip.md")]);
    assert!(read(&blog.posts_path.join("wip.md")).starts_with("date: 2022-12-13\ndraft: yes"));

    let tram = blog.website_posts_path.join("2022/tram.html");
    assert!(read(&tram).contains("<em>down again</em>"));
    assert!(!blog.website_posts_path.join("wip.html").exists());

    let index = read(&blog.website_path.join("index.html"));
    assert!(index.contains("field notes"));
    let winter_at = index.find("/posts/winter.html").unwrap();
    let tram_at = index.find("/posts/2022/tram.html").unwrap();
    assert!(winter_at < tram_at);
    assert!(!index.contains("Not yet"));

    assert!(blog.tag_page_path("travel").is_file());
    assert!(blog.tag_page_path("Lisbon").is_file());
    assert!(blog.tag_page_path("blog").is_file());

    // Nothing changed: nothing happens.
    settle(&blog);
    assert!(run(&blog, false).is_noop());

    // A template override plus a config change re-renders everything with it.
    fs::write(
        blog.templates_path.join("post.html"),
        "<h1>{{ post.title }}</h1>{{ content | safe }}<footer>{{ website_author }}</footer>",
    )
    .unwrap();
    let mut config = SiteConfig::load(&blog.config_path).unwrap();
    config.website_author = "Ana".into();
    config.save(&blog.config_path).unwrap();
    pin(&blog.config_path, 3_000);

    let report = run(&blog, false);
    assert!(report.config_updated);
    assert_eq!(report.built.len(), 2);
    assert_eq!(
        read(&tram),
        "<h1>Tram 28</h1><p>Up the hill and <em>down again</em>.</p><footer>Ana</footer>"
    );

    // Removing a source removes its page and its tags.
    fs::remove_file(blog.posts_path.join("2022/tram.md")).unwrap();
    settle(&blog);
    let report = run(&blog, false);
    assert_eq!(report.orphans_deleted, vec![tram.clone()]);
    assert!(!tram.exists());
    assert!(!blog.tag_page_path("travel").exists());
    assert!(!read(&blog.website_path.join("index.html")).contains("/posts/2022/tram.html"));
}

#[test]
fn build_outside_a_blog_fails() {
    let tmp = TempDir::new().unwrap();
    let err = Blog::open(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("does not contain a blog"));
}
