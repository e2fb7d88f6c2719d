//! CLI output formatting.
//!
//! Output is a short inventory of what changed on disk, paths relative to the
//! site root. Nothing is printed for posts that were already up to date.
//!
//! ## Build
//!
//! ```text
//! Stylesheets → public/
//! Config changed, rebuilding all posts
//! Dated
//!     posts/notes/first.md
//! Built
//!     001 → public/posts/notes/first.html
//! Deleted
//!     public/posts/old.html (orphan)
//!     public/posts/second.html (draft)
//! Home → public/index.html
//! Tags → public/tags.html
//!     blog, rust
//!
//! 3 posts: 1 built, 1 draft, 2 deleted
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::blog::WEBSITE_DIR_NAME;
use crate::build::BuildReport;
use crate::render::ALL_TAGS_PAGE;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Path relative to `root` when it lies below it.
fn rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Zero-padded 3-digit index.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Init
// ============================================================================

pub fn format_init_output(root: &Path) -> Vec<String> {
    vec![
        format!("Created blog at {}", root.display()),
        "    Write posts under posts/, then run `yabi build` inside the blog".to_string(),
    ]
}

pub fn print_init_output(root: &Path) {
    for line in format_init_output(root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a build report. `root` is the site root.
pub fn format_build_report(report: &BuildReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if report.stylesheet_copied {
        lines.push(format!("Stylesheets \u{2192} {WEBSITE_DIR_NAME}/"));
    }
    if report.config_updated {
        lines.push("Config changed, rebuilding all posts".to_string());
    }

    if !report.dated.is_empty() {
        lines.push("Dated".to_string());
        for source in &report.dated {
            lines.push(format!("    {}", rel(source, root)));
        }
    }

    if !report.built.is_empty() {
        lines.push("Built".to_string());
        for (i, target) in report.built.iter().enumerate() {
            lines.push(format!(
                "    {} \u{2192} {}",
                format_index(i + 1),
                rel(target, root)
            ));
        }
    }

    let deleted = report.orphans_deleted.len() + report.withdrawn.len();
    if deleted > 0 {
        lines.push("Deleted".to_string());
        for orphan in &report.orphans_deleted {
            lines.push(format!("    {} (orphan)", rel(orphan, root)));
        }
        for target in &report.withdrawn {
            lines.push(format!("    {} (draft)", rel(target, root)));
        }
    }

    if let Some(aggregates) = &report.aggregates {
        lines.push(format!("Home \u{2192} {}", rel(&aggregates.home, root)));
        lines.push(format!(
            "Tags \u{2192} {WEBSITE_DIR_NAME}/{ALL_TAGS_PAGE}"
        ));
        if !aggregates.tags.is_empty() {
            lines.push(format!("    {}", aggregates.tags.join(", ")));
        }
        for page in &aggregates.removed_tag_pages {
            lines.push(format!("    {} (removed)", rel(page, root)));
        }
    }

    if report.is_noop() {
        lines.push(format!(
            "Nothing to do, {} up to date",
            plural(report.post_count, "post")
        ));
    } else {
        lines.push(String::new());
        lines.push(format!(
            "{}: {} built, {}, {} deleted",
            plural(report.post_count, "post"),
            report.built.len(),
            plural(report.skipped_drafts.len(), "draft"),
            deleted
        ));
    }

    lines
}

/// Print a build report to stdout.
pub fn print_build_report(report: &BuildReport, root: &Path) {
    for line in format_build_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
