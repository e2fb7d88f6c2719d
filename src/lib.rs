//! # yabi
//!
//! A small static blog generator. Posts are markdown files with a block of
//! `label: value` metadata lines on top; the output is a plain HTML site with
//! a home page, one page per post and one page per tag.
//!
//! # Architecture: Incremental Build
//!
//! ```text
//! posts/**.md ──► parse ──► Post ──► render ──► public/posts/**.html
//!                                       │
//!                         all public posts, newest first
//!                                       ▼
//!                public/index.html, public/tags.html, public/tags/*.html
//! ```
//!
//! A build re-renders only what changed. Each post page is compared with its
//! source by mtime. Site-wide inputs (`config.json`, the stylesheets) are
//! compared with the mtime of a marker file, `.yabi.modified`, that every
//! build which saw them change bumps. No other state survives between runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`parse`] | Finds the metadata run and the `# Title` line in a post's raw text |
//! | [`post`] | `Post` entity: typed metadata, dirtiness, markdown rendering, date injection |
//! | [`blog`] | Site layout on disk, `init`, source→target paths, orphan detection |
//! | [`config`] | `config.json` loading and the per-build `SiteGlobals` |
//! | [`templates`] | Built-in maud theme plus optional tera overrides |
//! | [`render`] | Writes post, home and tag pages into `public/` |
//! | [`build`] | The incremental build orchestrator and its `BuildReport` |
//! | [`output`] | CLI output formatting |
//! | [`serve`] | Localhost preview server for `public/` |
//!
//! # Design Decisions
//!
//! ## Metadata Is Not Front Matter
//!
//! There is no `---` fence. The metadata block is the first contiguous run of
//! `label: value` lines, and the title is the first `# ` line after it,
//! separated only by blank lines. Anything else before the title is an error,
//! so a prose line that happens to look like `word: text` further down the
//! body is never mistaken for metadata.
//!
//! ## Two Template Layers
//!
//! The stock theme is written in [Maud](https://maud.lambda.xyz/) and compiled
//! into the binary, so a fresh blog builds with no template files at all. A
//! site can replace any page by dropping a same-named file into
//! `data/templates/`; those are rendered with Tera and see the same values.
//!
//! ## Drafts Never Reach `public/`
//!
//! A post marked `draft: yes` is never rendered, and a page rendered before
//! the post became a draft is deleted on the next build.

pub mod blog;
pub mod build;
pub mod config;
pub mod output;
pub mod parse;
pub mod post;
pub mod render;
pub mod serve;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;
