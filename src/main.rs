use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use yabi::blog::Blog;
use yabi::build::{BuildOptions, build};
use yabi::{output, serve};

#[derive(Parser)]
#[command(name = "yabi")]
#[command(about = "Static blog generator with incremental builds")]
#[command(long_about = "\
Static blog generator with incremental builds

Posts are markdown files with a block of `label: value` lines on top:

  draft: no
  date: 2022-12-11
  tags: [rust, tools]

  # My first post

  Markdown body...

Site layout:

  <blog>/
  ├── config.json            # website_name, website_author, home_max_posts, ...
  ├── posts/**.md            # sources, any nesting
  ├── data/templates/        # optional overrides: post.html, index.html, tag.html, all_tags.html
  ├── data/style_sheets/     # copied into public/ when changed
  └── public/                # generated site

`build` only re-renders posts whose source is newer than their page. A
changed config.json rebuilds everything; --force does too.

Set RUST_LOG=info to see every file written or deleted.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new blog at PATH
    Init {
        /// Directory to create; must be missing or empty
        path: PathBuf,
    },
    /// Build the blog in the current directory
    Build {
        /// Re-render every public post, even unchanged ones
        #[arg(long)]
        force: bool,
    },
    /// Serve public/ on localhost for previewing
    #[command(alias = "serve")]
    Test {
        /// Port to listen on
        #[arg(long, default_value_t = serve::DEFAULT_PORT)]
        port: u16,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Init { path } => {
            Blog::new(&path).create()?;
            output::print_init_output(&path);
        }
        Command::Build { force } => {
            let blog = Blog::open(std::env::current_dir()?)?;
            println!("==> Building {}", blog.root.display());
            let report = build(&blog, &BuildOptions::new(force))?;
            output::print_build_report(&report, &blog.root);
        }
        Command::Test { port } => {
            let blog = Blog::open(std::env::current_dir()?)?;
            serve::serve(&blog.website_path, port)?;
        }
    }

    Ok(())
}
