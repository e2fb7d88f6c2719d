//! Development server for the generated site.
//!
//! Serves `public/` over plain HTTP on localhost until the process is
//! interrupted. There is no rebuild-on-change: run `yabi build` in another
//! terminal and reload.
//!
//! Request resolution:
//!
//! 1. Percent-decode each path segment and drop the query string.
//! 2. Reject any `..` segment (404).
//! 3. A directory resolves to its `index.html`.
//! 4. Anything that is not a file is a 404.

use log::{debug, warn};
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

pub const DEFAULT_PORT: u16 = 8000;
const HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("{0} does not exist, build the blog first")]
    NoOutput(PathBuf),
    #[error("cannot listen on {addr}: {message}")]
    Bind { addr: SocketAddr, message: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Serve `root` on `127.0.0.1:<port>`. Blocks until the process is killed.
pub fn serve(root: &Path, port: u16) -> Result<(), ServeError> {
    if !root.is_dir() {
        return Err(ServeError::NoOutput(root.to_path_buf()));
    }
    let addr = SocketAddr::new(HOST, port);
    let server = Server::http(addr).map_err(|e| ServeError::Bind {
        addr,
        message: e.to_string(),
    })?;

    println!("==> Serving {} at http://{}", root.display(), addr);
    println!("    Press Ctrl+C to stop");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            warn!("request error: {e}");
        }
    }
    Ok(())
}

fn handle_request(request: Request, root: &Path) -> io::Result<()> {
    match resolve_path(root, request.url()) {
        Some(path) => {
            debug!("{} {} -> {}", request.method(), request.url(), path.display());
            let body = fs::read(&path)?;
            let response = Response::from_data(body).with_header(header(content_type(&path))?);
            request.respond(response)
        }
        None => {
            debug!("{} {} -> 404", request.method(), request.url());
            let response = Response::from_string("404 Not Found")
                .with_status_code(404)
                .with_header(header("text/plain; charset=utf-8")?);
            request.respond(response)
        }
    }
}

fn header(content_type: &str) -> io::Result<Header> {
    Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).map_err(|()| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid header value: {content_type}"),
        )
    })
}

/// Map a request URL to a file under `root`, or `None` for a 404.
fn resolve_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let mut resolved = root.to_path_buf();
    for segment in path.split('/') {
        let segment = urlencoding::decode(segment).ok()?;
        match segment.as_ref() {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['/', '\\']) => return None,
            s => resolved.push(s),
        }
    }
    if resolved.is_dir() {
        resolved.push(INDEX_FILE);
    }
    resolved.is_file().then_some(resolved)
}

/// MIME type from the file extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
