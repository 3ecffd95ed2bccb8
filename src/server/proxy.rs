//! UI/proxy server routing.
//!
//! ```text
//! ^/templates/.+   -> preview server (HTTP forward)
//! /updates         -> hub (WebSocket tunnel)
//! everything else  -> client_dir, falling back to index.html
//! ```

use std::cell::OnceCell;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use tiny_http::{Request, Response, StatusCode};

use super::{response, tunnel};
use crate::manifest::INDEX_FILE;
use crate::utils::path::resolve_url_path;

/// Path of the live-update WebSocket endpoint.
pub const UPDATES_PATH: &str = "/updates";

/// Hop-by-hop headers never forwarded in either direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "content-length",
    "host",
];

thread_local! {
    // One connection pool per request worker
    static CLIENT: OnceCell<reqwest::blocking::Client> = const { OnceCell::new() };
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Templates,
    Updates,
    Static,
}

/// Routing table of the UI/proxy server.
pub struct Proxy {
    templates: Regex,
    preview_port: u16,
    hub_port: u16,
    client_dir: PathBuf,
}

impl Proxy {
    pub fn new(preview_port: u16, hub_port: u16, client_dir: PathBuf) -> Result<Self, regex::Error> {
        Ok(Self {
            templates: Regex::new(r"^/templates/.+")?,
            preview_port,
            hub_port,
            client_dir,
        })
    }

    fn route(&self, url: &str) -> Route {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if self.templates.is_match(path) {
            Route::Templates
        } else if path == UPDATES_PATH {
            Route::Updates
        } else {
            Route::Static
        }
    }

    pub fn handle_request(&self, request: Request) -> Result<()> {
        match self.route(request.url()) {
            Route::Templates => self.forward(request),
            Route::Updates => tunnel::upgrade(request, self.hub_port),
            Route::Static => self.serve_client(request),
        }
    }

    /// Serve the authoring client with single-page-app fallback.
    fn serve_client(&self, request: Request) -> Result<()> {
        let path = resolve_url_path(request.url(), &self.client_dir)
            .or_else(|| resolve_url_path(INDEX_FILE, &self.client_dir));

        match path {
            Some(path) => response::respond_file(request, &path),
            None => response::respond_not_found(request),
        }
    }

    /// Forward a request to the preview server and relay its response.
    fn forward(&self, mut request: Request) -> Result<()> {
        let url = format!("http://127.0.0.1:{}{}", self.preview_port, request.url());
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .context("unsupported method")?;

        let mut body = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("failed to read request body")?;

        let mut headers = reqwest::header::HeaderMap::new();
        for header in request.headers() {
            let name = header.field.as_str().as_str();
            if is_hop_by_hop(name) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(name.as_bytes()),
                reqwest::header::HeaderValue::from_str(header.value.as_str()),
            ) {
                headers.append(name, value);
            }
        }

        let upstream = with_client(|client| {
            client
                .request(method, &url)
                .headers(headers)
                .body(body)
                .send()
                .and_then(|resp| {
                    let status = resp.status().as_u16();
                    let headers: Vec<(String, String)> = resp
                        .headers()
                        .iter()
                        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
                        .filter_map(|(name, value)| {
                            Some((name.to_string(), value.to_str().ok()?.to_string()))
                        })
                        .collect();
                    Ok((status, headers, resp.bytes()?))
                })
        });

        let (status, headers, bytes) = match upstream {
            Ok(upstream) => upstream,
            Err(e) => {
                crate::log!("proxy"; "preview server unreachable: {}", e);
                return response::respond_bad_gateway(request, &e.to_string());
            }
        };

        let mut reply = Response::from_data(bytes.to_vec()).with_status_code(StatusCode(status));
        for (name, value) in &headers {
            reply = response::with_header(reply, name, value);
        }
        request.respond(reply)?;
        Ok(())
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

fn with_client<T>(f: impl FnOnce(&reqwest::blocking::Client) -> T) -> T {
    CLIENT.with(|cell| {
        let client = cell.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .no_proxy()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new())
        });
        f(client)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> Proxy {
        Proxy::new(5173, 5174, PathBuf::from("/client")).unwrap()
    }

    #[test]
    fn test_route_templates() {
        let proxy = proxy();
        assert_eq!(proxy.route("/templates/a/index.html"), Route::Templates);
        assert_eq!(proxy.route("/templates/a/"), Route::Templates);
        assert_eq!(proxy.route("/templates/"), Route::Static);
        assert_eq!(proxy.route("/templates"), Route::Static);
    }

    #[test]
    fn test_route_updates() {
        let proxy = proxy();
        assert_eq!(proxy.route("/updates"), Route::Updates);
        assert_eq!(proxy.route("/updates?token=1"), Route::Updates);
        assert_eq!(proxy.route("/updates/more"), Route::Static);
    }

    #[test]
    fn test_route_static() {
        let proxy = proxy();
        assert_eq!(proxy.route("/"), Route::Static);
        assert_eq!(proxy.route("/assets/app.js"), Route::Static);
        assert_eq!(proxy.route("/lower-third"), Route::Static);
    }

    #[test]
    fn test_hop_by_hop() {
        assert!(is_hop_by_hop("Connection"));
        assert!(is_hop_by_hop("transfer-encoding"));
        assert!(!is_hop_by_hop("content-type"));
    }
}
