//! Development server orchestration.
//!
//! ```text
//!                 ┌── ^/templates/.+ ──> preview server (template root)
//! browser ─> proxy ── /updates ───────> hub (WebSocket, via tunnel)
//!                 └── everything else ─> client_dir (SPA fallback)
//! ```
//!
//! [`DevServer`] owns the watcher, the hub and both HTTP servers, and tears
//! them down together.

mod error;
mod http;
pub mod port;
mod preview;
mod proxy;
mod response;
mod tunnel;
mod urls;

pub use error::{CloseError, ServeError};
pub use urls::server_urls;

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::actor::fs::TemplateWatcher;
use crate::actor::messages::TemplateSource;
use crate::live::HubServer;
use http::{Handler, HttpServer};
use proxy::Proxy;

/// Internal servers only talk to the proxy.
const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Settings for [`DevServer::create`].
#[derive(Debug, Clone)]
pub struct DevServerOptions {
    /// Project name sent to clients in `init`
    pub name: String,
    /// Public host of the UI/proxy server
    pub host: String,
    /// Public port of the UI/proxy server
    pub port: u16,
    /// Preferred port of the template preview server
    pub templates_port: u16,
    pub templates_dir: PathBuf,
    /// Static files of the authoring client
    pub client_dir: PathBuf,
}

impl Default for DevServerOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: "localhost".into(),
            port: 8080,
            templates_port: 5173,
            templates_dir: PathBuf::from("src/templates"),
            client_dir: PathBuf::from("client"),
        }
    }
}

/// Unified lifecycle of every server the dev environment runs.
pub struct DevServer {
    options: DevServerOptions,
    watcher: Arc<TemplateWatcher>,
    hub: HubServer,
    preview_port: u16,
    proxy: Arc<Proxy>,
    preview_server: Mutex<Option<HttpServer>>,
    proxy_server: Mutex<Option<HttpServer>>,
}

impl DevServer {
    /// Start the watcher and hub and allocate ports.
    ///
    /// HTTP servers are bound by [`listen`](Self::listen). On failure,
    /// everything started so far is released.
    pub async fn create(options: DevServerOptions) -> Result<Self, ServeError> {
        let watcher = TemplateWatcher::watch(&options.templates_dir)?;

        let started = Self::start_hub(&options, &watcher);
        let (preview_port, hub) = match started {
            Ok(started) => started,
            Err(e) => {
                watcher.close();
                return Err(e);
            }
        };

        let proxy = match Proxy::new(preview_port, hub.port(), options.client_dir.clone()) {
            Ok(proxy) => Arc::new(proxy),
            Err(e) => {
                watcher.close();
                let _ = hub.close().await;
                return Err(e.into());
            }
        };

        crate::debug!("serve"; "preview port {}, hub port {}", preview_port, hub.port());

        Ok(Self {
            options,
            watcher,
            hub,
            preview_port,
            proxy,
            preview_server: Mutex::new(None),
            proxy_server: Mutex::new(None),
        })
    }

    fn start_hub(
        options: &DevServerOptions,
        watcher: &Arc<TemplateWatcher>,
    ) -> Result<(u16, HubServer), ServeError> {
        let loopback = LOOPBACK.to_string();
        let preview_port = port::allocate(&loopback, Some(options.templates_port))?;
        let hub_port = port::allocate(&loopback, None)?;

        let source: Arc<dyn TemplateSource> = Arc::clone(watcher) as Arc<dyn TemplateSource>;
        let hub = HubServer::start(SocketAddr::new(LOOPBACK, hub_port), &options.name, source)?;
        Ok((preview_port, hub))
    }

    /// Bind the preview and proxy servers concurrently.
    ///
    /// Resolves once both accept connections. A server that did bind is kept
    /// so [`close`](Self::close) releases it.
    pub async fn listen(&self) -> Result<(), ServeError> {
        let preview_addr = SocketAddr::new(LOOPBACK, self.preview_port);
        let root = self.watcher.root().to_path_buf();
        let preview_handler: Handler =
            Arc::new(move |req: tiny_http::Request| preview::handle_request(req, &root));

        let proxy_addr = resolve_host(&self.options.host, self.options.port)?;
        let proxy = Arc::clone(&self.proxy);
        let proxy_handler: Handler =
            Arc::new(move |req: tiny_http::Request| proxy.handle_request(req));

        let preview = tokio::task::spawn_blocking(move || {
            HttpServer::bind("preview", preview_addr, preview_handler)
        });
        let proxy = tokio::task::spawn_blocking(move || {
            HttpServer::bind("proxy", proxy_addr, proxy_handler)
        });
        let (preview, proxy) = tokio::join!(preview, proxy);

        let preview = preview.map_err(|e| ServeError::Task(e.to_string()))?;
        let proxy = proxy.map_err(|e| ServeError::Task(e.to_string()))?;

        let mut first_error = None;
        match preview {
            Ok(server) => *self.preview_server.lock() = Some(server),
            Err(e) => first_error = Some(e),
        }
        match proxy {
            Ok(server) => *self.proxy_server.lock() = Some(server),
            Err(e) => first_error = first_error.or(Some(e)),
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn preview_port(&self) -> u16 {
        self.preview_port
    }

    pub fn hub_port(&self) -> u16 {
        self.hub.port()
    }

    /// Bound address of the proxy server, once listening.
    pub fn proxy_addr(&self) -> Option<SocketAddr> {
        self.proxy_server.lock().as_ref().map(HttpServer::addr)
    }

    /// URLs of the UI/proxy server.
    pub fn urls(&self) -> Vec<String> {
        let port = self.proxy_addr().map_or(self.options.port, |addr| addr.port());
        server_urls(&self.options.host, port)
    }

    pub fn print_urls(&self) {
        urls::print_urls(&self.options.name, &self.urls());
    }

    /// Stop everything: watcher, preview server, proxy server, hub.
    ///
    /// Every component is attempted even if an earlier one fails. Safe to
    /// call repeatedly and after a failed `listen`.
    pub async fn close(&self) -> Result<(), CloseError> {
        let mut failures = Vec::new();

        self.watcher.close();

        for (name, slot) in [
            ("preview server", &self.preview_server),
            ("proxy server", &self.proxy_server),
        ] {
            let Some(mut server) = slot.lock().take() else {
                continue;
            };
            match tokio::task::spawn_blocking(move || server.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push((name, e)),
                Err(e) => failures.push((name, e.to_string())),
            }
        }

        if let Err(e) = self.hub.close().await {
            failures.push(("hub", e));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError { failures })
        }
    }
}

/// Resolve the public host, preferring IPv4 when a name maps to several
/// addresses.
fn resolve_host(host: &str, port: u16) -> Result<SocketAddr, ServeError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| ServeError::bind("proxy", format!("{host}:{port}"), e))?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or(addrs.first())
        .copied()
        .ok_or_else(|| {
            ServeError::bind("proxy", format!("{host}:{port}"), "host resolved to no address")
        })
}

#[cfg(test)]
mod tests;
