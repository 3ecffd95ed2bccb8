//! Blocking HTTP server lifecycle.
//!
//! Each server owns an acceptor thread that hands requests to a small rayon
//! pool. [`HttpServer::close`] unblocks the acceptor and waits for it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Request, Server};

use super::ServeError;
use super::response;

/// Request worker threads per server.
const POOL_THREADS: usize = 4;

/// Request handler shared by the pool.
pub type Handler = Arc<dyn Fn(Request) -> anyhow::Result<()> + Send + Sync>;

/// A bound, running HTTP server.
pub struct HttpServer {
    name: &'static str,
    addr: SocketAddr,
    server: Arc<Server>,
    closing: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Bind `addr` and start serving with `handler`.
    pub fn bind(name: &'static str, addr: SocketAddr, handler: Handler) -> Result<Self, ServeError> {
        let server = Server::http(addr).map_err(|e| ServeError::bind(name, addr, e))?;
        let addr = server.server_addr().to_ip().unwrap_or(addr);
        let server = Arc::new(server);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(POOL_THREADS)
            .thread_name(move |i| format!("{name}-{i}"))
            .build()?;

        let closing = Arc::new(AtomicBool::new(false));
        let worker = {
            let server = Arc::clone(&server);
            let closing = Arc::clone(&closing);
            thread::Builder::new()
                .name(format!("{name}-accept"))
                .spawn(move || run_request_loop(name, &server, &pool, &closing, &handler))
                .map_err(|e| ServeError::bind(name, addr, e))?
        };

        crate::debug!("serve"; "{} listening on {}", name, addr);

        Ok(Self {
            name,
            addr,
            server,
            closing,
            worker: Some(worker),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and release the socket. Idempotent.
    ///
    /// Waits up to two seconds for the acceptor thread.
    pub fn close(&mut self) -> Result<(), String> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.closing.store(true, Ordering::SeqCst);
        self.server.unblock();

        for _ in 0..40 {
            if worker.is_finished() {
                return worker
                    .join()
                    .map_err(|_| format!("{} worker panicked", self.name));
            }
            thread::sleep(Duration::from_millis(50));
        }
        Err(format!("{} did not stop in time", self.name))
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn run_request_loop(
    name: &'static str,
    server: &Server,
    pool: &rayon::ThreadPool,
    closing: &Arc<AtomicBool>,
    handler: &Handler,
) {
    for request in server.incoming_requests() {
        let handler = Arc::clone(handler);
        let closing = Arc::clone(closing);
        pool.spawn(move || {
            let result = if closing.load(Ordering::SeqCst) {
                response::respond_unavailable(request)
            } else {
                handler(request)
            };
            if let Err(e) = result {
                crate::debug!("serve"; "{} request error: {:#}", name, e);
            }
        });
    }
}
