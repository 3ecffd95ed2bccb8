//! WebSocket server for live updates.
//!
//! An acceptor thread completes the handshake and hands each client to the
//! hub actor via channel.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::actor::messages::{HubMsg, TemplateSource};
use crate::actor::ws::{HubActor, WsConnection};
use crate::server::ServeError;

/// Handshakes that take longer than this are dropped.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long `close` waits for the actor to say goodbye to its clients.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Handle to a running broadcast hub.
pub struct HubServer {
    addr: SocketAddr,
    tx: mpsc::Sender<HubMsg>,
    stop: Arc<AtomicBool>,
    acceptor: Mutex<Option<JoinHandle<()>>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HubServer {
    /// Bind `addr` and start the hub actor. Must be called within a tokio runtime.
    pub fn start(
        addr: SocketAddr,
        project_name: &str,
        source: Arc<dyn TemplateSource>,
    ) -> Result<Self, ServeError> {
        let listener = TcpListener::bind(addr).map_err(|e| ServeError::bind("hub", addr, e))?;
        let addr = listener.local_addr().map_err(|e| ServeError::bind("hub", addr, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| ServeError::bind("hub", addr, e))?;

        let (tx, rx) = mpsc::channel(32);
        let task = tokio::spawn(HubActor::new(rx, source, project_name).run());

        let stop = Arc::new(AtomicBool::new(false));
        let acceptor = {
            let tx = tx.clone();
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("hub-accept".into())
                .spawn(move || accept_loop(listener, tx, stop))
                .map_err(|e| ServeError::bind("hub", addr, e))?
        };

        crate::debug!("hub"; "ws://{}", addr);

        Ok(Self {
            addr,
            tx,
            stop,
            acceptor: Mutex::new(Some(acceptor)),
            task: Mutex::new(Some(task)),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Disconnect every client and stop listening. Idempotent.
    pub async fn close(&self) -> Result<(), String> {
        if self.stop.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let _ = self.tx.send(HubMsg::Shutdown).await;
        let task = self.task.lock().take();
        let acceptor = self.acceptor.lock().take();

        let mut result = Ok(());
        if let Some(task) = task {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => result = Err(format!("hub actor failed: {e}")),
                Err(_) => result = Err("hub actor did not stop in time".to_string()),
            }
        }

        // The acceptor notices `stop` within one poll interval
        if let Some(acceptor) = acceptor {
            let joined = tokio::task::spawn_blocking(move || acceptor.join()).await;
            if !matches!(joined, Ok(Ok(()))) && result.is_ok() {
                result = Err("hub acceptor panicked".to_string());
            }
        }

        crate::debug!("hub"; "closed");
        result
    }
}

impl Drop for HubServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

fn accept_loop(listener: TcpListener, tx: mpsc::Sender<HubMsg>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("hub"; "client connecting: {}", addr);
                let Some(client) = handshake(stream) else {
                    continue;
                };
                if tx.blocking_send(HubMsg::Connect(Box::new(client))).is_err() {
                    break; // Actor stopped
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                crate::log!("hub"; "accept error: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

/// Blocking WebSocket handshake with a bounded wait.
fn handshake(stream: TcpStream) -> Option<WsConnection> {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));

    match tungstenite::accept(stream) {
        Ok(ws) => {
            let _ = ws.get_ref().set_read_timeout(None);
            Some(WsConnection::new(ws))
        }
        Err(e) => {
            crate::log!("hub"; "handshake failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::Value;
    use tungstenite::Message;

    use super::*;
    use crate::actor::messages::ChangeBatch;
    use crate::manifest::{Snapshot, TemplateEntry};

    #[derive(Default)]
    struct StaticSource {
        listeners: Mutex<Vec<mpsc::UnboundedSender<ChangeBatch>>>,
    }

    impl StaticSource {
        fn notify(&self) {
            for tx in self.listeners.lock().iter() {
                let _ = tx.send(ChangeBatch { paths: vec![] });
            }
        }
    }

    impl TemplateSource for StaticSource {
        fn snapshot(&self) -> Snapshot {
            vec![TemplateEntry {
                name: "lower-third".into(),
                manifest: None,
            }]
        }

        fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeBatch> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.listeners.lock().push(tx);
            rx
        }
    }

    fn read_json(ws: &mut tungstenite::WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>) -> Value {
        loop {
            match ws.read().unwrap() {
                Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
                _ => continue,
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_loopback_init_then_update() {
        let source = Arc::new(StaticSource::default());
        let hub = HubServer::start(
            "127.0.0.1:0".parse().unwrap(),
            "news",
            Arc::clone(&source) as Arc<dyn TemplateSource>,
        )
        .unwrap();
        let url = format!("ws://{}/", hub.addr());

        let (mut client, init) = tokio::task::spawn_blocking(move || {
            let (mut client, _) = tungstenite::connect(url).unwrap();
            let init = read_json(&mut client);
            (client, init)
        })
        .await
        .unwrap();

        assert_eq!(init["type"], "init");
        assert_eq!(init["payload"]["projectName"], "news");
        assert_eq!(init["payload"]["templates"][0]["name"], "lower-third");

        source.notify();
        let update = tokio::task::spawn_blocking(move || read_json(&mut client))
            .await
            .unwrap();
        assert_eq!(update["type"], "update");

        hub.close().await.unwrap();
        hub.close().await.unwrap();
    }
}
