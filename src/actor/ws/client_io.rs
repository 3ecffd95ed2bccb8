use std::io::ErrorKind;
use std::net::TcpStream;

use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::Connection;

/// A WebSocket client whose handshake already completed.
///
/// The socket is switched to non-blocking mode: writes that cannot finish
/// stay buffered inside tungstenite and are flushed on the next poll.
pub struct WsConnection {
    ws: WebSocket<TcpStream>,
}

impl WsConnection {
    pub fn new(ws: WebSocket<TcpStream>) -> Self {
        let _ = ws.get_ref().set_nonblocking(true);
        Self { ws }
    }
}

fn would_block(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(e) if e.kind() == ErrorKind::WouldBlock)
}

impl Connection for WsConnection {
    fn send_text(&mut self, text: &str) -> tungstenite::Result<()> {
        match self.ws.send(Message::Text(text.to_owned().into())) {
            Err(ref e) if would_block(e) => Ok(()),
            other => other,
        }
    }

    fn poll(&mut self) -> bool {
        loop {
            match self.ws.read() {
                Ok(Message::Close(_)) => return false,
                // The protocol has no client messages; pings are answered by tungstenite
                Ok(_) => continue,
                Err(ref e) if would_block(e) => break,
                Err(_) => return false,
            }
        }

        match self.ws.flush() {
            Err(ref e) if would_block(e) => true,
            result => result.is_ok(),
        }
    }

    fn close(&mut self) {
        let _ = self.ws.close(None);
        let _ = self.ws.flush();
    }
}
