//! WebSocket tunnel from the UI/proxy server to the hub.
//!
//! The browser's upgrade is answered by the proxy itself; a second
//! WebSocket is opened to the hub and frames are pumped hub -> browser on a
//! dedicated thread. The protocol has no client messages, so a browser that
//! went away is noticed on the next forwarded frame.

use std::io::{Read, Write};
use std::thread;

use anyhow::{Context, Result};
use tiny_http::{Request, Response, StatusCode};
use tungstenite::handshake::derive_accept_key;
use tungstenite::protocol::{Message, Role};
use tungstenite::WebSocket;

use super::response::{self, header_value, with_header};

/// Answer a WebSocket upgrade on `/updates` and start pumping frames.
pub fn upgrade(request: Request, hub_port: u16) -> Result<()> {
    let is_upgrade = header_value(&request, "upgrade").is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    let key = header_value(&request, "sec-websocket-key").map(str::to_owned);
    let (true, Some(key)) = (is_upgrade, key) else {
        let reply = Response::from_string("expected a WebSocket upgrade").with_status_code(StatusCode(426));
        request.respond(with_header(reply, "Upgrade", "websocket"))?;
        return Ok(());
    };

    // Reach the hub first so a dead hub is a 502, not a socket that never speaks
    let hub = match tungstenite::connect(format!("ws://127.0.0.1:{hub_port}/")) {
        Ok((hub, _)) => hub,
        Err(e) => {
            crate::log!("proxy"; "hub unreachable: {}", e);
            return response::respond_bad_gateway(request, &e.to_string());
        }
    };

    let reply = Response::empty(StatusCode(101));
    let reply = with_header(reply, "Upgrade", "websocket");
    let reply = with_header(reply, "Connection", "Upgrade");
    let reply = with_header(reply, "Sec-WebSocket-Accept", &derive_accept_key(key.as_bytes()));
    let stream = request.upgrade("websocket", reply);
    let browser = WebSocket::from_raw_socket(stream, Role::Server, None);

    thread::Builder::new()
        .name("updates-tunnel".into())
        .spawn(move || pump(hub, browser))
        .context("failed to spawn tunnel thread")?;

    crate::debug!("proxy"; "updates tunnel opened");
    Ok(())
}

/// Copy data frames from `from` to `to` until either side closes.
fn pump<A, B>(mut from: WebSocket<A>, mut to: WebSocket<B>)
where
    A: Read + Write,
    B: Read + Write,
{
    loop {
        match from.read() {
            Ok(msg @ (Message::Text(_) | Message::Binary(_))) => {
                if let Err(e) = to.send(msg) {
                    crate::debug!("proxy"; "browser went away: {}", e);
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                crate::debug!("proxy"; "hub connection ended: {}", e);
                break;
            }
        }
    }

    let _ = to.close(None);
    let _ = to.flush();
    let _ = from.close(None);
    let _ = from.flush();
    crate::debug!("proxy"; "updates tunnel closed");
}
