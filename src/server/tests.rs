use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tungstenite::Message;
use tungstenite::stream::MaybeTlsStream;

use super::*;

struct Project {
    _temp: TempDir,
    options: DevServerOptions,
}

fn make_project() -> Project {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let templates = root.join("src/templates");
    std::fs::create_dir_all(templates.join("lower-third")).unwrap();
    std::fs::write(templates.join("lower-third/index.html"), "<h1>lower third</h1>").unwrap();
    std::fs::write(
        templates.join("lower-third/manifest.json"),
        r#"{"previewImages":["./thumb.png"]}"#,
    )
    .unwrap();

    let client = root.join("client");
    std::fs::create_dir_all(&client).unwrap();
    std::fs::write(client.join("index.html"), "<div id=app></div>").unwrap();

    Project {
        options: DevServerOptions {
            name: "news".into(),
            host: "127.0.0.1".into(),
            port: 0,
            templates_port: 0,
            templates_dir: templates,
            client_dir: client,
        },
        _temp: temp,
    }
}

/// Blocking GET, run off the async runtime.
async fn get(url: String) -> (u16, String) {
    tokio::task::spawn_blocking(move || {
        let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        let resp = client.get(&url).send().unwrap();
        (resp.status().as_u16(), resp.text().unwrap())
    })
    .await
    .unwrap()
}

type UpdatesClient = tungstenite::WebSocket<MaybeTlsStream<TcpStream>>;

fn connect_updates(url: &str) -> UpdatesClient {
    let (ws, _) = tungstenite::connect(url).unwrap();
    set_read_timeout(&ws, Duration::from_secs(10));
    ws
}

fn set_read_timeout(ws: &UpdatesClient, timeout: Duration) {
    if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
        stream.set_read_timeout(Some(timeout)).unwrap();
    }
}

/// Next JSON text frame, or `None` once the read times out or the socket ends.
fn next_json(ws: &mut UpdatesClient) -> Option<Value> {
    loop {
        match ws.read() {
            Ok(Message::Text(text)) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

fn base(server: &DevServer) -> String {
    format!("http://{}", server.proxy_addr().unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_proxy_routes() {
    let project = make_project();
    let server = DevServer::create(project.options.clone()).await.unwrap();
    server.listen().await.unwrap();
    let base = base(&server);

    let (status, body) = get(format!("{base}/templates/lower-third/index.html")).await;
    assert_eq!((status, body.as_str()), (200, "<h1>lower third</h1>"));

    // Directory URL resolves to index.html
    let (status, body) = get(format!("{base}/templates/lower-third/")).await;
    assert_eq!((status, body.as_str()), (200, "<h1>lower third</h1>"));

    let (status, _) = get(format!("{base}/templates/missing/index.html")).await;
    assert_eq!(status, 404);

    // Client routes fall back to the SPA entry
    let (status, body) = get(format!("{base}/lower-third/edit")).await;
    assert_eq!((status, body.as_str()), (200, "<div id=app></div>"));

    server.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_updates_tunnel_sends_init() {
    let project = make_project();
    let server = DevServer::create(project.options.clone()).await.unwrap();
    server.listen().await.unwrap();
    let url = format!("ws://{}/updates", server.proxy_addr().unwrap());

    let init: Value = tokio::task::spawn_blocking(move || {
        let (mut ws, _) = tungstenite::connect(url).unwrap();
        loop {
            if let tungstenite::Message::Text(text) = ws.read().unwrap() {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(init["type"], "init");
    assert_eq!(init["payload"]["projectName"], "news");
    let template = &init["payload"]["templates"][0];
    assert_eq!(template["name"], "lower-third");
    assert_eq!(
        template["manifest"]["previewImages"][0],
        "/templates/lower-third/thumb.png"
    );

    tokio::time::timeout(Duration::from_secs(5), server.close())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_manifest_edit_reaches_every_client() {
    let project = make_project();
    let manifest = project.options.templates_dir.join("lower-third/manifest.json");
    let server = DevServer::create(project.options.clone()).await.unwrap();
    server.listen().await.unwrap();
    let url = format!("ws://{}/updates", server.proxy_addr().unwrap());

    let received = tokio::task::spawn_blocking(move || {
        let mut clients: Vec<_> = (0..2).map(|_| connect_updates(&url)).collect();
        for client in &mut clients {
            assert_eq!(next_json(client).unwrap()["type"], "init");
        }

        std::fs::write(
            &manifest,
            r#"{"schema":{"c":{"default":"red"}},"previewData":{"p":{"c":"blue"}}}"#,
        )
        .unwrap();

        clients
            .iter_mut()
            .map(|client| {
                let update = next_json(client);
                // A single write settles into a single update
                set_read_timeout(client, Duration::from_secs(1));
                let extra = next_json(client);
                (update, extra)
            })
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();

    for (update, extra) in received {
        let update = update.expect("no update received");
        assert_eq!(update["type"], "update");
        let template = &update["payload"]["templates"][0];
        assert_eq!(template["name"], "lower-third");
        assert_eq!(template["manifest"]["previewData"]["p"]["c"], "red");
        assert!(extra.is_none(), "unexpected second frame: {extra:?}");
    }

    tokio::time::timeout(Duration::from_secs(5), server.close())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_missing_template_root_fails_create() {
    let project = make_project();
    let mut options = project.options.clone();
    options.templates_dir = Path::new(&options.templates_dir).join("nope");

    let err = DevServer::create(options).await.err().expect("create must fail");
    assert!(matches!(err, ServeError::Watch(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_after_failed_listen_releases_everything() {
    let project = make_project();
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut options = project.options.clone();
    options.port = taken.local_addr().unwrap().port();

    let server = DevServer::create(options).await.unwrap();
    let err = server.listen().await.unwrap_err();
    assert!(matches!(err, ServeError::Bind { server: "proxy", .. }));

    let preview_port = server.preview_port();
    server.close().await.unwrap();
    server.close().await.unwrap();

    // The preview server did bind; its socket is released shortly after close
    let mut released = false;
    for _ in 0..40 {
        if TcpListener::bind(("127.0.0.1", preview_port)).is_ok() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(released);
}

#[tokio::test]
async fn test_close_without_listen() {
    let project = make_project();
    let server = DevServer::create(project.options.clone()).await.unwrap();
    server.close().await.unwrap();
    server.close().await.unwrap();
}
