use std::{fs, net::SocketAddr};

use rcj_referee::{ConsoleMessage, ConsoleSink};
use rcj_webui::{router, serve, ConsoleBridge};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::broadcast,
};

async fn request(addr: SocketAddr, head: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!(
        "{head} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn console_messages_reach_subscribers() {
    let bridge = ConsoleBridge::new();
    let mut rx = bridge.subscribe();
    let mut console = bridge.console();

    console.send(ConsoleMessage::Log {
        message: "RESET".into(),
    });
    console.send(ConsoleMessage::GameOver {});
    assert_eq!(rx.recv().await.unwrap(), r#"{"msg":"log","args":{"message":"RESET"}}"#);
    assert_eq!(rx.recv().await.unwrap(), r#"{"msg":"game_over","args":{}}"#);

    // Nobody listening is fine
    drop(rx);
    console.send(ConsoleMessage::GameOver {});
}

#[tokio::test]
async fn serves_commands_and_static_files() {
    let static_dir = tempfile::tempdir().unwrap();
    fs::write(static_dir.path().join("index.html"), "<h1>console</h1>").unwrap();

    let mut bridge = ConsoleBridge::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let server = tokio::spawn(serve(
        listener,
        router(bridge.state(), static_dir.path()),
        shutdown_rx,
    ));

    assert!(bridge.try_next_command().is_none());
    let command = r#"{"msg": "setup", "args": {}}"#;
    let response = request(addr, "POST /api/command", command).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(bridge.try_next_command().as_deref(), Some(command));
    assert!(bridge.try_next_command().is_none());

    let response = request(addr, "GET /", "").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("<h1>console</h1>"));

    let response = request(addr, "GET /missing.js", "").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    shutdown_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn queued_commands_come_out_one_per_call() {
    let static_dir = tempfile::tempdir().unwrap();
    let mut bridge = ConsoleBridge::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let server = tokio::spawn(serve(
        listener,
        router(bridge.state(), static_dir.path()),
        shutdown_rx,
    ));

    let commands = [
        r#"{"msg": "setup", "args": {}}"#,
        r#"{"msg": "reset", "args": {}}"#,
        r#"{"msg": "move_out", "args": {}}"#,
    ];
    for command in commands {
        let response = request(addr, "POST /api/command", command).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    }
    for command in commands {
        assert_eq!(bridge.try_next_command().as_deref(), Some(command));
    }
    assert!(bridge.try_next_command().is_none());

    shutdown_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
