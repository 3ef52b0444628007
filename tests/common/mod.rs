//! Shared utilities for integration testing.

use std::sync::Arc;
use std::time::Duration;

use httpcap::config::{CapConfig, ListenerConfig};
use httpcap::http::MemorySink;
use httpcap::lifecycle::startup_with_sink;
use httpcap::RunningAcceptor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Configuration bound to an ephemeral loopback port.
pub fn loopback_config() -> CapConfig {
    CapConfig {
        listener: ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            tls: None,
        },
        ..CapConfig::default()
    }
}

/// Start a server whose traces land in the returned sink.
#[allow(dead_code)]
pub async fn start_server() -> (RunningAcceptor, MemorySink) {
    let sink = MemorySink::new();
    let running = startup_with_sink(&loopback_config(), Arc::new(sink.clone()))
        .await
        .unwrap();
    (running, sink)
}

#[allow(dead_code)]
pub async fn connect(running: &RunningAcceptor) -> TcpStream {
    TcpStream::connect(running.local_addr()).await.unwrap()
}

/// Send raw bytes and read one bodiless response head.
pub async fn exchange<S>(stream: &mut S, request: &str) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request.as_bytes()).await.unwrap();
    read_head(stream).await
}

/// Read up to and including the blank line that ends a response head.
pub async fn read_head<S>(stream: &mut S) -> String
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    let read = async {
        while !head.ends_with(b"\r\n\r\n") {
            let n = stream.read(&mut byte).await.unwrap();
            assert!(n > 0, "connection closed before response head completed");
            head.push(byte[0]);
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("timed out waiting for response");
    String::from_utf8(head).unwrap()
}

/// Case-insensitive header lookup in a raw response head.
#[allow(dead_code)]
pub fn header(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

/// Drain whatever the server still sends; true once it closes its side.
#[allow(dead_code)]
pub async fn closed_by_server(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 256];
    let drain = async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), drain).await.is_ok()
}
