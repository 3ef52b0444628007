//! End-to-end tests for the TLS listener.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use httpcap::config::{TlsConfig, TransportKind};
use httpcap::http::MemorySink;
use httpcap::lifecycle::startup_with_sink;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Client trusting the fixture certificate and offering both h2 and http/1.1.
fn connector() -> TlsConnector {
    let pem = std::fs::read(fixture("localhost.crt")).unwrap();
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
        roots.add(cert.unwrap()).unwrap();
    }

    let mut config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    TlsConnector::from(Arc::new(config))
}

#[tokio::test]
async fn tls_negotiates_http1_and_traces_body() {
    let mut config = common::loopback_config();
    config.listener.tls = Some(TlsConfig {
        cert_path: fixture("localhost.crt").to_string_lossy().into_owned(),
        key_path: fixture("localhost.key").to_string_lossy().into_owned(),
    });

    let sink = MemorySink::new();
    let running = startup_with_sink(&config, Arc::new(sink.clone())).await.unwrap();
    assert_eq!(running.transport(), TransportKind::Encrypted);

    let tcp = TcpStream::connect(running.local_addr()).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut tls = connector().connect(server_name, tcp).await.unwrap();
    assert_eq!(tls.get_ref().1.alpn_protocol(), Some(&b"http/1.1"[..]));

    let head = common::exchange(
        &mut tls,
        "POST /secure HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 200 OK"), "unexpected head: {head}");
    assert_eq!(common::header(&head, "connection").as_deref(), Some("keep-alive"));

    let lines = sink.lines();
    assert_eq!(lines.first().map(String::as_str), Some("POST /secure HTTP/1.1"));
    assert_eq!(lines.last().map(String::as_str), Some("hello"));

    running.stop().await.unwrap();
}
