//! TLS configuration and certificate loading.

use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};

use crate::config::TlsConfig;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Restrict ALPN to `http/1.1`; workers only speak HTTP/1.1.
pub fn http1_only(config: &RustlsConfig) -> RustlsConfig {
    let mut server_config = (*config.get_inner()).clone();
    server_config.alpn_protocols = vec![b"http/1.1".to_vec()];
    RustlsConfig::from_config(Arc::new(server_config))
}

/// Build the handshake acceptor for a listener's TLS section.
pub async fn acceptor_for(tls: &TlsConfig) -> Result<RustlsAcceptor, std::io::Error> {
    let config = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
    Ok(RustlsAcceptor::new(http1_only(&config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_certificate_is_not_found() {
        let err = load_tls_config(Path::new("/no/such/cert.pem"), Path::new("/no/such/key.pem"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("Certificate"));
    }

    #[tokio::test]
    async fn alpn_advertises_http1_only() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let config = load_tls_config(&fixtures.join("localhost.crt"), &fixtures.join("localhost.key"))
            .await
            .unwrap();

        let restricted = http1_only(&config);
        assert_eq!(restricted.get_inner().alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let cert = tempfile::NamedTempFile::new().unwrap();
        let tls = TlsConfig {
            cert_path: cert.path().to_string_lossy().into_owned(),
            key_path: "/no/such/key.pem".into(),
        };
        let err = acceptor_for(&tls).await.err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("Private key"));
    }
}
