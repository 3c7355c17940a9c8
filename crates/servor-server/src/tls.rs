//! TLS listener.
//!
//! Loads PEM material into a rustls acceptor and serves an axum router
//! over HTTP/1.1 on each handshaked connection.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls;

use crate::error::ServerError;

fn tls_error(path: &Path, message: impl Into<String>) -> ServerError {
    ServerError::Tls {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Build a TLS acceptor from a PEM certificate chain and private key.
///
/// # Errors
///
/// Returns [`ServerError::Tls`] naming the offending file if either file is
/// missing, unreadable, empty, or rejected by rustls.
pub(crate) fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, ServerError> {
    let cert_file = File::open(cert_path)
        .map_err(|e| tls_error(cert_path, format!("failed to open certificate: {e}")))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_error(cert_path, format!("failed to parse certificates: {e}")))?;

    if certs.is_empty() {
        return Err(tls_error(cert_path, "no certificates found"));
    }

    let key_file = File::open(key_path)
        .map_err(|e| tls_error(key_path, format!("failed to open private key: {e}")))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(|e| tls_error(key_path, format!("failed to parse private key: {e}")))?
        .ok_or_else(|| tls_error(key_path, "no private key found"))?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| tls_error(cert_path, e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Accept TLS connections forever, serving `app` on each.
///
/// Failed accepts and handshakes only affect the connection involved.
pub(crate) async fn serve(listener: TcpListener, acceptor: TlsAcceptor, app: Router) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to accept connection");
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let service = TowerToHyperService::new(app.clone());

        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::debug!(%peer, error = %err, "TLS handshake failed");
                    return;
                }
            };

            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(%peer, error = %err, "HTTP connection error");
            }
        });
    }
}

/// Write a self-signed `localhost` certificate and key into `dir`.
#[cfg(test)]
pub(crate) fn write_self_signed(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();

    let cert_path = dir.join("servor.crt");
    let key_path = dir.join("servor.key");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

/// Issue one `GET` over TLS, trusting only `cert_path`, and return the raw response.
#[cfg(test)]
pub(crate) async fn https_get(addr: std::net::SocketAddr, cert_path: &Path, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_rustls::rustls::pki_types::ServerName;

    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut BufReader::new(File::open(cert_path).unwrap())) {
        roots.add(cert.unwrap()).unwrap();
    }
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = tokio_rustls::TlsConnector::from(Arc::new(config));

    let tcp = tokio::net::TcpStream::connect(addr).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut stream = connector.connect(server_name, tcp).await.unwrap();

    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    // Bytes read before an unclean close are kept
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}
