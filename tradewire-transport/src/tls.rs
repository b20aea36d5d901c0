/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! TLS trust configuration.
//!
//! Trust material comes from the environment: a PEM bundle path and an
//! optional password. With neither set, the platform trust roots apply.

use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use std::path::Path;
use std::sync::Arc;
use tokio_tungstenite::Connector;
use tracing::debug;
use tradewire_core::error::TransportError;

/// Environment variable naming the PEM trust bundle.
pub const TRUSTSTORE_ENV: &str = "TRADEWIRE_TRUSTSTORE";

/// Environment variable naming the trust store password.
///
/// Accepted for configuration parity with keystore-based deployments;
/// PEM bundles carry no password.
pub const TRUSTSTORE_PASSWORD_ENV: &str = "TRADEWIRE_TRUSTSTORE_PASSWORD";

/// Builds the TLS connector for the WebSocket client.
///
/// Returns `None` when no trust store is configured, which selects the
/// library default (platform roots).
///
/// # Errors
/// Fails with [`TransportError::Tls`] if the configured bundle cannot be
/// read or holds no usable certificates.
pub fn build_connector() -> Result<Option<Connector>, TransportError> {
    let Some(path) = std::env::var_os(TRUSTSTORE_ENV) else {
        return Ok(None);
    };
    if std::env::var_os(TRUSTSTORE_PASSWORD_ENV).is_some() {
        debug!("trust store password ignored for PEM bundles");
    }
    connector_from_pem(Path::new(&path)).map(Some)
}

/// Builds a connector trusting exactly the certificates in a PEM bundle.
///
/// # Errors
/// Fails with [`TransportError::Tls`] on read or parse problems.
pub fn connector_from_pem(path: &Path) -> Result<Connector, TransportError> {
    let data = std::fs::read(path).map_err(|e| TransportError::Tls {
        reason: format!("cannot read trust store {}: {e}", path.display()),
    })?;

    let certs: Vec<CertificateDer<'_>> = rustls_pemfile::certs(&mut data.as_slice())
        .collect::<Result<_, _>>()
        .map_err(|e| TransportError::Tls {
            reason: format!("malformed trust store {}: {e}", path.display()),
        })?;

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if added == 0 {
        return Err(TransportError::Tls {
            reason: format!(
                "trust store {} holds no usable certificates ({ignored} rejected)",
                path.display()
            ),
        });
    }
    debug!(added, ignored, "custom trust store loaded");

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Connector::Rustls(Arc::new(config)))
}
