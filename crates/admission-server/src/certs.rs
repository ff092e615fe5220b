use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ::tracing::{info, warn};
use anyhow::{Result, anyhow};
use axum_server::tls_rustls::RustlsConfig;
use rustls::{
    RootCertStore, ServerConfig,
    server::{WebPkiClientVerifier, danger::ClientCertVerifier},
};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject};

use crate::config::TlsConfig;

type ClientVerifier = Arc<dyn ClientCertVerifier>;

/// Server certificate, its key and the optional client verifier
struct TlsMaterial {
    cert: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    client_verifier: Option<ClientVerifier>,
}

impl TlsMaterial {
    async fn load(tls_config: &TlsConfig) -> Result<Self> {
        let (cert, key) = load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file)
            .await?;
        let client_verifier = load_client_verifier(&tls_config.client_ca_file).await?;

        Ok(Self {
            cert,
            key,
            client_verifier,
        })
    }

    fn server_config(&self) -> Result<ServerConfig> {
        let builder = match &self.client_verifier {
            Some(verifier) => ServerConfig::builder().with_client_cert_verifier(verifier.clone()),
            None => ServerConfig::builder().with_no_client_auth(),
        };

        builder
            .with_single_cert(self.cert.clone(), self.key.clone_key())
            .map_err(|e| anyhow!("Cannot build TLS configuration: {e}"))
    }
}

/// Without inotify the certificates are loaded once
#[cfg(not(target_os = "linux"))]
pub(crate) async fn create_tls_config_and_watch_certificate_changes(
    tls_config: TlsConfig,
) -> Result<RustlsConfig> {
    let material = TlsMaterial::load(&tls_config).await?;
    Ok(RustlsConfig::from_config(Arc::new(material.server_config()?)))
}

/// Build the TLS configuration of the server and reload it whenever the
/// certificate files are rewritten.
///
/// The server certificate is swapped only once both the certificate and
/// its key have been written, client CA files are reloaded on every change.
#[cfg(target_os = "linux")]
pub(crate) async fn create_tls_config_and_watch_certificate_changes(
    tls_config: TlsConfig,
) -> Result<RustlsConfig> {
    use ::tracing::error;
    use inotify::{Inotify, WatchDescriptor, WatchMask};
    use tokio_stream::StreamExt;

    let mut material = TlsMaterial::load(&tls_config).await?;
    let rustls_config = RustlsConfig::from_config(Arc::new(material.server_config()?));
    let reloadable_config = rustls_config.clone();

    let inotify = Inotify::init().map_err(|e| anyhow!("Cannot initialize inotify: {e}"))?;
    let watch = |path: &PathBuf| -> Result<WatchDescriptor> {
        inotify
            .watches()
            .add(path, WatchMask::CLOSE_WRITE)
            .map_err(|e| anyhow!("Cannot watch {}: {e}", path.display()))
    };
    let cert_watch = watch(&tls_config.cert_file)?;
    let key_watch = watch(&tls_config.key_file)?;
    let client_ca_watches = tls_config
        .client_ca_file
        .iter()
        .map(watch)
        .collect::<Result<Vec<_>>>()?;

    let stream = inotify
        .into_event_stream([0; 1024])
        .map_err(|e| anyhow!("Cannot create inotify event stream: {e}"))?;

    tokio::spawn(async move {
        tokio::pin!(stream);
        let mut cert_changed = false;
        let mut key_changed = false;

        while let Some(event) = stream.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    warn!("Cannot read inotify event: {e}");
                    continue;
                }
            };

            if event.wd == cert_watch {
                info!("TLS certificate file has been modified");
                cert_changed = true;
            } else if event.wd == key_watch {
                info!("TLS key file has been modified");
                key_changed = true;
            } else if client_ca_watches.contains(&event.wd) {
                info!("TLS client CA file has been modified");
                match load_client_verifier(&tls_config.client_ca_file).await {
                    Ok(verifier) => material.client_verifier = verifier,
                    Err(e) => {
                        error!("Failed to reload client CA certificates: {e}");
                        continue;
                    }
                }
            }

            if cert_changed && key_changed {
                cert_changed = false;
                key_changed = false;
                match load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file).await
                {
                    Ok((cert, key)) => {
                        material.cert = cert;
                        material.key = key;
                    }
                    Err(e) => {
                        error!("Failed to reload TLS certificates: {e}");
                        continue;
                    }
                }
            } else if cert_changed || key_changed {
                // wait for the other half of the pair
                continue;
            }

            match material.server_config() {
                Ok(server_config) => {
                    info!("Reloading TLS configuration");
                    reloadable_config.reload_from_config(Arc::new(server_config));
                }
                Err(e) => error!("Failed to reload TLS configuration: {e}"),
            }
        }
    });

    Ok(rustls_config)
}

fn parse_pem_certs(contents: &[u8], path: &Path) -> Vec<CertificateDer<'static>> {
    CertificateDer::pem_slice_iter(contents)
        .filter_map(|cert| {
            cert.map_err(|e| warn!("Cannot parse certificate in {}: {e}", path.display()))
                .ok()
        })
        .collect()
}

async fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_contents = tokio::fs::read(cert_file)
        .await
        .map_err(|e| anyhow!("Cannot read {}: {e}", cert_file.display()))?;
    let key_contents = tokio::fs::read(key_file)
        .await
        .map_err(|e| anyhow!("Cannot read {}: {e}", key_file.display()))?;

    let certs = parse_pem_certs(&cert_contents, cert_file);
    if certs.is_empty() {
        return Err(anyhow!(
            "No certificate found in {}",
            cert_file.display()
        ));
    }

    let key = PrivateKeyDer::from_pem_slice(&key_contents)
        .map_err(|e| anyhow!("Cannot parse private key {}: {e}", key_file.display()))?;

    Ok((certs, key))
}

async fn load_client_verifier(client_ca_files: &[PathBuf]) -> Result<Option<ClientVerifier>> {
    if client_ca_files.is_empty() {
        return Ok(None);
    }

    let mut store = RootCertStore::empty();
    for client_ca_file in client_ca_files {
        let contents = tokio::fs::read(client_ca_file)
            .await
            .map_err(|e| anyhow!("Cannot read {}: {e}", client_ca_file.display()))?;
        let (added, ignored) =
            store.add_parsable_certificates(parse_pem_certs(&contents, client_ca_file));
        info!(
            client_ca_certs_added = added,
            client_ca_certs_ignored = ignored,
            path = %client_ca_file.display(),
            "Loaded client CA certificates"
        );
    }

    WebPkiClientVerifier::builder(Arc::new(store))
        .build()
        .map(Some)
        .map_err(|e| anyhow!("Cannot build client verifier: {e}"))
}
