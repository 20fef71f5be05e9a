//! Server module for running resource provider plugins
//!
//! Binds a localhost listener, announces the chosen port on stdout for the
//! engine's handshake, and serves the `ResourceProvider` service until the
//! process is told to stop.

use crate::error::Result;
use crate::grpc::ProviderService;
use crate::provider::Provider;
use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

/// Server configuration for running a provider plugin
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind; port 0 lets the OS choose
    pub address: SocketAddr,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Grace period for in-flight requests once shutdown starts
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_message_size: 400 << 20, // 400MB
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Main entry point for running a provider.
///
/// Prints the bound port as the only line on stdout, then serves until SIGINT
/// or SIGTERM.
pub async fn serve<P: Provider>(provider: P, config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.address).await?;
    let port = listener.local_addr()?.port();

    // Engine handshake: the port, and nothing else, on stdout.
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", port)?;
    stdout.flush()?;

    serve_with_listener(provider, listener, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves. No handshake
/// is printed.
pub async fn serve_with_listener<P, F>(
    provider: P,
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<()>
where
    P: Provider,
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    let service = ProviderService::new(provider);
    let cancellation = service.cancellation();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = Server::builder()
        .add_service(service.into_server(config.max_message_size))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
            let _ = stop_rx.await;
        });
    tokio::pin!(server);

    info!(address = %local_addr, "Provider server listening");

    tokio::select! {
        result = &mut server => {
            result?;
            return Ok(());
        }
        _ = shutdown => {
            info!("Shutdown requested");
        }
    }

    // Stop accepting connections and interrupt whatever is still running.
    let _ = stop_tx.send(());
    cancellation.cancel();

    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(result) => result?,
        Err(_) => warn!(
            timeout = ?config.shutdown_timeout,
            "In-flight requests did not finish before the shutdown timeout"
        ),
    }

    info!("Provider server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Unable to listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
