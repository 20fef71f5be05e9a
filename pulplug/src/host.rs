//! Client for the engine's host services
//!
//! The engine passes its address to the plugin either on the command line or
//! through `Attach`. Providers use the resulting `HostClient` to surface
//! diagnostics in the engine's own output.

use crate::error::Result;
use crate::proto::{EngineClient, LogRequest, LogSeverity};
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// Upper bound on dialing the engine
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct HostClient {
    address: String,
    client: EngineClient<Channel>,
}

impl HostClient {
    /// Dial the engine at `address`. A bare `host:port` is treated as plain
    /// HTTP/2.
    pub async fn connect(address: &str) -> Result<Self> {
        Self::connect_with_timeout(address, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Like [`HostClient::connect`], failing once the dial takes longer than
    /// `timeout`. Attach dials while holding the provider exclusively.
    pub async fn connect_with_timeout(address: &str, timeout: Duration) -> Result<Self> {
        let uri = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        debug!(address, ?timeout, "Connecting to engine");
        let channel = Endpoint::from_shared(uri)?
            .connect_timeout(timeout)
            .connect()
            .await?;

        Ok(Self {
            address: address.to_string(),
            client: EngineClient::new(channel),
        })
    }

    /// The address this client was connected with
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send a message to the engine log. `urn` may be empty for messages not
    /// tied to a resource.
    pub async fn log(&self, severity: LogSeverity, urn: &str, message: &str) -> Result<()> {
        let request = LogRequest {
            severity: severity as i32,
            message: message.to_string(),
            urn: urn.to_string(),
            stream_id: 0,
            ephemeral: false,
        };

        // Channel is cheap to clone; EngineClient::log needs &mut.
        let mut client = self.client.clone();
        client.log(request).await?;
        Ok(())
    }

    pub async fn debug(&self, urn: &str, message: &str) -> Result<()> {
        self.log(LogSeverity::Debug, urn, message).await
    }

    pub async fn info(&self, urn: &str, message: &str) -> Result<()> {
        self.log(LogSeverity::Info, urn, message).await
    }

    pub async fn warning(&self, urn: &str, message: &str) -> Result<()> {
        self.log(LogSeverity::Warning, urn, message).await
    }

    pub async fn error(&self, urn: &str, message: &str) -> Result<()> {
        self.log(LogSeverity::Error, urn, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::engine_server::{Engine, EngineServer};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{Request, Response, Status};

    #[derive(Default, Clone)]
    struct RecordingEngine {
        logs: Arc<Mutex<Vec<LogRequest>>>,
    }

    #[tonic::async_trait]
    impl Engine for RecordingEngine {
        async fn log(&self, request: Request<LogRequest>) -> std::result::Result<Response<()>, Status> {
            self.logs.lock().await.push(request.into_inner());
            Ok(Response::new(()))
        }
    }

    async fn start_engine(engine: RecordingEngine) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(EngineServer::new(engine))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn logs_reach_the_engine() {
        let engine = RecordingEngine::default();
        let address = start_engine(engine.clone()).await;

        let host = HostClient::connect(&address).await.unwrap();
        assert_eq!(host.address(), address);

        host.warning("urn:pulumi:dev::proj::xyz:index:Widget::w", "slow API")
            .await
            .unwrap();
        host.info("", "configured").await.unwrap();

        let logs = engine.logs.lock().await;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].severity, LogSeverity::Warning as i32);
        assert_eq!(logs[0].message, "slow API");
        assert_eq!(logs[0].urn, "urn:pulumi:dev::proj::xyz:index:Widget::w");
        assert_eq!(logs[1].severity, LogSeverity::Info as i32);
        assert!(logs[1].urn.is_empty());
    }

    #[tokio::test]
    async fn accepts_explicit_scheme() {
        let engine = RecordingEngine::default();
        let address = start_engine(engine.clone()).await;

        let host = HostClient::connect(&format!("http://{}", address))
            .await
            .unwrap();
        host.debug("", "hello").await.unwrap();

        assert_eq!(engine.logs.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn connect_fails_for_unreachable_engine() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(HostClient::connect(&address).await.is_err());
    }

    #[tokio::test]
    async fn connect_gives_up_after_timeout() {
        // Non-routable: the dial either hangs until the timeout or fails fast.
        let dial = HostClient::connect_with_timeout("10.255.255.1:9", Duration::from_millis(200));

        let result = tokio::time::timeout(Duration::from_secs(5), dial)
            .await
            .expect("dial should be bounded by the connect timeout");
        assert!(result.is_err());
    }
}
