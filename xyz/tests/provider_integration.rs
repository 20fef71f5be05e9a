#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use pulplug::proto::*;
use pulplug::{serve_with_listener, ServerConfig};
use serial_test::serial;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::transport::Channel;
use tonic::Code;
use xyz::provider::API_KEY_VARIABLE;
use xyz::{make_provider, METADATA, OPENAPI, PROVIDER_NAME, SCHEMA};

struct RunningProvider {
    client: ResourceProviderClient<Channel>,
    shutdown: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<pulplug::Result<()>>,
}

async fn start_provider(version: &str) -> RunningProvider {
    let provider = make_provider(None, PROVIDER_NAME, version, SCHEMA, OPENAPI, METADATA).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(serve_with_listener(
        provider,
        listener,
        ServerConfig::default().with_shutdown_timeout(Duration::from_secs(1)),
        async {
            let _ = shutdown_rx.await;
        },
    ));

    let client = ResourceProviderClient::connect(format!("http://{}", addr))
        .await
        .unwrap();

    RunningProvider {
        client,
        shutdown,
        handle,
    }
}

impl RunningProvider {
    async fn stop(self) {
        drop(self.client);
        let _ = self.shutdown.send(());
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("provider should stop")
            .unwrap()
            .unwrap();
    }
}

fn configure_request(variables: &[(&str, &str)]) -> ConfigureRequest {
    ConfigureRequest {
        variables: variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
        accept_secrets: true,
        ..Default::default()
    }
}

#[tokio::test]
#[serial]
async fn configure_with_config_variable() {
    std::env::remove_var("XYZ_API_KEY");
    let mut provider = start_provider("0.1.0").await;

    let response = provider
        .client
        .configure(configure_request(&[(API_KEY_VARIABLE, "secret-key")]))
        .await
        .unwrap()
        .into_inner();

    assert!(response.accept_secrets);
    provider.stop().await;
}

#[tokio::test]
#[serial]
async fn configure_with_environment_variable() {
    std::env::set_var("XYZ_API_KEY", "env-key");
    let mut provider = start_provider("0.1.0").await;

    let response = provider.client.configure(configure_request(&[])).await;
    std::env::remove_var("XYZ_API_KEY");

    assert!(response.unwrap().into_inner().accept_secrets);
    provider.stop().await;
}

#[tokio::test]
#[serial]
async fn configure_without_api_key_fails() {
    std::env::remove_var("XYZ_API_KEY");
    let mut provider = start_provider("0.1.0").await;

    let status = provider
        .client
        .configure(configure_request(&[]))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "api key is required");
    provider.stop().await;
}

#[tokio::test]
async fn schema_and_plugin_info() {
    let mut provider = start_provider("2.3.4").await;

    let schema = provider
        .client
        .get_schema(GetSchemaRequest::default())
        .await
        .unwrap()
        .into_inner()
        .schema;
    assert_eq!(schema.as_bytes(), SCHEMA);

    let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
    assert_eq!(parsed["name"], "xyz");

    let info = provider
        .client
        .get_plugin_info(())
        .await
        .unwrap()
        .into_inner();
    assert_eq!(info.version, "2.3.4");

    provider.stop().await;
}

#[tokio::test]
async fn resource_operations_are_unimplemented() {
    let mut provider = start_provider("0.1.0").await;

    let status = provider
        .client
        .create(CreateRequest {
            urn: "urn:pulumi:dev::proj::xyz:widgets:Widget::w".to_string(),
            preview: true,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
    assert_eq!(status.message(), "Create is not implemented");

    let status = tokio_test::assert_err!(provider.client.check(CheckRequest::default()).await);
    assert_eq!(status.code(), Code::Unimplemented);

    tokio_test::assert_ok!(provider.client.cancel(()).await);
    provider.stop().await;
}

#[tokio::test]
async fn binary_prints_port_and_serves() {
    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_pulumi-resource-xyz"))
        .arg("-logtostderr")
        .arg("-v=3")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let mut lines = BufReader::new(stdout).lines();
    let line = tokio::time::timeout(Duration::from_secs(10), lines.next_line())
        .await
        .expect("handshake should be printed")
        .unwrap()
        .unwrap();
    let port: u16 = line.trim().parse().unwrap();

    let mut client = ResourceProviderClient::connect(format!("http://127.0.0.1:{}", port))
        .await
        .unwrap();
    let info = client.get_plugin_info(()).await.unwrap().into_inner();
    assert_eq!(info.version, xyz::PROVIDER_VERSION);

    child.kill().await.unwrap();
}
