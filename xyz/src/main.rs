use pulplug::{HostClient, PluginArgs, ServerConfig};
use tracing::{error, info};
use xyz::{make_provider, METADATA, OPENAPI, PROVIDER_NAME, PROVIDER_VERSION, SCHEMA};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = PluginArgs::from_env()?;
    pulplug::init_logging(args.verbosity);

    let host = match args.engine_address.as_deref() {
        Some(address) => Some(HostClient::connect(address).await?),
        None => None,
    };

    let provider = make_provider(host, PROVIDER_NAME, PROVIDER_VERSION, SCHEMA, OPENAPI, METADATA)
        .inspect_err(|e| error!(error = %e, "Failed to initialize provider"))?;

    info!(version = PROVIDER_VERSION, "Starting provider");
    pulplug::serve(provider, ServerConfig::default()).await?;

    Ok(())
}
