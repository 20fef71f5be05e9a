//! The XYZ resource provider
//!
//! Bootstraps from three embedded payloads (package schema, OpenAPI document,
//! generator metadata) and implements the configuration half of the plugin
//! contract. Resource lifecycle RPCs fall through to the framework's
//! "unimplemented" defaults.

use crate::error::XyzError;
use crate::http::{build_http_client, HttpClientConfig};
use crate::metadata::ProviderMetadata;
use crate::openapi::load_openapi_spec;
use async_trait::async_trait;
use openapiv3::OpenAPI;
use pulplug::proto::{
    ConfigureRequest, ConfigureResponse, GetSchemaRequest, GetSchemaResponse, PluginAttach,
    PluginInfo,
};
use pulplug::{Context, HostClient, PackageSpec, Provider};
use std::collections::HashMap;
use tracing::{debug, info};

/// Configuration variable carrying the API key
pub const API_KEY_VARIABLE: &str = "xyz:config:apiKey";

/// Provider input property whose `defaultInfo.environment` lists fallback
/// environment variables for the API key
const API_KEY_PROPERTY: &str = "apiKey";

pub struct XyzProvider {
    host: Option<HostClient>,
    name: String,
    version: String,

    metadata: ProviderMetadata,

    base_url: String,
    http_client: reqwest::Client,
    openapi: OpenAPI,
    schema: PackageSpec,
    schema_json: String,

    api_key: Option<String>,
}

/// Build the provider from its serialized inputs.
pub fn make_provider(
    host: Option<HostClient>,
    name: &str,
    version: &str,
    schema_bytes: &[u8],
    openapi_bytes: &[u8],
    metadata_bytes: &[u8],
) -> Result<XyzProvider, XyzError> {
    let openapi = load_openapi_spec(openapi_bytes).map_err(XyzError::OpenApi)?;

    let metadata = ProviderMetadata::from_slice(metadata_bytes).map_err(XyzError::Metadata)?;

    let http_client = build_http_client(
        &HttpClientConfig::default().with_user_agent(format!("pulumi-resource-{}/{}", name, version)),
    )
    .map_err(XyzError::HttpClient)?;

    let schema = PackageSpec::from_slice(schema_bytes).map_err(XyzError::Schema)?;

    let base_url = openapi
        .servers
        .first()
        .map(|server| server.url.clone())
        .ok_or(XyzError::MissingServer)?;

    info!(
        name,
        version,
        base_url = %base_url,
        resources = metadata.crud_map.len(),
        "Provider initialized"
    );

    Ok(XyzProvider {
        host,
        name: name.to_string(),
        version: version.to_string(),
        metadata,
        base_url,
        http_client,
        openapi,
        schema,
        schema_json: String::from_utf8_lossy(schema_bytes).into_owned(),
        api_key: None,
    })
}

impl XyzProvider {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn host(&self) -> Option<&HostClient> {
        self.host.as_ref()
    }

    pub fn openapi(&self) -> &OpenAPI {
        &self.openapi
    }

    pub fn schema(&self) -> &PackageSpec {
        &self.schema
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// The configured key wins; otherwise the first declared environment
    /// variable with a non-empty value.
    fn resolve_api_key(&self, variables: &HashMap<String, String>) -> Result<String, XyzError> {
        if let Some(key) = variables.get(API_KEY_VARIABLE).filter(|v| !v.is_empty()) {
            return Ok(key.clone());
        }

        self.schema
            .provider
            .default_environment(API_KEY_PROPERTY)
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
            .ok_or(XyzError::MissingApiKey)
    }
}

#[async_trait]
impl Provider for XyzProvider {
    async fn get_schema(
        &self,
        _ctx: Context,
        _request: GetSchemaRequest,
    ) -> pulplug::Result<GetSchemaResponse> {
        Ok(GetSchemaResponse {
            schema: self.schema_json.clone(),
        })
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureRequest,
    ) -> pulplug::Result<ConfigureResponse> {
        let api_key = self.resolve_api_key(&request.variables)?;

        debug!("Configuring XYZ API key");
        self.api_key = Some(api_key);

        Ok(ConfigureResponse {
            accept_secrets: true,
            ..Default::default()
        })
    }

    async fn get_plugin_info(&self, _ctx: Context) -> pulplug::Result<PluginInfo> {
        Ok(PluginInfo {
            version: self.version.clone(),
        })
    }

    async fn attach(&mut self, _ctx: Context, request: PluginAttach) -> pulplug::Result<()> {
        let host = HostClient::connect(&request.address).await?;
        info!(address = %request.address, "Attached to engine");
        self.host = Some(host);
        Ok(())
    }
}
