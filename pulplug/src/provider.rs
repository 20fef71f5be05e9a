//! The provider capability trait
//!
//! `Provider` has one method per `ResourceProvider` RPC. Every method has a
//! default body that reports the RPC as unimplemented, so a concrete provider
//! overrides exactly the operations it supports and the engine receives an
//! explicit `UNIMPLEMENTED` status for the rest.
//!
//! `configure` and `attach` take `&mut self`: they are the only calls allowed
//! to change provider state, and the gRPC layer serializes them behind a write
//! lock.

use crate::context::Context;
use crate::error::{PulplugError, Result};
use crate::proto::{
    CallRequest, CallResponse, CheckRequest, CheckResponse, ConfigureRequest, ConfigureResponse,
    ConstructRequest, ConstructResponse, CreateRequest, CreateResponse, DeleteRequest,
    DiffRequest, DiffResponse, GetMappingRequest, GetMappingResponse, GetMappingsRequest,
    GetMappingsResponse, GetSchemaRequest, GetSchemaResponse, InvokeRequest, InvokeResponse,
    PluginAttach, PluginInfo, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// Stream of responses produced by `StreamInvoke`
pub type InvokeStream =
    Pin<Box<dyn Stream<Item = std::result::Result<InvokeResponse, tonic::Status>> + Send>>;

#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Fetch the JSON-encoded package schema.
    async fn get_schema(
        &self,
        _ctx: Context,
        _request: GetSchemaRequest,
    ) -> Result<GetSchemaResponse> {
        Err(PulplugError::unimplemented("GetSchema"))
    }

    /// Validate the provider's own configuration.
    async fn check_config(&self, _ctx: Context, _request: CheckRequest) -> Result<CheckResponse> {
        Err(PulplugError::unimplemented("CheckConfig"))
    }

    /// Report the impact of a change to the provider's configuration.
    async fn diff_config(&self, _ctx: Context, _request: DiffRequest) -> Result<DiffResponse> {
        Err(PulplugError::unimplemented("DiffConfig"))
    }

    /// Prepare the provider to handle resource requests (credentials etc).
    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureRequest,
    ) -> Result<ConfigureResponse> {
        Err(PulplugError::unimplemented("Configure"))
    }

    async fn invoke(&self, _ctx: Context, _request: InvokeRequest) -> Result<InvokeResponse> {
        Err(PulplugError::unimplemented("Invoke"))
    }

    async fn stream_invoke(&self, _ctx: Context, _request: InvokeRequest) -> Result<InvokeStream> {
        Err(PulplugError::unimplemented("StreamInvoke"))
    }

    /// Execute a method of a component resource.
    async fn call(&self, _ctx: Context, _request: CallRequest) -> Result<CallResponse> {
        Err(PulplugError::unimplemented("Call"))
    }

    /// Validate resource inputs and return the inputs to use for Diff, Create
    /// and Update.
    async fn check(&self, _ctx: Context, _request: CheckRequest) -> Result<CheckResponse> {
        Err(PulplugError::unimplemented("Check"))
    }

    async fn diff(&self, _ctx: Context, _request: DiffRequest) -> Result<DiffResponse> {
        Err(PulplugError::unimplemented("Diff"))
    }

    /// Allocate a new resource. A failed create must leave nothing behind.
    async fn create(&self, _ctx: Context, _request: CreateRequest) -> Result<CreateResponse> {
        Err(PulplugError::unimplemented("Create"))
    }

    /// Read the live state of a resource.
    async fn read(&self, _ctx: Context, _request: ReadRequest) -> Result<ReadResponse> {
        Err(PulplugError::unimplemented("Read"))
    }

    async fn update(&self, _ctx: Context, _request: UpdateRequest) -> Result<UpdateResponse> {
        Err(PulplugError::unimplemented("Update"))
    }

    /// Tear down a resource. On failure the resource is assumed to still exist.
    async fn delete(&self, _ctx: Context, _request: DeleteRequest) -> Result<()> {
        Err(PulplugError::unimplemented("Delete"))
    }

    async fn construct(
        &self,
        _ctx: Context,
        _request: ConstructRequest,
    ) -> Result<ConstructResponse> {
        Err(PulplugError::unimplemented("Construct"))
    }

    /// Advisory request to abort ongoing operations. In-flight contexts are
    /// already cancelled by the time this runs.
    async fn cancel(&self, _ctx: Context) -> Result<()> {
        Err(PulplugError::unimplemented("Cancel"))
    }

    async fn get_plugin_info(&self, _ctx: Context) -> Result<PluginInfo> {
        Err(PulplugError::unimplemented("GetPluginInfo"))
    }

    /// Receive the engine address when the plugin was started outside the engine.
    async fn attach(&mut self, _ctx: Context, _request: PluginAttach) -> Result<()> {
        Err(PulplugError::unimplemented("Attach"))
    }

    async fn get_mapping(
        &self,
        _ctx: Context,
        _request: GetMappingRequest,
    ) -> Result<GetMappingResponse> {
        Err(PulplugError::unimplemented("GetMapping"))
    }

    async fn get_mappings(
        &self,
        _ctx: Context,
        _request: GetMappingsRequest,
    ) -> Result<GetMappingsResponse> {
        Err(PulplugError::unimplemented("GetMappings"))
    }
}
