//! gRPC service implementation for the ResourceProvider contract
//!
//! `ProviderService` adapts any [`Provider`] to the generated
//! `resource_provider_server::ResourceProvider` trait. Each call gets a fresh
//! [`Context`], races the provider against that context's cancellation, and
//! maps [`PulplugError`](crate::error::PulplugError) into a gRPC status.

use crate::context::{Cancellation, Context};
use crate::error::PulplugError;
use crate::proto::resource_provider_server::ResourceProvider as ProtoResourceProvider;
use crate::proto::*;
use crate::provider::{InvokeStream, Provider};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, instrument, warn};

pub struct ProviderService<P: Provider> {
    provider: Arc<RwLock<P>>,
    cancellation: Cancellation,
}

impl<P: Provider> ProviderService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            cancellation: Cancellation::new(),
        }
    }

    /// Shared handle to the wrapped provider
    pub fn provider(&self) -> Arc<RwLock<P>> {
        self.provider.clone()
    }

    pub fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }

    /// Wrap the service in the generated tonic server with the given message limit
    pub fn into_server(self, max_message_size: usize) -> ResourceProviderServer<Self> {
        ResourceProviderServer::new(self)
            .max_decoding_message_size(max_message_size)
            .max_encoding_message_size(max_message_size)
    }

    fn context<T>(&self, method: &'static str, request: &Request<T>) -> Context {
        Context::from_request(method, request, &self.cancellation)
    }
}

/// Drive a provider call to completion unless the request context is
/// cancelled first.
async fn run<T, F>(ctx: &Context, call: F) -> Result<Response<T>, Status>
where
    F: Future<Output = crate::Result<T>>,
{
    let method = ctx.method();
    tokio::select! {
        biased;
        result = call => match result {
            Ok(response) => {
                debug!(method, "completed");
                Ok(Response::new(response))
            }
            Err(e) if e.is_unimplemented() => {
                debug!(method, "not implemented by provider");
                Err(e.into())
            }
            Err(e) => {
                error!(method, error = %e, "failed");
                Err(e.into())
            }
        },
        _ = ctx.cancelled() => {
            warn!(method, "cancelled before completion");
            Err(PulplugError::Cancelled(method.to_string()).into())
        }
    }
}

#[tonic::async_trait]
impl<P: Provider> ProtoResourceProvider for ProviderService<P> {
    type StreamInvokeStream = InvokeStream;

    #[instrument(skip_all, name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        request: Request<GetSchemaRequest>,
    ) -> Result<Response<GetSchemaResponse>, Status> {
        let ctx = self.context("GetSchema", &request);
        let provider = self.provider.read().await;
        run(&ctx, provider.get_schema(ctx.clone(), request.into_inner())).await
    }

    #[instrument(skip_all, name = "grpc.check_config")]
    async fn check_config(
        &self,
        request: Request<CheckRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let ctx = self.context("CheckConfig", &request);
        let provider = self.provider.read().await;
        run(&ctx, provider.check_config(ctx.clone(), request.into_inner())).await
    }

    #[instrument(skip_all, name = "grpc.diff_config")]
    async fn diff_config(
        &self,
        request: Request<DiffRequest>,
    ) -> Result<Response<DiffResponse>, Status> {
        let ctx = self.context("DiffConfig", &request);
        let provider = self.provider.read().await;
        run(&ctx, provider.diff_config(ctx.clone(), request.into_inner())).await
    }

    #[instrument(skip_all, name = "grpc.configure")]
    async fn configure(
        &self,
        request: Request<ConfigureRequest>,
    ) -> Result<Response<ConfigureResponse>, Status> {
        let ctx = self.context("Configure", &request);
        let request = request.into_inner();
        debug!(variables = request.variables.len(), "Configure called");

        let mut provider = self.provider.write().await;
        let result = run(&ctx, provider.configure(ctx.clone(), request)).await;
        if result.is_ok() {
            info!("Provider configured");
        }
        result
    }

    #[instrument(skip_all, name = "grpc.invoke")]
    async fn invoke(
        &self,
        request: Request<InvokeRequest>,
    ) -> Result<Response<InvokeResponse>, Status> {
        let ctx = self.context("Invoke", &request);
        let request = request.into_inner();
        debug!(tok = %request.tok, "Invoke called");

        let provider = self.provider.read().await;
        run(&ctx, provider.invoke(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.stream_invoke")]
    async fn stream_invoke(
        &self,
        request: Request<InvokeRequest>,
    ) -> Result<Response<Self::StreamInvokeStream>, Status> {
        let ctx = self.context("StreamInvoke", &request);
        let request = request.into_inner();
        debug!(tok = %request.tok, "StreamInvoke called");

        let provider = self.provider.read().await;
        run(&ctx, provider.stream_invoke(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.call")]
    async fn call(&self, request: Request<CallRequest>) -> Result<Response<CallResponse>, Status> {
        let ctx = self.context("Call", &request);
        let request = request.into_inner();
        debug!(tok = %request.tok, "Call called");

        let provider = self.provider.read().await;
        run(&ctx, provider.call(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.check")]
    async fn check(
        &self,
        request: Request<CheckRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let ctx = self.context("Check", &request);
        let request = request.into_inner();
        debug!(urn = %request.urn, "Check called");

        let provider = self.provider.read().await;
        run(&ctx, provider.check(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.diff")]
    async fn diff(&self, request: Request<DiffRequest>) -> Result<Response<DiffResponse>, Status> {
        let ctx = self.context("Diff", &request);
        let request = request.into_inner();
        debug!(urn = %request.urn, id = %request.id, "Diff called");

        let provider = self.provider.read().await;
        run(&ctx, provider.diff(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.create")]
    async fn create(
        &self,
        request: Request<CreateRequest>,
    ) -> Result<Response<CreateResponse>, Status> {
        let ctx = self.context("Create", &request);
        let request = request.into_inner();
        info!(urn = %request.urn, preview = request.preview, "Create called");

        let provider = self.provider.read().await;
        run(&ctx, provider.create(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.read")]
    async fn read(&self, request: Request<ReadRequest>) -> Result<Response<ReadResponse>, Status> {
        let ctx = self.context("Read", &request);
        let request = request.into_inner();
        debug!(urn = %request.urn, id = %request.id, "Read called");

        let provider = self.provider.read().await;
        run(&ctx, provider.read(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.update")]
    async fn update(
        &self,
        request: Request<UpdateRequest>,
    ) -> Result<Response<UpdateResponse>, Status> {
        let ctx = self.context("Update", &request);
        let request = request.into_inner();
        info!(urn = %request.urn, id = %request.id, preview = request.preview, "Update called");

        let provider = self.provider.read().await;
        run(&ctx, provider.update(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.delete")]
    async fn delete(&self, request: Request<DeleteRequest>) -> Result<Response<()>, Status> {
        let ctx = self.context("Delete", &request);
        let request = request.into_inner();
        info!(urn = %request.urn, id = %request.id, "Delete called");

        let provider = self.provider.read().await;
        run(&ctx, provider.delete(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.construct")]
    async fn construct(
        &self,
        request: Request<ConstructRequest>,
    ) -> Result<Response<ConstructResponse>, Status> {
        let ctx = self.context("Construct", &request);
        let request = request.into_inner();
        debug!(r#type = %request.r#type, name = %request.name, "Construct called");

        let provider = self.provider.read().await;
        run(&ctx, provider.construct(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.cancel")]
    async fn cancel(&self, request: Request<()>) -> Result<Response<()>, Status> {
        info!("Cancel called, signalling in-flight operations");
        self.cancellation.cancel();

        // The request context is cancelled at this point, so the provider is
        // called directly instead of through `run`.
        let ctx = self.context("Cancel", &request);
        let provider = self.provider.read().await;
        match provider.cancel(ctx).await {
            Ok(()) => Ok(Response::new(())),
            // Cancel is advisory; a provider without its own handling is fine.
            Err(e) if e.is_unimplemented() => Ok(Response::new(())),
            Err(e) => {
                error!(error = %e, "Cancel failed");
                Err(e.into())
            }
        }
    }

    #[instrument(skip_all, name = "grpc.get_plugin_info")]
    async fn get_plugin_info(&self, request: Request<()>) -> Result<Response<PluginInfo>, Status> {
        let ctx = self.context("GetPluginInfo", &request);
        let provider = self.provider.read().await;
        run(&ctx, provider.get_plugin_info(ctx.clone())).await
    }

    #[instrument(skip_all, name = "grpc.attach")]
    async fn attach(&self, request: Request<PluginAttach>) -> Result<Response<()>, Status> {
        let ctx = self.context("Attach", &request);
        let request = request.into_inner();
        info!(address = %request.address, "Attach called");

        let mut provider = self.provider.write().await;
        run(&ctx, provider.attach(ctx.clone(), request)).await
    }

    #[instrument(skip_all, name = "grpc.get_mapping")]
    async fn get_mapping(
        &self,
        request: Request<GetMappingRequest>,
    ) -> Result<Response<GetMappingResponse>, Status> {
        let ctx = self.context("GetMapping", &request);
        let provider = self.provider.read().await;
        run(&ctx, provider.get_mapping(ctx.clone(), request.into_inner())).await
    }

    #[instrument(skip_all, name = "grpc.get_mappings")]
    async fn get_mappings(
        &self,
        request: Request<GetMappingsRequest>,
    ) -> Result<Response<GetMappingsResponse>, Status> {
        let ctx = self.context("GetMappings", &request);
        let provider = self.provider.read().await;
        run(&ctx, provider.get_mappings(ctx.clone(), request.into_inner())).await
    }
}
