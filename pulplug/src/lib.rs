//! pulplug - resource provider plugin framework
//!
//! Implements the plugin side of the `pulumirpc.ResourceProvider` gRPC
//! protocol: a [`Provider`] trait with "unimplemented" defaults for every RPC,
//! the tonic service adapter, the port handshake and server lifecycle, the
//! engine host client, and the package schema model.

// Core modules
pub mod context;
pub mod error;
pub mod proto;
pub mod schema;

// Provider API
pub mod provider;

// Runtime
pub mod args;
pub mod grpc;
pub mod host;
pub mod logging;
pub mod server;

// Re-exports for convenience
pub use args::PluginArgs;
pub use context::{Cancellation, Context};
pub use error::{PulplugError, Result};
pub use grpc::ProviderService;
pub use host::HostClient;
pub use logging::{init_logging, try_init_logging};
pub use provider::{InvokeStream, Provider};
pub use schema::PackageSpec;
pub use server::{serve, serve_with_listener, ServerConfig};

