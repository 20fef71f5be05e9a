//! Protocol buffer types for the pulumirpc plugin protocol
//!
//! This module includes the code generated by tonic_build from the files under
//! `proto/pulumi/`. All three files share the `pulumirpc` package, so the
//! messages, the `ResourceProvider` service and the `Engine` service all land
//! in a single generated file.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pulplug::proto;
//!
//! let request = proto::ConfigureRequest::default();
//! let response = proto::ConfigureResponse {
//!     accept_secrets: true,
//!     ..Default::default()
//! };
//! ```
//!
//! # Type Naming
//!
//! - `google.protobuf.Struct` fields become `Option<prost_types::Struct>`
//! - `google.protobuf.Empty` becomes `()`
//! - Fields named after Rust keywords are raw identifiers (`r#type`, `r#return`)
//! - Nested messages and enums live in snake_case modules
//!   (e.g. `property_diff::Kind`, `diff_response::DiffChanges`)
//! - The gRPC service traits are `resource_provider_server::ResourceProvider`
//!   and `engine_server::Engine`; clients are `ResourceProviderClient` and
//!   `EngineClient`

include!(concat!(env!("OUT_DIR"), "/pulumirpc.rs"));

pub use engine_client::EngineClient;
pub use resource_provider_client::ResourceProviderClient;
pub use resource_provider_server::ResourceProviderServer;
