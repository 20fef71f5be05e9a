//! XYZ resource provider
//!
//! Serves the XYZ REST API, described by an embedded OpenAPI document, as a
//! resource provider plugin built on `pulplug`.

pub mod error;
pub mod http;
pub mod metadata;
pub mod openapi;
pub mod provider;

pub use error::XyzError;
pub use provider::{make_provider, XyzProvider};

pub const PROVIDER_NAME: &str = "xyz";
pub const PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package schema served through `GetSchema`
pub const SCHEMA: &[u8] = include_bytes!("../assets/schema.json");

/// OpenAPI document describing the XYZ REST API
pub const OPENAPI: &[u8] = include_bytes!("../assets/openapi.yml");

/// Generator metadata mapping resources to API endpoints
pub const METADATA: &[u8] = include_bytes!("../assets/metadata.json");
