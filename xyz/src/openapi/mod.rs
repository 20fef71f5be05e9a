//! OpenAPI document loading
//!
//! The document describing the XYZ REST API is embedded at build time, so a
//! document that does not parse or validate is a packaging mistake rather than
//! a runtime condition. [`get_openapi_spec`] treats it that way and panics;
//! [`load_openapi_spec`] returns the error for callers that want to report it.
//!
//! YAML and JSON documents are both accepted. Example values (`example`,
//! `examples`) are never validated: vendor documents routinely ship examples
//! that do not match their own schemas.

mod validate;

use openapiv3::OpenAPI;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error(transparent)]
    Parse(#[from] serde_yaml::Error),

    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Parse and validate an OpenAPI document.
pub fn load_openapi_spec(data: &[u8]) -> Result<OpenAPI, OpenApiError> {
    let raw: serde_yaml::Value = serde_yaml::from_slice(data)?;
    let doc: OpenAPI = serde_yaml::from_value(raw.clone())?;

    let issues = validate::validate(&doc, &raw);
    if !issues.is_empty() {
        return Err(OpenApiError::Invalid(issues));
    }

    debug!(
        title = %doc.info.title,
        version = %doc.info.version,
        paths = doc.paths.paths.len(),
        "Loaded OpenAPI document"
    );
    Ok(doc)
}

/// Parse and validate an OpenAPI document, panicking on failure.
///
/// # Panics
///
/// Panics with `Failed to load openapi.yml` when the bytes are not a document
/// and `OpenAPI spec failed validation` when the document is structurally
/// invalid.
pub fn get_openapi_spec(data: &[u8]) -> OpenAPI {
    match load_openapi_spec(data) {
        Ok(doc) => doc,
        Err(OpenApiError::Parse(e)) => panic!("Failed to load openapi.yml: {}", e),
        Err(e) => panic!("OpenAPI spec failed validation: {}", e),
    }
}
