use crate::openapi::OpenApiError;
use pulplug::PulplugError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("unmarshaling the metadata bytes to json: {0}")]
    Metadata(serde_json::Error),

    #[error("unmarshaling pulumi schema into its package spec form: {0}")]
    Schema(serde_json::Error),

    #[error("loading the openapi document: {0}")]
    OpenApi(OpenApiError),

    #[error("the openapi document does not declare any servers")]
    MissingServer,

    #[error("building the http client: {0}")]
    HttpClient(reqwest::Error),

    #[error("api key is required")]
    MissingApiKey,
}

impl From<XyzError> for PulplugError {
    fn from(err: XyzError) -> Self {
        match err {
            XyzError::MissingApiKey => PulplugError::InvalidConfiguration(err.to_string()),
            other => PulplugError::Custom(other.to_string()),
        }
    }
}
