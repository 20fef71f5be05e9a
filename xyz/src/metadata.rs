//! Generator metadata shipped alongside the schema
//!
//! Maps each resource token to the REST endpoints backing its lifecycle and to
//! the property that receives an auto-generated name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    #[serde(default)]
    pub auto_name_map: BTreeMap<String, String>,
    #[serde(default)]
    pub crud_map: BTreeMap<String, CrudOperations>,
}

/// Endpoint paths for one resource; any of them may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudOperations {
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub put: Option<String>,
}

impl ProviderMetadata {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn operations(&self, token: &str) -> Option<&CrudOperations> {
        self.crud_map.get(token)
    }

    pub fn auto_name_property(&self, token: &str) -> Option<&str> {
        self.auto_name_map.get(token).map(String::as_str)
    }
}
