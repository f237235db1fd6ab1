//! Info type listing

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInfoTypesRequest {
    /// BCP-47 language code for localized names, e.g. `en-US`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    /// e.g. `supported_by=INSPECT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoTypeDescription {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub supported_by: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInfoTypesResponse {
    #[serde(default)]
    pub info_types: Vec<InfoTypeDescription>,
}
