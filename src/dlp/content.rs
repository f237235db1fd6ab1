//! Content inspection, redaction and de-identification messages

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DlpError;

/// Name of a built-in or custom info type, e.g. `PHONE_NUMBER`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoType {
    pub name: String,
}

impl InfoType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely = 1,
    Unlikely = 2,
    Possible = 3,
    Likely = 4,
    VeryLikely = 5,
    /// Also what values unknown to this client decode to
    #[default]
    #[serde(other)]
    LikelihoodUnspecified = 0,
}

impl FromStr for Likelihood {
    type Err = DlpError;

    /// Case-insensitive; `-` and `_` are interchangeable (`very-likely`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "LIKELIHOOD_UNSPECIFIED" => Ok(Self::LikelihoodUnspecified),
            "VERY_UNLIKELY" => Ok(Self::VeryUnlikely),
            "UNLIKELY" => Ok(Self::Unlikely),
            "POSSIBLE" => Ok(Self::Possible),
            "LIKELY" => Ok(Self::Likely),
            "VERY_LIKELY" => Ok(Self::VeryLikely),
            _ => Err(DlpError::InvalidRequest(format!(
                "unknown likelihood {s:?}, expected one of very-unlikely, unlikely, possible, likely, very-likely"
            ))),
        }
    }
}

impl Likelihood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LikelihoodUnspecified => "LIKELIHOOD_UNSPECIFIED",
            Self::VeryUnlikely => "VERY_UNLIKELY",
            Self::Unlikely => "UNLIKELY",
            Self::Possible => "POSSIBLE",
            Self::Likely => "LIKELY",
            Self::VeryLikely => "VERY_LIKELY",
        }
    }
}

/// What to look for and how strictly
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info_types: Vec<InfoType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_likelihood: Option<Likelihood>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_quote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_info_types: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<Value>,
}

/// Raw bytes to inspect; `data` is base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
}

/// Text, table or bytes sent for inspection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_item: Option<ByteContentItem>,
}

impl ContentItem {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub info_type: Option<InfoType>,
    #[serde(default)]
    pub likelihood: Option<Likelihood>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResult {
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub findings_truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectContentRequest {
    /// `projects/{project}` or `organizations/{organization}`; sent in the path
    #[serde(skip)]
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_config: Option<InspectConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_template_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectContentResponse {
    #[serde(default)]
    pub result: InspectResult,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactImageRequest {
    #[serde(skip)]
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_config: Option<InspectConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_redaction_configs: Vec<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_findings: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_item: Option<ByteContentItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactImageResponse {
    /// base64 encoded image
    #[serde(default)]
    pub redacted_image: String,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub inspect_result: Option<InspectResult>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeidentifyContentRequest {
    #[serde(skip)]
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deidentify_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_config: Option<InspectConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deidentify_template_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeidentifyContentResponse {
    #[serde(default)]
    pub item: Option<ContentItem>,
    #[serde(default)]
    pub overview: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReidentifyContentRequest {
    #[serde(skip)]
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reidentify_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_config: Option<InspectConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reidentify_template_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReidentifyContentResponse {
    #[serde(default)]
    pub item: Option<ContentItem>,
    #[serde(default)]
    pub overview: Option<Value>,
}

/// A `deidentifyConfig` that masks every finding with `masking_character`
pub fn character_mask_config(masking_character: char) -> Value {
    serde_json::json!({
        "infoTypeTransformations": {
            "transformations": [{
                "primitiveTransformation": {
                    "characterMaskConfig": {
                        "maskingCharacter": masking_character.to_string()
                    }
                }
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inspect_request_body_omits_parent_and_empty_fields() {
        let request = InspectContentRequest {
            parent: "projects/p".to_string(),
            inspect_config: Some(InspectConfig {
                info_types: vec![InfoType::new("PHONE_NUMBER")],
                min_likelihood: Some(Likelihood::Possible),
                include_quote: true,
                ..InspectConfig::default()
            }),
            item: Some(ContentItem::text("call 215-512-1212")),
            inspect_template_name: None,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "inspectConfig": {
                    "infoTypes": [{ "name": "PHONE_NUMBER" }],
                    "minLikelihood": "POSSIBLE",
                    "includeQuote": true
                },
                "item": { "value": "call 215-512-1212" }
            })
        );
    }

    #[test]
    fn test_findings_decode() {
        let response: InspectContentResponse = serde_json::from_value(json!({
            "result": {
                "findings": [{
                    "quote": "215-512-1212",
                    "infoType": { "name": "PHONE_NUMBER" },
                    "likelihood": "VERY_LIKELY",
                    "createTime": "2024-01-15T10:30:00.000Z"
                }]
            }
        }))
        .unwrap();

        let finding = &response.result.findings[0];
        assert_eq!(finding.likelihood, Some(Likelihood::VeryLikely));
        assert_eq!(finding.info_type.as_ref().unwrap().name, "PHONE_NUMBER");
        assert!(finding.create_time.is_some());
        assert!(!response.result.findings_truncated);
    }

    #[test]
    fn test_likelihood_from_str() {
        assert_eq!("possible".parse::<Likelihood>().unwrap(), Likelihood::Possible);
        assert_eq!("very-likely".parse::<Likelihood>().unwrap(), Likelihood::VeryLikely);
        assert_eq!("VERY_UNLIKELY".parse::<Likelihood>().unwrap(), Likelihood::VeryUnlikely);
        assert_eq!(Likelihood::Unlikely.as_str(), "UNLIKELY");
    }

    #[test]
    fn test_likelihood_typo_rejected() {
        assert!(matches!(
            "likley".parse::<Likelihood>(),
            Err(DlpError::InvalidRequest(_))
        ));
        assert!("".parse::<Likelihood>().is_err());
    }

    #[test]
    fn test_unknown_likelihood_decodes_as_unspecified() {
        let finding: Finding = serde_json::from_value(json!({
            "quote": "x",
            "likelihood": "SOMEWHAT_LIKELY"
        }))
        .unwrap();
        assert_eq!(finding.likelihood, Some(Likelihood::LikelihoodUnspecified));
    }

    #[test]
    fn test_character_mask_config() {
        let config = character_mask_config('#');
        assert_eq!(
            config["infoTypeTransformations"]["transformations"][0]["primitiveTransformation"]
                ["characterMaskConfig"]["maskingCharacter"],
            "#"
        );
    }
}
