//! DLP jobs (storage inspection and risk analysis)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DlpJobType {
    InspectJob = 1,
    RiskAnalysisJob = 2,
    #[default]
    #[serde(other)]
    DlpJobTypeUnspecified = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    #[default]
    JobStateUnspecified,
    Pending,
    Running,
    Done,
    Canceled,
    Failed,
    Active,
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// No further state changes will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Canceled | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlpJob {
    pub name: String,
    #[serde(default, rename = "type")]
    pub job_type: Option<DlpJobType>,
    #[serde(default)]
    pub state: Option<JobState>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inspect_details: Option<Value>,
    #[serde(default)]
    pub risk_details: Option<Value>,
    #[serde(default)]
    pub job_trigger_name: Option<String>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDlpJobsRequest {
    #[serde(skip)]
    pub parent: String,
    /// e.g. `inspected_storage = cloud_storage AND state = done`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<DlpJobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

/// Starts either a storage inspection or a risk analysis job
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDlpJobRequest {
    #[serde(skip)]
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_job: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_job: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl CreateDlpJobRequest {
    /// Inspect a storage repository (`storageConfig`, `inspectConfig`, `actions`)
    pub fn inspect(parent: impl Into<String>, inspect_job: Value) -> Self {
        Self {
            parent: parent.into(),
            inspect_job: Some(inspect_job),
            ..Self::default()
        }
    }

    /// Analyze re-identification risk (`privacyMetric`, `sourceTable`, `actions`)
    pub fn risk(parent: impl Into<String>, risk_job: Value) -> Self {
        Self {
            parent: parent.into(),
            risk_job: Some(risk_job),
            ..Self::default()
        }
    }
}
