//! DLP Client
//!
//! One typed method per RPC. List methods come in four flavours:
//! `list_x` (all items), `list_x_stream` (lazy stream of items),
//! `list_x_page` (exactly one page) and `list_x_pager` (the [`Pager`] itself).

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::auth::GcpCredentials;
use super::http::{encode_resource_name, GcpHttpClient, RestCall, Transport};
use crate::dlp::*;
use crate::error::{DlpError, Result};
use crate::resource::pager::{
    Page, PageDescriptor, Pager, LIST_DEIDENTIFY_TEMPLATES, LIST_DLP_JOBS, LIST_INSPECT_TEMPLATES,
};
use crate::resource::ResourceNames;

/// Default service endpoint
pub const DEFAULT_ENDPOINT: &str = "https://dlp.googleapis.com";

/// Page-fetching function handed to a [`Pager`] by the client
pub type BoxedPageCall<'a> = Box<dyn FnMut(Value) -> BoxFuture<'a, Result<Value>> + Send + 'a>;

/// Pager returned by the `list_x_pager` methods
pub type ClientPager<'a, T> = Pager<T, BoxedPageCall<'a>>;

/// Client-wide settings, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Deadline for each unary call and each page fetch
    pub timeout: Option<Duration>,
    /// Page size used when a list request leaves it unset
    pub page_size: Option<i32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: format!("dlp-client/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
            page_size: None,
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Check the endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| DlpError::InvalidRequest(format!("invalid endpoint {:?}: {e}", self.endpoint)))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(DlpError::InvalidRequest(format!(
                "unsupported endpoint scheme `{other}`"
            ))),
        }
    }
}

/// Client for the DLP service
pub struct DlpClient<T = GcpHttpClient> {
    transport: Arc<T>,
    config: Arc<ClientConfig>,
    names: Arc<ResourceNames>,
}

impl<T> Clone for DlpClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
            names: self.names.clone(),
        }
    }
}

impl DlpClient<GcpHttpClient> {
    /// Create a client authenticated with Application Default Credentials
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let credentials = GcpCredentials::new().await?;
        Self::with_credentials(config, credentials)
    }

    /// Create a client that sends a fixed access token
    pub fn with_access_token(config: ClientConfig, token: impl Into<String>) -> Result<Self> {
        Self::with_credentials(config, GcpCredentials::from_access_token(token))
    }

    pub fn with_credentials(config: ClientConfig, credentials: GcpCredentials) -> Result<Self> {
        config.validate()?;
        let http = GcpHttpClient::new(credentials, &config.endpoint, &config.user_agent)?;
        Self::from_transport(config, http)
    }
}

impl<T: Transport> DlpClient<T> {
    /// Create a client over any transport
    pub fn from_transport(config: ClientConfig, transport: T) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            names: Arc::new(ResourceNames::new()?),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resource name helpers
    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    async fn send(&self, call: RestCall) -> Result<Value> {
        let fut = self.transport.unary(call);
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| DlpError::Timeout(limit))?,
            None => fut.await,
        }
    }

    async fn call<R: DeserializeOwned>(&self, call: RestCall) -> Result<R> {
        let value = self.send(call).await?;
        let value = if value.is_null() {
            Value::Object(Default::default())
        } else {
            value
        };
        Ok(serde_json::from_value(value)?)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: String, body: &B) -> Result<R> {
        self.call(RestCall::post(path, serde_json::to_value(body)?))
            .await
    }

    fn list_call(&self, path: String) -> BoxedPageCall<'_> {
        let transport = &*self.transport;
        Box::new(move |query: Value| transport.unary(RestCall::get(path.clone(), query)).boxed())
    }

    fn pager<I, Q>(
        &self,
        path: String,
        descriptor: &'static PageDescriptor,
        request: &Q,
    ) -> Result<ClientPager<'_, I>>
    where
        I: DeserializeOwned,
        Q: Serialize,
    {
        let mut query = serde_json::to_value(request)?;
        if let (Some(size), Value::Object(map)) = (self.config.page_size, &mut query) {
            map.entry("pageSize").or_insert_with(|| Value::from(size));
        }

        Ok(Pager::new(self.list_call(path), descriptor, query).with_page_timeout(self.config.timeout))
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Find sensitive info in a content item
    pub async fn inspect_content(
        &self,
        request: &InspectContentRequest,
    ) -> Result<InspectContentResponse> {
        let parent = required("parent", &request.parent)?;
        self.post(format!("v2/{}/content:inspect", parent), request)
            .await
    }

    /// Redact sensitive info from an image
    pub async fn redact_image(&self, request: &RedactImageRequest) -> Result<RedactImageResponse> {
        let parent = required("parent", &request.parent)?;
        self.post(format!("v2/{}/image:redact", parent), request)
            .await
    }

    /// De-identify a content item
    pub async fn deidentify_content(
        &self,
        request: &DeidentifyContentRequest,
    ) -> Result<DeidentifyContentResponse> {
        let parent = required("parent", &request.parent)?;
        self.post(format!("v2/{}/content:deidentify", parent), request)
            .await
    }

    /// Reverse a reversible de-identification
    pub async fn reidentify_content(
        &self,
        request: &ReidentifyContentRequest,
    ) -> Result<ReidentifyContentResponse> {
        let parent = required("parent", &request.parent)?;
        self.post(format!("v2/{}/content:reidentify", parent), request)
            .await
    }

    /// Built-in info types the service can detect
    pub async fn list_info_types(
        &self,
        request: &ListInfoTypesRequest,
    ) -> Result<ListInfoTypesResponse> {
        self.call(RestCall::get("v2/infoTypes", serde_json::to_value(request)?))
            .await
    }

    // =========================================================================
    // Inspect templates
    // =========================================================================

    pub async fn create_inspect_template(
        &self,
        request: &CreateInspectTemplateRequest,
    ) -> Result<InspectTemplate> {
        let parent = required("parent", &request.parent)?;
        tracing::info!("create_inspect_template: parent={}", request.parent);
        self.post(format!("v2/{}/inspectTemplates", parent), request)
            .await
    }

    pub async fn update_inspect_template(
        &self,
        request: &UpdateInspectTemplateRequest,
    ) -> Result<InspectTemplate> {
        let name = required("name", &request.name)?;
        tracing::info!("update_inspect_template: name={}", request.name);
        self.call(RestCall::patch(
            format!("v2/{}", name),
            serde_json::to_value(request)?,
        ))
        .await
    }

    pub async fn get_inspect_template(&self, name: &str) -> Result<InspectTemplate> {
        let name = required("name", name)?;
        self.call(RestCall::get(format!("v2/{}", name), Value::Null))
            .await
    }

    pub async fn delete_inspect_template(&self, name: &str) -> Result<()> {
        let encoded = required("name", name)?;
        tracing::info!("delete_inspect_template: name={}", name);
        self.send(RestCall::delete(format!("v2/{}", encoded)))
            .await
            .map(|_| ())
    }

    pub fn list_inspect_templates_pager(
        &self,
        request: &ListInspectTemplatesRequest,
    ) -> Result<ClientPager<'_, InspectTemplate>> {
        let parent = required("parent", &request.parent)?;
        self.pager(
            format!("v2/{}/inspectTemplates", parent),
            &LIST_INSPECT_TEMPLATES,
            request,
        )
    }

    pub async fn list_inspect_templates(
        &self,
        request: &ListInspectTemplatesRequest,
    ) -> Result<Vec<InspectTemplate>> {
        self.list_inspect_templates_pager(request)?
            .collect_all()
            .await
    }

    pub fn list_inspect_templates_stream(
        &self,
        request: &ListInspectTemplatesRequest,
    ) -> impl Stream<Item = Result<InspectTemplate>> + '_ {
        item_stream(self.list_inspect_templates_pager(request))
    }

    pub async fn list_inspect_templates_page(
        &self,
        request: &ListInspectTemplatesRequest,
    ) -> Result<Page<InspectTemplate>> {
        first_page(self.list_inspect_templates_pager(request)).await
    }

    // =========================================================================
    // De-identify templates
    // =========================================================================

    pub async fn create_deidentify_template(
        &self,
        request: &CreateDeidentifyTemplateRequest,
    ) -> Result<DeidentifyTemplate> {
        let parent = required("parent", &request.parent)?;
        tracing::info!("create_deidentify_template: parent={}", request.parent);
        self.post(format!("v2/{}/deidentifyTemplates", parent), request)
            .await
    }

    pub async fn update_deidentify_template(
        &self,
        request: &UpdateDeidentifyTemplateRequest,
    ) -> Result<DeidentifyTemplate> {
        let name = required("name", &request.name)?;
        tracing::info!("update_deidentify_template: name={}", request.name);
        self.call(RestCall::patch(
            format!("v2/{}", name),
            serde_json::to_value(request)?,
        ))
        .await
    }

    pub async fn get_deidentify_template(&self, name: &str) -> Result<DeidentifyTemplate> {
        let name = required("name", name)?;
        self.call(RestCall::get(format!("v2/{}", name), Value::Null))
            .await
    }

    pub async fn delete_deidentify_template(&self, name: &str) -> Result<()> {
        let encoded = required("name", name)?;
        tracing::info!("delete_deidentify_template: name={}", name);
        self.send(RestCall::delete(format!("v2/{}", encoded)))
            .await
            .map(|_| ())
    }

    pub fn list_deidentify_templates_pager(
        &self,
        request: &ListDeidentifyTemplatesRequest,
    ) -> Result<ClientPager<'_, DeidentifyTemplate>> {
        let parent = required("parent", &request.parent)?;
        self.pager(
            format!("v2/{}/deidentifyTemplates", parent),
            &LIST_DEIDENTIFY_TEMPLATES,
            request,
        )
    }

    pub async fn list_deidentify_templates(
        &self,
        request: &ListDeidentifyTemplatesRequest,
    ) -> Result<Vec<DeidentifyTemplate>> {
        self.list_deidentify_templates_pager(request)?
            .collect_all()
            .await
    }

    pub fn list_deidentify_templates_stream(
        &self,
        request: &ListDeidentifyTemplatesRequest,
    ) -> impl Stream<Item = Result<DeidentifyTemplate>> + '_ {
        item_stream(self.list_deidentify_templates_pager(request))
    }

    pub async fn list_deidentify_templates_page(
        &self,
        request: &ListDeidentifyTemplatesRequest,
    ) -> Result<Page<DeidentifyTemplate>> {
        first_page(self.list_deidentify_templates_pager(request)).await
    }

    // =========================================================================
    // DLP jobs
    // =========================================================================

    /// Start an inspection or risk analysis job
    pub async fn create_dlp_job(&self, request: &CreateDlpJobRequest) -> Result<DlpJob> {
        let parent = required("parent", &request.parent)?;
        if request.inspect_job.is_some() == request.risk_job.is_some() {
            return Err(DlpError::InvalidRequest(
                "exactly one of inspect_job or risk_job must be set".to_string(),
            ));
        }
        tracing::info!("create_dlp_job: parent={}", request.parent);
        self.post(format!("v2/{}/dlpJobs", parent), request).await
    }

    /// Inspect a storage repository for sensitive info
    pub async fn inspect_data_source(
        &self,
        parent: &str,
        inspect_job: Value,
    ) -> Result<DlpJob> {
        self.create_dlp_job(&CreateDlpJobRequest::inspect(parent, inspect_job))
            .await
    }

    /// Compute re-identification risk metrics for a table
    pub async fn analyze_data_source_risk(&self, parent: &str, risk_job: Value) -> Result<DlpJob> {
        self.create_dlp_job(&CreateDlpJobRequest::risk(parent, risk_job))
            .await
    }

    pub fn list_dlp_jobs_pager(
        &self,
        request: &ListDlpJobsRequest,
    ) -> Result<ClientPager<'_, DlpJob>> {
        let parent = required("parent", &request.parent)?;
        self.pager(format!("v2/{}/dlpJobs", parent), &LIST_DLP_JOBS, request)
    }

    pub async fn list_dlp_jobs(&self, request: &ListDlpJobsRequest) -> Result<Vec<DlpJob>> {
        self.list_dlp_jobs_pager(request)?.collect_all().await
    }

    pub fn list_dlp_jobs_stream(
        &self,
        request: &ListDlpJobsRequest,
    ) -> impl Stream<Item = Result<DlpJob>> + '_ {
        item_stream(self.list_dlp_jobs_pager(request))
    }

    pub async fn list_dlp_jobs_page(&self, request: &ListDlpJobsRequest) -> Result<Page<DlpJob>> {
        first_page(self.list_dlp_jobs_pager(request)).await
    }

    pub async fn get_dlp_job(&self, name: &str) -> Result<DlpJob> {
        let name = required("name", name)?;
        self.call(RestCall::get(format!("v2/{}", name), Value::Null))
            .await
    }

    pub async fn delete_dlp_job(&self, name: &str) -> Result<()> {
        let encoded = required("name", name)?;
        tracing::info!("delete_dlp_job: name={}", name);
        self.send(RestCall::delete(format!("v2/{}", encoded)))
            .await
            .map(|_| ())
    }

    pub async fn cancel_dlp_job(&self, name: &str) -> Result<()> {
        let encoded = required("name", name)?;
        tracing::info!("cancel_dlp_job: name={}", name);
        self.send(RestCall::post(
            format!("v2/{}:cancel", encoded),
            Value::Object(Default::default()),
        ))
        .await
        .map(|_| ())
    }
}

async fn first_page<I: DeserializeOwned>(pager: Result<ClientPager<'_, I>>) -> Result<Page<I>> {
    Ok(pager?.next_page().await?.unwrap_or_default())
}

fn item_stream<'a, I>(pager: Result<ClientPager<'a, I>>) -> impl Stream<Item = Result<I>> + 'a
where
    I: DeserializeOwned + 'a,
{
    match pager {
        Ok(pager) => pager.into_stream().left_stream(),
        Err(e) => stream::once(async move { Err(e) }).right_stream(),
    }
}

/// Reject empty path fields and encode them for the URL
fn required(field: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(DlpError::InvalidRequest(format!("`{field}` is required")));
    }
    Ok(encode_resource_name(value))
}
