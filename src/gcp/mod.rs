//! GCP API interaction module
//!
//! Authentication, the HTTP transport and the typed DLP client.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from Application Default Credentials or a static token
//! - [`http`] - [`http::RestCall`], the [`http::Transport`] trait and its reqwest implementation
//! - [`client`] - [`client::DlpClient`], one typed method per RPC
//!
//! # Example
//!
//! ```ignore
//! use dlp_client::gcp::client::{ClientConfig, DlpClient};
//! use dlp_client::dlp::ListDlpJobsRequest;
//!
//! async fn example() -> dlp_client::Result<()> {
//!     let client = DlpClient::new(ClientConfig::default()).await?;
//!     let parent = client.names().project_path("my-project")?;
//!     let jobs = client
//!         .list_dlp_jobs(&ListDlpJobsRequest { parent, ..Default::default() })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
