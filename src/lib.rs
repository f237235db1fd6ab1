//! Client library for the Cloud Data Loss Prevention (DLP) v2 API
//!
//! Typed request and response messages, resource name helpers built on path
//! templates, and pagers that turn the list RPCs into pages, streams or plain
//! vectors.
//!
//! # Modules
//!
//! - [`gcp`] - Credentials, HTTP transport and [`DlpClient`]
//! - [`resource`] - [`PathTemplate`], [`ResourceNames`] and [`Pager`]
//! - [`dlp`] - Request and response messages
//! - [`error`] - [`DlpError`] and [`TemplateError`]
//! - [`config`] - Persisted settings for the `dlp` binary

pub mod config;
pub mod dlp;
pub mod error;
pub mod gcp;
pub mod resource;

pub use error::{DlpError, Result, TemplateError};
pub use gcp::client::{ClientConfig, ClientPager, DlpClient};
pub use gcp::http::{RestCall, Transport};
pub use resource::{Binding, Page, PageDescriptor, Pager, PathTemplate, ResourceNames};
