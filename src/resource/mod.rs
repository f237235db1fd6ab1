//! Resource names and pagination
//!
//! # Architecture
//!
//! - [`path_template`] - Renders and matches `/`-separated resource names
//! - [`names`] - One render/match pair per DLP resource family
//! - [`pager`] - Drives paginated list calls page by page or as a stream
//!
//! # Example
//!
//! ```ignore
//! use dlp_client::resource::ResourceNames;
//!
//! let names = ResourceNames::new()?;
//! let job = names.dlp_job_path("proj1", "job-42")?;
//! assert_eq!(job, "projects/proj1/dlpJobs/job-42");
//! assert_eq!(names.match_dlp_job_from_dlp_job_name(&job)?, "job-42");
//! ```

pub mod names;
pub mod pager;
pub mod path_template;

pub use names::{DlpJobName, ResourceNames, TemplateName};
pub use pager::{Page, PageDescriptor, Pager};
pub use path_template::{Binding, PathTemplate};
