//! DLP API messages
//!
//! Request and response types for the DLP v2 REST surface. Deeply nested
//! configuration blocks (transformations, storage configs, privacy metrics)
//! are carried as raw JSON; their semantics belong to the service.
//!
//! Request fields that travel in the URL path (`parent`, `name`) are not
//! serialized into the body or query.

pub mod content;
pub mod info_types;
pub mod jobs;
pub mod templates;

pub use content::*;
pub use info_types::*;
pub use jobs::*;
pub use templates::*;
