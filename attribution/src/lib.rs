//! Template-driven validation and normalization of ad click parameters.
//!
//! [`TemplateAccessor`] resolves the active session template from a
//! [`TemplateStore`] with a time-bounded cache and a built-in fallback, and
//! [`Normalizer`] validates raw query parameters against it and builds the
//! [`CanonicalPayload`] handed to the session service.

pub mod accessor;
pub mod config;
pub mod document_api;
pub mod metrics_defs;
pub mod normalize;
pub mod store;
pub mod template;
pub mod validators;

#[cfg(test)]
mod testutils;

pub use accessor::TemplateAccessor;
pub use normalize::{CanonicalPayload, Normalizer, RawParams, ValidationError};
pub use store::{StoreError, TemplateStore};
pub use template::Template;
