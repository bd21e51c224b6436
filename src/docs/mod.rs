//! Documentation module
//!
//! This module contains OpenAPI/Swagger documentation generation.
//! Only available when the `openapi` feature is enabled.

#[cfg(feature = "openapi")]
pub mod openapi;
