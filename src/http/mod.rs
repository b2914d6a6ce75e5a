//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality: validators and cache
//! directives, plus response builders. Decoupled from request routing.

pub mod cache;
pub mod response;

// Re-export commonly used types
pub use cache::{CachePolicy, ValidationToken};
pub use response::{
    build_304_response, build_405_response, build_document_response, build_error_response,
    build_json_response, build_options_response, ErrorBody,
};
