//! JSON document edge server
//!
//! Serves JSON documents from a key-value store with `ETag` validation,
//! plus a diagnostic endpoint listing every stored key.

pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;
