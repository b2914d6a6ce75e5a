//! Request handler module
//!
//! Responsible for request routing dispatch: the key listing endpoint and
//! document serving.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
