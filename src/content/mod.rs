//! Content module
//!
//! The document-serving core: key derivation, document resolution with
//! conditional validation, and full key enumeration.

pub mod enumerator;
pub mod key;
pub mod resolver;

pub use enumerator::{list_all_keys, EnumerationLimits};
pub use key::StorageKey;
pub use resolver::{resolve_document, Resolution};
