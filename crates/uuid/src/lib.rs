//! Synthetic resource identifiers.
//!
//! Every resource placed in a generated bundle is addressed by a random UUID. The bundle entry's
//! `fullUrl` and every internal reference use the `urn:uuid:<id>` form, which is a same-document
//! reference scheme and never a network-resolvable URL.
//!
//! ## Canonical form
//! - Hyphenated, lowercase: `8-4-4-4-12` hex groups, 36 characters
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! This is what `Uuid::new_v4().hyphenated().to_string()` produces, and it satisfies the FHIR
//! `id` pattern (`[A-Za-z0-9\-\.]{1,64}`).
//!
//! ## Uniqueness within a bundle
//! [`IdAllocator`] hands out identifiers for one mapping call and remembers every value it has
//! issued, so an identifier can never be assigned twice inside the same bundle.

mod service;

pub use service::{IdAllocator, ResourceId, Uuid, URN_UUID_PREFIX};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
