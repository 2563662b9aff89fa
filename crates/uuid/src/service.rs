//! Internal implementation of resource identifiers.

use crate::{UuidError, UuidResult};
use std::collections::HashSet;
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Prefix of the same-document reference scheme used for `fullUrl` and references.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// Synthetic identifier of one resource inside a generated bundle.
///
/// Once constructed the contained UUID is known to be in canonical (hyphenated, lowercase)
/// form, so `to_string()` and [`ResourceId::urn`] are stable for the lifetime of the value.
///
/// # Construction
/// - [`ResourceId::new`] generates a fresh random identifier.
/// - [`ResourceId::parse`] validates an externally supplied identifier.
/// - [`ResourceId::from_urn`] reads the identifier back out of a `urn:uuid:` reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(Uuid);

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceId {
    /// Generates a new random (version 4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// Uppercase, braced or simple (unhyphenated) spellings are rejected rather than
    /// normalised, because a bundle entry's `fullUrl` must match its resource `id` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "resource id must be a lowercase hyphenated UUID, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid UUID '{}': {}", input, e)))
    }

    /// Parses the identifier out of a `urn:uuid:<id>` reference.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if the prefix is missing or the id is not canonical.
    pub fn from_urn(urn: &str) -> UuidResult<Self> {
        let id = urn.strip_prefix(URN_UUID_PREFIX).ok_or_else(|| {
            UuidError::InvalidInput(format!("reference is not a urn:uuid: '{}'", urn))
        })?;
        Self::parse(id)
    }

    /// Returns true if `input` is a lowercase hyphenated UUID.
    ///
    /// Purely syntactic: 36 bytes, hyphens at positions 8, 13, 18 and 23, and `0-9`/`a-f`
    /// everywhere else.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the `urn:uuid:<id>` form used for `fullUrl` and references.
    pub fn urn(&self) -> String {
        format!("{}{}", URN_UUID_PREFIX, self.0.hyphenated())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ResourceId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Hands out identifiers for a single mapping call.
///
/// Each bundle owns one allocator. Identifiers are remembered after issue and a collision
/// (astronomically unlikely with v4 UUIDs) simply draws again, so no value is ever issued twice.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: HashSet<Uuid>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh identifier that this allocator has never issued before.
    pub fn allocate(&mut self) -> ResourceId {
        loop {
            let candidate = ResourceId::new();
            if self.issued.insert(candidate.uuid()) {
                return candidate;
            }
        }
    }

    /// Issues a fresh identifier already rendered as `urn:uuid:<id>`.
    ///
    /// Used for business identifier values, which share the id namespace of the bundle.
    pub fn allocate_urn(&mut self) -> String {
        self.allocate().urn()
    }

    /// Returns true if `id` was issued by this allocator.
    pub fn has_issued(&self, id: &ResourceId) -> bool {
        self.issued.contains(&id.uuid())
    }

    /// Number of identifiers issued so far.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_canonical() {
        let id = ResourceId::new();
        assert!(ResourceId::is_canonical(&id.to_string()));
    }

    #[test]
    fn urn_round_trips_through_from_urn() {
        let id = ResourceId::new();
        let urn = id.urn();
        assert!(urn.starts_with("urn:uuid:"));
        let parsed = ResourceId::from_urn(&urn).expect("parse urn");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_non_canonical_forms() {
        let upper = "550E8400-E29B-41D4-A716-446655440000";
        let simple = "550e8400e29b41d4a716446655440000";
        let braced = "{550e8400-e29b-41d4-a716-446655440000}";
        for input in [upper, simple, braced, "", "not-a-uuid"] {
            let err = ResourceId::parse(input).expect_err("should reject");
            assert!(matches!(err, UuidError::InvalidInput(_)));
        }
        assert!(ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn from_urn_requires_prefix() {
        let err = ResourceId::from_urn("550e8400-e29b-41d4-a716-446655440000")
            .expect_err("missing prefix");
        assert!(matches!(err, UuidError::InvalidInput(msg) if msg.contains("urn:uuid")));
    }

    #[test]
    fn allocator_never_repeats() {
        let mut allocator = IdAllocator::new();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let id = allocator.allocate();
            assert!(seen.insert(id));
            assert!(allocator.has_issued(&id));
        }
        assert_eq!(allocator.issued_count(), 500);
        assert!(!allocator.has_issued(&ResourceId::new()));
    }

    #[test]
    fn serialises_as_plain_string() {
        let id = ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").expect("parse");
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
    }
}
