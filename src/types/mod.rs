pub mod aspect;
pub mod error;
pub mod request;

pub use aspect::AspectRatio;
pub use error::{
    ErrorBody, ErrorCategory, ErrorClassifier, ErrorCode, GenError, ProviderError, Result,
};
pub use request::{GenerationRequest, MediaKind};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type-safe wrapper for provider identifiers
///
/// Known ids are `openai`, `stability` and `fal`, but any string is accepted:
/// unrecognized ids surface as "not configured" at the adapter layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub const OPENAI: &'static str = "openai";
    pub const STABILITY: &'static str = "stability";
    pub const FAL: &'static str = "fal";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn openai() -> Self {
        Self::new(Self::OPENAI)
    }

    pub fn stability() -> Self {
        Self::new(Self::STABILITY)
    }

    pub fn fal() -> Self {
        Self::new(Self::FAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ProviderId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProviderId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_provider_id_constructors() {
        assert_eq!(ProviderId::openai().as_str(), "openai");
        assert_eq!(ProviderId::stability(), "stability");
        assert_eq!(ProviderId::from("xyz").to_string(), "xyz");
    }

    #[test]
    fn test_provider_id_serializes_transparently() {
        let json = serde_json::to_string(&ProviderId::fal()).unwrap();
        assert_eq!(json, "\"fal\"");
    }
}
