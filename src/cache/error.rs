//! Entity cache errors.

use crate::conversation::ServiceError;
use std::fmt;

/// Errors that can occur while looking up or caching an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheError {
    /// The specific error that occurred
    pub kind: CacheErrorKind,
}

/// Specific cache error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheErrorKind {
    /// The entity does not exist, by identifier or by name
    NotFound {
        /// Kind of entity, e.g. "assistant"
        entity: String,
        /// The identifier or name looked up
        key: String,
    },
    /// The storage backend failed
    Backend {
        /// Description of the failure
        reason: String,
    },
    /// A value could not be encoded or decoded
    Serialization {
        /// Description of the failure
        reason: String,
    },
    /// The loader's upstream service failed
    Upstream {
        /// The service error
        source: ServiceError,
    },
}

impl CacheError {
    /// Creates a new CacheError with the given kind.
    #[must_use]
    pub fn new(kind: CacheErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(CacheErrorKind::NotFound {
            entity: entity.into(),
            key: key.into(),
        })
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::new(CacheErrorKind::Backend {
            reason: reason.into(),
        })
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::new(CacheErrorKind::Serialization {
            reason: reason.into(),
        })
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(source: ServiceError) -> Self {
        Self::new(CacheErrorKind::Upstream { source })
    }

    /// Returns true if the entity does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, CacheErrorKind::NotFound { .. })
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CacheErrorKind::NotFound { entity, key } => {
                write!(f, "{} '{}' not found by identifier or name", entity, key)
            }
            CacheErrorKind::Backend { reason } => {
                write!(f, "cache backend error: {}", reason)
            }
            CacheErrorKind::Serialization { reason } => {
                write!(f, "cache serialization error: {}", reason)
            }
            CacheErrorKind::Upstream { source } => {
                write!(f, "entity lookup failed: {}", source)
            }
        }
    }
}

impl std::error::Error for CacheError {}

impl From<ServiceError> for CacheError {
    fn from(source: ServiceError) -> Self {
        Self::upstream(source)
    }
}
