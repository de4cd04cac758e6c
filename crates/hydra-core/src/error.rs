//! Error types for hydration and origin calls.

use crate::id::EntityKind;

/// Result type for hydration operations
pub type HydrationResult<T> = Result<T, HydrationError>;

/// Errors returned by the origin services.
///
/// Origins own their transport; these variants are what the engine needs to
/// distinguish when it decides how to degrade.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OriginError {
    /// The origin could not be reached or timed out.
    #[error("origin transport error: {0}")]
    Transport(String),

    /// The origin authoritatively reports that the entity does not exist.
    #[error("origin reports {kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// The origin refused the request.
    #[error("origin rejected request: {0}")]
    Rejected(String),
}

impl OriginError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Errors that can occur while hydrating entities.
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    /// Identifier is zero or negative.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(i64),

    /// Variant is outside the closed set, or not applicable to the entity kind.
    #[error("invalid variant: {0}")]
    InvalidVariant(String),

    /// The entity does not exist at the origin.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// A dependency is temporarily unable to serve the request.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Origin call failed.
    #[error(transparent)]
    Origin(#[from] OriginError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error classes used for logging and for mapping to outer surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller error; no I/O was performed.
    InvalidArgument,
    NotFound,
    Unavailable,
    Internal,
}

impl HydrationError {
    #[must_use]
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentifier(_) | Self::InvalidVariant(_) => ErrorCategory::InvalidArgument,
            Self::NotFound { .. } | Self::Origin(OriginError::NotFound { .. }) => {
                ErrorCategory::NotFound
            }
            Self::Unavailable(_) | Self::Origin(OriginError::Transport(_)) => {
                ErrorCategory::Unavailable
            }
            Self::Origin(OriginError::Rejected(_)) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        self.category() == ErrorCategory::InvalidArgument
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}
