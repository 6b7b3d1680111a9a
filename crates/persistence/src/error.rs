//! Error types for the storage layer.
//!
//! Errors are organized by category (resource state, tenant naming,
//! validation, backend failures). Callers that only need to pick a response
//! (an HTTP status, a CLI exit code) use [`StorageError::kind`], which
//! collapses the hierarchy into the small [`ErrorKind`] taxonomy.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Tenant identification and partition naming errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested record was not found.
    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: String, id: String },

    /// A record with the given natural key already exists.
    #[error("{resource_type} already exists: {id}")]
    AlreadyExists { resource_type: String, id: String },

    /// A caller-generated identifier collided with an existing record.
    #[error("duplicate {resource_type} id: {id}")]
    DuplicateId { resource_type: String, id: String },

    /// The record may not be modified or removed.
    #[error("{resource_type} {id} is protected: {reason}")]
    Protected {
        resource_type: String,
        id: String,
        reason: String,
    },
}

/// Errors related to tenant identification.
#[derive(Error, Debug)]
pub enum TenantError {
    /// The identifier cannot be turned into a legal partition name.
    #[error("invalid tenant identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// The domain is already bound to another site.
    #[error("domain {domain} is already bound to site {owner}")]
    DomainClaimed { domain: String, owner: String },
}

/// Errors related to malformed input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A slug contains illegal characters or has an illegal length.
    #[error("invalid slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field has a malformed value.
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// A field exceeds its maximum length.
    #[error("{field} is too long: {actual} characters, maximum is {max}")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    /// Two sections of the same page share an id.
    #[error("page {page_slug} contains duplicate section id '{section_id}'")]
    DuplicateSectionId {
        page_slug: String,
        section_id: String,
    },

    /// The field cannot be changed through this operation.
    #[error("{field} cannot be changed: {message}")]
    ImmutableField { field: String, message: String },
}

/// Errors originating from the storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Coarse classification of a [`StorageError`].
///
/// This is the contract with outer layers: they map kinds to responses
/// without matching on the full error hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Tenant identifier cannot be sanitized into a partition name.
    InvalidIdentifier,
    /// Site, page or lead lookup miss on a write path.
    NotFound,
    /// Attempt to remove a protected record (the `home` page).
    ProtectedResource,
    /// Slug, domain, email or id collision.
    AlreadyExists,
    /// The backend could not be reached.
    BackendUnavailable,
    /// Malformed input.
    Validation,
    /// Anything else the backend reported.
    Internal,
}

impl ErrorKind {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::BackendUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidIdentifier => "invalid-identifier",
            ErrorKind::NotFound => "not-found",
            ErrorKind::ProtectedResource => "protected-resource",
            ErrorKind::AlreadyExists => "already-exists",
            ErrorKind::BackendUnavailable => "backend-unavailable",
            ErrorKind::Validation => "validation",
            ErrorKind::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

impl StorageError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Resource(err) => match err {
                ResourceError::NotFound { .. } => ErrorKind::NotFound,
                ResourceError::AlreadyExists { .. } | ResourceError::DuplicateId { .. } => {
                    ErrorKind::AlreadyExists
                }
                ResourceError::Protected { .. } => ErrorKind::ProtectedResource,
            },
            StorageError::Tenant(err) => match err {
                TenantError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
                TenantError::DomainClaimed { .. } => ErrorKind::AlreadyExists,
            },
            StorageError::Validation(_) => ErrorKind::Validation,
            StorageError::Backend(err) => match err {
                BackendError::Unavailable { .. }
                | BackendError::ConnectionFailed { .. }
                | BackendError::PoolExhausted { .. } => ErrorKind::BackendUnavailable,
                _ => ErrorKind::Internal,
            },
        }
    }

    pub(crate) fn not_found(resource_type: &str, id: impl Into<String>) -> Self {
        StorageError::Resource(ResourceError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.into(),
        })
    }

    pub(crate) fn already_exists(resource_type: &str, id: impl Into<String>) -> Self {
        StorageError::Resource(ResourceError::AlreadyExists {
            resource_type: resource_type.to_string(),
            id: id.into(),
        })
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal {
            backend_name: "file".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Backend(err.into())
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return StorageError::Backend(BackendError::Unavailable {
                backend_name: "postgres".to_string(),
                message: err.to_string(),
            });
        }
        if let Some(db) = err.as_db_error()
            && *db.code() == tokio_postgres::error::SqlState::UNIQUE_VIOLATION
        {
            return StorageError::Resource(ResourceError::AlreadyExists {
                resource_type: db.table().unwrap_or("record").to_string(),
                id: db.constraint().unwrap_or_default().to_string(),
            });
        }
        StorageError::Backend(BackendError::Internal {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for StorageError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StorageError::Backend(BackendError::Unavailable {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::not_found("page", "plumber/about");
        assert_eq!(err.to_string(), "page not found: plumber/about");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StorageError::not_found("site", "x").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StorageError::already_exists("site", "x").kind(),
            ErrorKind::AlreadyExists
        );

        let duplicate: StorageError = ResourceError::DuplicateId {
            resource_type: "lead".to_string(),
            id: "abc".to_string(),
        }
        .into();
        assert_eq!(duplicate.kind(), ErrorKind::AlreadyExists);

        let protected: StorageError = ResourceError::Protected {
            resource_type: "page".to_string(),
            id: "home".to_string(),
            reason: "every site needs a home page".to_string(),
        }
        .into();
        assert_eq!(protected.kind(), ErrorKind::ProtectedResource);

        let invalid: StorageError = TenantError::InvalidIdentifier {
            identifier: "---".to_string(),
            reason: "empty after sanitization".to_string(),
        }
        .into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidIdentifier);

        let claimed: StorageError = TenantError::DomainClaimed {
            domain: "example.com".to_string(),
            owner: "plumber".to_string(),
        }
        .into();
        assert_eq!(claimed.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_backend_kinds() {
        let unavailable: StorageError = BackendError::Unavailable {
            backend_name: "postgres".to_string(),
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(unavailable.kind(), ErrorKind::BackendUnavailable);
        assert!(unavailable.kind().is_retryable());

        let migration: StorageError = BackendError::MigrationError {
            message: "bad ddl".to_string(),
        }
        .into();
        assert_eq!(migration.kind(), ErrorKind::Internal);
        assert!(!migration.kind().is_retryable());
    }

    #[test]
    fn test_io_error_is_internal() {
        let err: StorageError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ProtectedResource.to_string(), "protected-resource");
        assert_eq!(ErrorKind::BackendUnavailable.to_string(), "backend-unavailable");
    }
}
