/// Errors returned by [`ReferenceStore`](crate::store::ReferenceStore).
///
/// The first five variants are domain failures an HTTP layer translates into
/// user-facing responses. [`StoreError::Database`] carries backend failures
/// unchanged; nothing in this crate retries.
///
/// # Examples
///
/// ```rust
/// use refdata_storage::error::{ErrorKind, StoreError};
///
/// let err = StoreError::NotFound {
///     entity: "dict_type",
///     id: "42".to_string(),
/// };
/// assert!(err.to_string().contains("dict_type"));
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced id or key does not exist.
    #[error("Store: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// A unique field already holds this value.
    #[error("Store: {entity} with {field}='{value}' already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// The requested lifecycle transition is not allowed from the current status.
    #[error("Store: cannot {action} {entity} {id} in status '{status}'")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: String,
        action: &'static str,
    },

    /// Input was rejected before reaching the database.
    #[error("Store: validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The record exists but is administratively disabled.
    #[error("Store: {entity} '{id}' is disabled")]
    Disabled { entity: &'static str, id: String },

    /// An insert succeeded but the row could not be read back.
    #[error("Store: insert of {entity} succeeded but the row could not be read back")]
    InsertReadback { entity: &'static str },

    /// A stored column holds a value outside its closed set of variants.
    #[error("Store: unexpected value '{value}' in column '{column}'")]
    UnexpectedValue { column: &'static str, value: String },

    /// Backend failure (connection lost, constraint other than uniqueness, ...).
    #[error("Store: database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Validation,
    Disabled,
    /// Any failure of the backing store itself.
    Store,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::InvalidState { .. } => ErrorKind::InvalidState,
            StoreError::Validation { .. } => ErrorKind::Validation,
            StoreError::Disabled { .. } => ErrorKind::Disabled,
            StoreError::InsertReadback { .. }
            | StoreError::UnexpectedValue { .. }
            | StoreError::Database(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience `Result` alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
