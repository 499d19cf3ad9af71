//! Domain Error Types
//!
//! Every failure the core signals is recoverable and caller-visible.
//! Protocol front-ends translate these into protocol-appropriate responses
//! using [`IdpError::error_code`].

use std::fmt;

use thiserror::Error;

use crate::client::entity::ClientType;

/// Sub-kind of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Input was empty or missing
    Required,
    /// Input did not match the expected grammar
    InvalidFormat,
    /// Input length or count outside the permitted bounds
    OutOfRange,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "required",
            Self::InvalidFormat => "invalid format",
            Self::OutOfRange => "out of range",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum IdpError {
    #[error("Validation error on {field} ({kind}): {message}")]
    Validation {
        kind: ValidationKind,
        field: String,
        message: String,
    },

    #[error("Conflict: {entity_type} with {field}={value} already exists")]
    Conflict {
        entity_type: String,
        field: String,
        value: String,
    },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("User account is inactive")]
    AccountInactive,

    #[error("Client not found: {client_id}")]
    ClientNotFound { client_id: String },

    #[error("Client {client_id} is registered for {actual}, not {expected}")]
    ClientTypeMismatch {
        client_id: String,
        expected: ClientType,
        actual: ClientType,
    },

    #[error("Client is inactive: {client_id}")]
    ClientInactive { client_id: String },

    #[error("Redirect URI not registered: {redirect_uri}")]
    InvalidRedirectUri { redirect_uri: String },

    #[error("Scope not allowed: {scope}")]
    InvalidScope { scope: String },

    #[error("Invalid client secret")]
    InvalidClientSecret,

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl IdpError {
    pub fn validation(
        kind: ValidationKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{} is required", field);
        Self::validation(ValidationKind::Required, field, message)
    }

    pub fn invalid_format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation(ValidationKind::InvalidFormat, field, message)
    }

    pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation(ValidationKind::OutOfRange, field, message)
    }

    pub fn conflict(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Conflict { .. } => "CONFLICT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::ClientNotFound { .. } => "CLIENT_NOT_FOUND",
            Self::ClientTypeMismatch { .. } => "CLIENT_TYPE_MISMATCH",
            Self::ClientInactive { .. } => "CLIENT_INACTIVE",
            Self::InvalidRedirectUri { .. } => "INVALID_REDIRECT_URI",
            Self::InvalidScope { .. } => "INVALID_SCOPE",
            Self::InvalidClientSecret => "INVALID_CLIENT_SECRET",
            Self::InvalidGrant { .. } => "INVALID_GRANT",
            Self::Database(_) | Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this is a client-policy failure raised by the authorization gate.
    pub fn is_client_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::ClientNotFound { .. }
                | Self::ClientTypeMismatch { .. }
                | Self::ClientInactive { .. }
                | Self::InvalidRedirectUri { .. }
                | Self::InvalidScope { .. }
                | Self::InvalidClientSecret
        )
    }
}

pub type Result<T> = std::result::Result<T, IdpError>;
