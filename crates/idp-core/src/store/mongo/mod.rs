//! MongoDB storage adapters.
//!
//! Uniqueness of normalised email and public client identifier is enforced
//! by unique indexes (see [`indexes::initialize_indexes`]); duplicate-key
//! write errors surface as `Conflict`.

pub mod authorization_code;
pub mod client;
pub mod indexes;
pub mod user;

pub use authorization_code::MongoAuthorizationCodeRepository;
pub use client::MongoClientRepository;
pub use indexes::initialize_indexes;
pub use user::MongoUserRepository;

use mongodb::error::{Error, ErrorKind, WriteFailure};

use crate::shared::error::IdpError;

const DUPLICATE_KEY: i32 = 11000;

/// Whether a MongoDB error is a duplicate key error (code 11000).
pub(crate) fn is_duplicate_key_error(error: &Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Map a write error to `Conflict` when it is a duplicate key, otherwise
/// to `Database`.
pub(crate) fn map_write_error(
    error: Error,
    entity_type: &str,
    field: &str,
    value: &str,
) -> IdpError {
    if is_duplicate_key_error(&error) {
        IdpError::conflict(entity_type, field, value)
    } else {
        IdpError::Database(error)
    }
}
