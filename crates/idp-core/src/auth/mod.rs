//! Authentication
//!
//! Credential hashing, the registration / login / password-change service
//! and single-use authorization codes.

pub mod auth_service;
pub mod authorization_code;
pub mod authorization_code_repository;
pub mod authorization_code_service;
pub mod password_service;

pub use auth_service::{AuthService, AuthServiceConfig};
pub use authorization_code::AuthorizationCode;
pub use authorization_code_repository::AuthorizationCodeRepository;
pub use authorization_code_service::AuthorizationCodeService;
pub use password_service::{Argon2Config, Argon2PasswordHasher, PasswordHasher, PasswordPolicy};
