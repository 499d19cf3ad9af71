//! Identity Domain Core
//!
//! The user / client domain shared by the SAML, OIDC and OAuth2
//! front-ends:
//! - Email value object and the User and Client aggregates
//! - Storage-agnostic repository contracts with in-memory and MongoDB adapters
//! - Registration, authentication and password change (`AuthService`)
//! - The ordered client authorization gate (`AuthorizationGate`)
//! - Single-use authorization codes
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities, storage records and read models
//! - `repository` - Persistence contract
//! - `service` - Administrative operations

// Aggregates
pub mod client;
pub mod user;

// Authentication
pub mod auth;

// Shared infrastructure
pub mod shared;
pub mod store;

pub mod seed;

pub use shared::error::{IdpError, Result, ValidationKind};
pub use shared::email::Email;
pub use shared::entity::{Entity, EntityMeta};
pub use shared::pagination::{Page, PageRequest};
pub use shared::tsid::{EntityId, TsidGenerator};

pub use user::{User, UserRecord, UserRepository, UserService, UserView};
pub use client::{
    AuthorizationGate, AuthorizationRequest, Client, ClientMetadata, ClientRecord,
    ClientRepository, ClientService, ClientType, ClientUpdate, ClientView, NewClient,
};
pub use auth::{
    Argon2Config, Argon2PasswordHasher, AuthService, AuthServiceConfig, AuthorizationCode,
    AuthorizationCodeRepository, AuthorizationCodeService, PasswordHasher, PasswordPolicy,
};
pub use seed::{DevDataSeeder, SeedReport};
