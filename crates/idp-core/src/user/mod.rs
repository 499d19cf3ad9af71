//! User Aggregate
//!
//! Accounts that authenticate against the identity provider.

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{User, UserRecord, UserView};
pub use repository::UserRepository;
pub use service::UserService;
