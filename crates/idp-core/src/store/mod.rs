//! Storage adapters for the repository contracts.

pub mod memory;
pub mod mongo;

pub use memory::{InMemoryAuthorizationCodeRepository, InMemoryClientRepository, InMemoryUserRepository};
pub use mongo::{
    initialize_indexes, MongoAuthorizationCodeRepository, MongoClientRepository,
    MongoUserRepository,
};
