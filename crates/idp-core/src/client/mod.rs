//! Client Aggregate
//!
//! Relying parties / service providers and the cross-protocol
//! authorization gate applied to them.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod service;

pub use entity::{Client, ClientMetadata, ClientRecord, ClientType, ClientView, NewClient};
pub use policy::{AuthorizationGate, AuthorizationRequest};
pub use repository::ClientRepository;
pub use service::{ClientService, ClientUpdate};
