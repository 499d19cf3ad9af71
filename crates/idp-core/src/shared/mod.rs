pub mod email;
pub mod entity;
pub mod error;
pub mod pagination;
pub mod token;
pub mod tsid;

pub use email::Email;
pub use entity::{Entity, EntityMeta};
pub use error::{IdpError, Result, ValidationKind};
pub use pagination::{Page, PageRequest};
pub use token::generate_token;
pub use tsid::{EntityId, TsidGenerator};
