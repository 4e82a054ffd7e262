//! Data models for the catalog client.
//!
//! Field names follow the catalog API's camelCase JSON so payloads round-trip unchanged.

mod catalog;
mod comment;
mod kind;
mod page;
mod user;

pub use catalog::*;
pub use comment::*;
pub use kind::*;
pub use page::*;
pub use user::*;
