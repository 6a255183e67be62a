//! Data models for the ticker backend.
//!
//! Serialized shapes match what the admin web client expects.

mod bridge;
mod ticker;
mod user;

pub use bridge::*;
pub use ticker::*;
pub use user::*;
