//! Identifier types shared by the salon catalog crates.

mod types;

pub use types::{CategoryId, SalonId, ServiceId, UserId};
