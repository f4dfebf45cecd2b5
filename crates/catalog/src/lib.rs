//! Catalog layer for salon services.
//!
//! This crate holds everything about a sellable service that does not touch
//! a data store:
//! - Schema validation of the three raw payloads (service, pricing, booking rules)
//! - Pure derivation of computed pricing and duration fields
//! - Slug base computation
//! - Row models written by the provisioning saga

pub mod durations;
pub mod error;
pub mod models;
mod payload;
pub mod pricing;
pub mod slug;
pub mod validation;

pub use durations::{BookingDurations, derive_booking_durations};
pub use error::ValidationError;
pub use models::{AuditStamp, NewService, NewServiceBookingRules, NewServicePricing};
pub use pricing::{DerivedPricing, derive_pricing};
pub use slug::{FALLBACK_SLUG, MAX_SLUG_LENGTH, next_available_slug, slugify};
pub use validation::{
    BookingRuleAttributes, DEFAULT_CURRENCY_CODE, PricingAttributes, ServiceAttributes,
    ServiceDraft,
};
