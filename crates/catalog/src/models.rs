//! Rows written when a service is provisioned.

use chrono::{DateTime, Utc};
use common::{CategoryId, SalonId, ServiceId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::durations::derive_booking_durations;
use crate::pricing::derive_pricing;
use crate::validation::{BookingRuleAttributes, PricingAttributes, ServiceAttributes};

/// Audit columns shared by all three catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_by: UserId,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    /// Stamp for a freshly created row.
    pub fn created(by: UserId, at: DateTime<Utc>) -> Self {
        Self {
            created_by: by,
            updated_by: by,
            created_at: at,
            updated_at: at,
        }
    }
}

/// A service definition ready to insert. The store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub salon_id: SalonId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub is_active: bool,
    pub is_bookable: bool,
    pub is_featured: bool,
    pub audit: AuditStamp,
}

impl NewService {
    pub fn new(
        salon_id: SalonId,
        slug: impl Into<String>,
        attributes: &ServiceAttributes,
        audit: AuditStamp,
    ) -> Self {
        Self {
            salon_id,
            name: attributes.name.clone(),
            slug: slug.into(),
            description: attributes.description.clone(),
            category_id: attributes.category_id,
            is_active: attributes.is_active,
            is_bookable: attributes.is_bookable,
            is_featured: attributes.is_featured,
            audit,
        }
    }
}

/// Pricing row for a service, including derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServicePricing {
    pub service_id: ServiceId,
    pub base_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub current_price: Decimal,
    pub cost: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
    pub currency_code: String,
    pub is_taxable: bool,
    pub tax_rate: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    pub audit: AuditStamp,
}

impl NewServicePricing {
    /// Builds the pricing row, computing `current_price` and `profit_margin`.
    pub fn derive(service_id: ServiceId, attributes: &PricingAttributes, audit: AuditStamp) -> Self {
        let derived = derive_pricing(attributes.base_price, attributes.sale_price, attributes.cost);

        Self {
            service_id,
            base_price: attributes.base_price,
            sale_price: derived.sale_price,
            current_price: derived.current_price,
            cost: attributes.cost,
            profit_margin: derived.profit_margin,
            currency_code: attributes.currency_code.clone(),
            is_taxable: attributes.is_taxable,
            tax_rate: attributes.tax_rate,
            commission_rate: attributes.commission_rate,
            audit,
        }
    }
}

/// Booking rules row for a service, including the derived total duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceBookingRules {
    pub service_id: ServiceId,
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub total_duration_minutes: u32,
    pub min_advance_booking_hours: Option<u32>,
    pub max_advance_booking_days: Option<u32>,
    pub cancellation_notice_hours: Option<u32>,
    pub max_simultaneous_bookings: u32,
    pub requires_deposit: bool,
    pub deposit_amount: Option<Decimal>,
    pub audit: AuditStamp,
}

impl NewServiceBookingRules {
    /// Builds the booking rules row, computing `total_duration_minutes`.
    pub fn derive(
        service_id: ServiceId,
        attributes: &BookingRuleAttributes,
        audit: AuditStamp,
    ) -> Self {
        let durations = derive_booking_durations(
            f64::from(attributes.duration_minutes),
            Some(f64::from(attributes.buffer_minutes)),
        );

        Self {
            service_id,
            duration_minutes: durations.duration_minutes,
            buffer_minutes: durations.buffer_minutes,
            total_duration_minutes: durations.total_duration_minutes,
            min_advance_booking_hours: attributes.min_advance_booking_hours,
            max_advance_booking_days: attributes.max_advance_booking_days,
            cancellation_notice_hours: attributes.cancellation_notice_hours,
            max_simultaneous_bookings: attributes.max_simultaneous_bookings,
            requires_deposit: attributes.requires_deposit,
            deposit_amount: attributes.deposit_amount,
            audit,
        }
    }
}
