//! Schema validation for the three service payloads.
//!
//! Each payload is validated on its own and yields a normalized, typed value.
//! Validation order is service, pricing, booking rules; the first failing
//! rule wins and no further rules are checked.

use common::CategoryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::payload::Payload;

/// Currency used when the pricing payload does not name one.
pub const DEFAULT_CURRENCY_CODE: &str = "USD";

const MAX_NAME_CHARS: usize = 120;
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_DURATION_MINUTES: i64 = 480;
const MAX_BUFFER_MINUTES: i64 = 120;
const MONEY_SCALE: u32 = 2;
const MAX_MIN_ADVANCE_HOURS: i64 = 720;
const MAX_ADVANCE_DAYS: i64 = 365;
const MAX_CANCELLATION_NOTICE_HOURS: i64 = 168;
const MAX_SIMULTANEOUS_BOOKINGS: i64 = 100;

type Result<T> = std::result::Result<T, ValidationError>;

/// Validated service definition attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAttributes {
    pub name: String,
    pub description: Option<String>,
    /// Optional at the schema level; provisioning requires it separately.
    pub category_id: Option<CategoryId>,
    pub is_active: bool,
    pub is_bookable: bool,
    pub is_featured: bool,
}

impl ServiceAttributes {
    /// Validates a raw service payload.
    pub fn parse(raw: &Value) -> Result<Self> {
        let payload = Payload::new("Service", raw)?;

        let name = payload
            .text("name", "Service name")?
            .ok_or_else(|| ValidationError::field("name", "Service name is required"))?;
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::field(
                "name",
                format!("Service name must be {MAX_NAME_CHARS} characters or fewer"),
            ));
        }

        let description = payload.text("description", "Description")?;
        if let Some(description) = &description
            && description.chars().count() > MAX_DESCRIPTION_CHARS
        {
            return Err(ValidationError::field(
                "description",
                format!("Description must be {MAX_DESCRIPTION_CHARS} characters or fewer"),
            ));
        }

        let category_id = payload
            .uuid("category_id", "Invalid category ID")?
            .map(CategoryId::from_uuid);

        Ok(Self {
            name,
            description,
            category_id,
            is_active: payload.flag("is_active", "Active", true)?,
            is_bookable: payload.flag("is_bookable", "Bookable", true)?,
            is_featured: payload.flag("is_featured", "Featured", false)?,
        })
    }
}

/// Validated pricing attributes, before derived fields are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingAttributes {
    pub base_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub cost: Option<Decimal>,
    /// Three upper-case ASCII letters.
    pub currency_code: String,
    pub is_taxable: bool,
    pub tax_rate: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
}

impl PricingAttributes {
    /// Validates a raw pricing payload.
    pub fn parse(raw: &Value) -> Result<Self> {
        let payload = Payload::new("Pricing", raw)?;

        let base_price = money(&payload, "base_price", "Base price")?
            .ok_or_else(|| ValidationError::field("base_price", "Base price is required"))?;

        let sale_price = money(&payload, "sale_price", "Sale price")?;
        if let Some(sale) = sale_price
            && sale > base_price
        {
            return Err(ValidationError::field(
                "sale_price",
                "Sale price cannot exceed base price",
            ));
        }

        let cost = money(&payload, "cost", "Cost")?;

        let currency_code = match payload.text("currency_code", "Currency")? {
            None => DEFAULT_CURRENCY_CODE.to_string(),
            Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                code.to_ascii_uppercase()
            }
            Some(_) => {
                return Err(ValidationError::field(
                    "currency_code",
                    "Currency must be a 3-letter code (e.g., USD)",
                ));
            }
        };

        let is_taxable = payload.flag("is_taxable", "Taxable", true)?;
        let tax_rate = percentage(&payload, "tax_rate", "Tax rate")?;
        let commission_rate = percentage(&payload, "commission_rate", "Commission rate")?;

        Ok(Self {
            base_price,
            sale_price,
            cost,
            currency_code,
            is_taxable,
            tax_rate,
            commission_rate,
        })
    }
}

/// Validated booking rule attributes, before total duration is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRuleAttributes {
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub min_advance_booking_hours: Option<u32>,
    pub max_advance_booking_days: Option<u32>,
    pub cancellation_notice_hours: Option<u32>,
    pub max_simultaneous_bookings: u32,
    pub requires_deposit: bool,
    pub deposit_amount: Option<Decimal>,
}

impl BookingRuleAttributes {
    /// Validates a raw booking rules payload.
    pub fn parse(raw: &Value) -> Result<Self> {
        let payload = Payload::new("Booking rules", raw)?;

        let duration = payload
            .integer("duration_minutes", "Duration")?
            .ok_or_else(|| ValidationError::field("duration_minutes", "Duration is required"))?;
        if duration < 1 {
            return Err(ValidationError::field(
                "duration_minutes",
                "Duration must be at least 1 minute",
            ));
        }
        if duration > MAX_DURATION_MINUTES {
            return Err(ValidationError::field(
                "duration_minutes",
                "Service cannot exceed 8 hours",
            ));
        }

        let buffer = payload.integer("buffer_minutes", "Buffer")?.unwrap_or(0);
        if buffer < 0 {
            return Err(ValidationError::field(
                "buffer_minutes",
                "Buffer cannot be negative",
            ));
        }
        if buffer > MAX_BUFFER_MINUTES {
            return Err(ValidationError::field(
                "buffer_minutes",
                "Buffer cannot exceed 2 hours",
            ));
        }

        let min_hours = bounded(
            &payload,
            "min_advance_booking_hours",
            "Minimum advance booking",
            0,
            MAX_MIN_ADVANCE_HOURS,
            "hours",
        )?;
        let max_days = bounded(
            &payload,
            "max_advance_booking_days",
            "Maximum advance booking",
            0,
            MAX_ADVANCE_DAYS,
            "days",
        )?;
        if let (Some(min_hours), Some(max_days)) = (min_hours, max_days)
            && max_days * 24 < min_hours
        {
            return Err(ValidationError::field(
                "max_advance_booking_days",
                "Maximum advance booking window must be at least as long as the minimum advance notice",
            ));
        }

        let cancellation_notice = bounded(
            &payload,
            "cancellation_notice_hours",
            "Cancellation notice",
            0,
            MAX_CANCELLATION_NOTICE_HOURS,
            "hours",
        )?;
        let max_simultaneous = bounded(
            &payload,
            "max_simultaneous_bookings",
            "Simultaneous bookings",
            1,
            MAX_SIMULTANEOUS_BOOKINGS,
            "bookings",
        )?
        .unwrap_or(1);

        let requires_deposit = payload.flag("requires_deposit", "Requires deposit", false)?;
        let deposit_amount = money(&payload, "deposit_amount", "Deposit")?;
        if requires_deposit && deposit_amount.is_none_or(|amount| amount.is_zero()) {
            return Err(ValidationError::field(
                "deposit_amount",
                "Deposit amount is required when deposit is enabled",
            ));
        }

        Ok(Self {
            duration_minutes: to_u32("duration_minutes", duration)?,
            buffer_minutes: to_u32("buffer_minutes", buffer)?,
            min_advance_booking_hours: min_hours
                .map(|v| to_u32("min_advance_booking_hours", v))
                .transpose()?,
            max_advance_booking_days: max_days
                .map(|v| to_u32("max_advance_booking_days", v))
                .transpose()?,
            cancellation_notice_hours: cancellation_notice
                .map(|v| to_u32("cancellation_notice_hours", v))
                .transpose()?,
            max_simultaneous_bookings: to_u32("max_simultaneous_bookings", max_simultaneous)?,
            requires_deposit,
            deposit_amount,
        })
    }
}

/// All three payloads, validated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub service: ServiceAttributes,
    pub pricing: PricingAttributes,
    pub booking_rules: BookingRuleAttributes,
}

impl ServiceDraft {
    /// Validates service, pricing and booking rules in that order, then the
    /// rules that span payloads.
    pub fn parse(service: &Value, pricing: &Value, booking_rules: &Value) -> Result<Self> {
        let service = ServiceAttributes::parse(service)?;
        let pricing = PricingAttributes::parse(pricing)?;
        let booking_rules = BookingRuleAttributes::parse(booking_rules)?;

        if let Some(deposit) = booking_rules.deposit_amount
            && deposit > pricing.base_price
        {
            return Err(ValidationError::field(
                "deposit_amount",
                "Deposit amount cannot exceed base price",
            ));
        }

        Ok(Self {
            service,
            pricing,
            booking_rules,
        })
    }

    /// Returns the category, which provisioning treats as mandatory.
    pub fn require_category(&self) -> Result<CategoryId> {
        self.service
            .category_id
            .ok_or(ValidationError::CategoryRequired)
    }
}

/// Largest accepted amount for prices, costs and deposits: 99999.99.
fn max_money() -> Decimal {
    Decimal::new(9_999_999, MONEY_SCALE)
}

/// A non-negative amount of at most 99999.99 with at most two decimal places.
fn money(payload: &Payload<'_>, field: &'static str, label: &str) -> Result<Option<Decimal>> {
    let Some(value) = payload.decimal(field, label)? else {
        return Ok(None);
    };

    if value < Decimal::ZERO {
        return Err(ValidationError::field(
            field,
            format!("{label} cannot be negative"),
        ));
    }
    if value > max_money() {
        return Err(ValidationError::field(
            field,
            format!("{label} is too high"),
        ));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::field(
            field,
            format!("{label} must have at most 2 decimal places"),
        ));
    }
    Ok(Some(value))
}

fn percentage(payload: &Payload<'_>, field: &'static str, label: &str) -> Result<Option<Decimal>> {
    let value = payload.decimal(field, label)?;
    if let Some(v) = value
        && (v < Decimal::ZERO || v > Decimal::ONE_HUNDRED)
    {
        return Err(ValidationError::field(
            field,
            format!("{label} must be between 0 and 100"),
        ));
    }
    Ok(value)
}

fn bounded(
    payload: &Payload<'_>,
    field: &'static str,
    label: &str,
    min: i64,
    max: i64,
    unit: &str,
) -> Result<Option<i64>> {
    let value = payload.integer(field, label)?;
    if let Some(v) = value
        && !(min..=max).contains(&v)
    {
        return Err(ValidationError::field(
            field,
            format!("{label} must be between {min} and {max} {unit}"),
        ));
    }
    Ok(value)
}

fn to_u32(field: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| ValidationError::field(field, "Value is out of range"))
}
