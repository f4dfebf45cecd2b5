//! Derived booking duration fields.

use serde::{Deserialize, Serialize};

/// Durations written to the booking rules row, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDurations {
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub total_duration_minutes: u32,
}

/// Computes the total slot length from a service duration and its buffer.
///
/// Negative or non-finite inputs count as zero. A missing buffer is zero.
pub fn derive_booking_durations(duration: f64, buffer: Option<f64>) -> BookingDurations {
    let duration_minutes = clamp_minutes(duration);
    let buffer_minutes = buffer.map_or(0, clamp_minutes);

    BookingDurations {
        duration_minutes,
        buffer_minutes,
        total_duration_minutes: duration_minutes.saturating_add(buffer_minutes),
    }
}

fn clamp_minutes(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        // Float to int casts saturate.
        value.trunc() as u32
    } else {
        0
    }
}
