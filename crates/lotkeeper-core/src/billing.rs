//! Pure billing math
//!
//! Duration rounding and tiered fee calculation. Everything here is
//! deterministic and side-effect free; callers supply the current rate
//! table and options snapshot.

use crate::models::RateTier;
use rust_decimal::Decimal;

const HOUR_MS: i64 = 3_600_000;
const MINUTE_MS: i64 = 60_000;

/// Convert elapsed wall-clock time into a billable integer hour count.
///
/// A started hour counts only when its elapsed minutes exceed the rounding
/// threshold; exactly-equal does not round up.
pub fn rounded_hours(elapsed_ms: i64, threshold_minutes: i32) -> i64 {
    if elapsed_ms <= 0 {
        return 0;
    }

    let whole_hours = elapsed_ms / HOUR_MS;
    let remainder_ms = elapsed_ms % HOUR_MS;

    if remainder_ms > i64::from(threshold_minutes) * MINUTE_MS {
        whole_hours + 1
    } else {
        whole_hours
    }
}

/// Compute the total fee for `billable_hours` against the tier schedule.
///
/// Each tier covers `threshold_hours - previous threshold` hours at its own
/// rate. Tiers with rate 0 are free hours: they consume duration but
/// contribute nothing. Hours beyond the last tier are billed at
/// `overflow_rate`. An empty tier list bills everything at the overflow rate.
pub fn compute_fee(billable_hours: i64, tiers: &[RateTier], overflow_rate: Decimal) -> Decimal {
    let mut fee = Decimal::ZERO;
    let mut remaining = billable_hours;
    let mut previous_threshold = 0i64;

    for tier in tiers {
        if remaining <= 0 {
            break;
        }

        let duration = i64::from(tier.threshold_hours) - previous_threshold;
        previous_threshold = i64::from(tier.threshold_hours);

        if tier.rate_per_hour.is_zero() {
            remaining -= duration;
            continue;
        }

        let hours_at_tier = remaining.min(duration);
        fee += Decimal::from(hours_at_tier) * tier.rate_per_hour;
        remaining -= hours_at_tier;
    }

    if remaining > 0 {
        fee += Decimal::from(remaining) * overflow_rate;
    }

    fee
}

/// Base rate for the next one-hour obligation after `previously_paid_hours`.
///
/// The next hour is billed at the rate of the first tier whose threshold lies
/// beyond the hours already paid, or at the overflow rate once the schedule
/// is exhausted.
pub fn next_hour_rate(
    tiers: &[RateTier],
    previously_paid_hours: i64,
    overflow_rate: Decimal,
) -> Decimal {
    tiers
        .iter()
        .find(|tier| i64::from(tier.threshold_hours) > previously_paid_hours)
        .map(|tier| tier.rate_per_hour)
        .unwrap_or(overflow_rate)
}
