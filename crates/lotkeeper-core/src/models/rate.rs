//! Rate table and billing options models
//!
//! The rate table is an ordered list of cumulative-hour tiers; any duration
//! beyond the last tier is billed at the overflow rate from the billing
//! options. Both are externally configured and re-read on every computation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single rate tier
///
/// Covers the hours from the previous tier's threshold (exclusive) up to
/// `threshold_hours` (inclusive), each billed at `rate_per_hour`. A tier with
/// rate 0 represents free hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    /// Cumulative upper bound of this tier, in hours
    pub threshold_hours: i32,

    /// Hourly rate within this tier
    pub rate_per_hour: Decimal,
}

/// Billing options snapshot
///
/// Singleton configuration, externally mutable; the core always reads the
/// latest row before computing, never a cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingOptions {
    /// Minutes past the hour above which the hour counts as billable
    /// (exclusive: exactly-equal does not round up)
    pub rounding_threshold_minutes: i32,

    /// Grace period after a settlement during which no new obligation accrues
    pub exit_buffer_minutes: Decimal,

    /// Flat hourly rate beyond the last tier
    pub overflow_hour_rate: Decimal,
}

impl BillingOptions {
    /// Exit buffer expressed in milliseconds
    pub fn exit_buffer_ms(&self) -> i64 {
        (self.exit_buffer_minutes * Decimal::from(60_000))
            .trunc()
            .to_i64()
            .unwrap_or(0)
    }
}

impl Default for BillingOptions {
    /// Fallback used when no options row has been configured yet
    fn default() -> Self {
        Self {
            rounding_threshold_minutes: 30,
            exit_buffer_minutes: Decimal::from(15),
            overflow_hour_rate: Decimal::from(20),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_options() {
        let options = BillingOptions::default();
        assert_eq!(options.rounding_threshold_minutes, 30);
        assert_eq!(options.exit_buffer_minutes, dec!(15));
        assert_eq!(options.overflow_hour_rate, dec!(20));
    }

    #[test]
    fn test_exit_buffer_ms() {
        let options = BillingOptions {
            exit_buffer_minutes: dec!(15),
            ..Default::default()
        };
        assert_eq!(options.exit_buffer_ms(), 15 * 60 * 1000);

        // Fractional minutes are supported
        let options = BillingOptions {
            exit_buffer_minutes: dec!(0.5),
            ..Default::default()
        };
        assert_eq!(options.exit_buffer_ms(), 30 * 1000);
    }
}
