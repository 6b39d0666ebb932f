//! Payment reconciliation
//!
//! Pure logic that decides, for an open session, whether the elapsed time is
//! still covered by the latest settled payment's validity window, and what
//! the next one-hour obligation costs if it is not.
//!
//! Billing proceeds in discrete one-hour increments: after each settlement
//! the session is covered until `paid_at + exit buffer`, and the next
//! obligation is priced at the rate of the single next tier (or the overflow
//! rate past the schedule), minus whatever discount sits on the pending
//! payment. Total elapsed time is never re-billed.

use chrono::{DateTime, Duration, Utc};
use lotkeeper_core::{
    billing,
    models::{BillingOptions, Payment, RateTier},
};
use rust_decimal::Decimal;
use serde::Serialize;

const HOUR_MS: i64 = 3_600_000;

/// Outcome of reconciling a session's payment timeline at a point in time
///
/// `base_rate` and `amount_after_discount` always describe the next one-hour
/// obligation from `previously_paid_hours`, even while the session is still
/// covered; settlement charges that amount whenever it runs, and exit is
/// gated on `needs_new_payment && amount_after_discount > 0`.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// Whether the validity window of the last settled payment has lapsed
    /// (always true when nothing has been settled yet)
    pub needs_new_payment: bool,

    /// Rate of the next one-hour increment before discount
    pub base_rate: Decimal,

    /// Discount currently attached to the pending payment (0 if none)
    pub discount: Decimal,

    /// max(0, base_rate - discount)
    pub amount_after_discount: Decimal,

    /// Hours covered by settled payments, counted from entry time
    pub previously_paid_hours: i64,

    /// End of the last settled payment's validity window, if any
    pub valid_until: Option<DateTime<Utc>>,

    /// Where the next obligation's coverage starts: entry time before the
    /// first settlement, the last paid_at while covered, or the expired
    /// window's end once a new payment is due
    pub start_time: DateTime<Utc>,
}

/// Ceiling of a millisecond span in whole hours, clamped at zero
fn ceil_hours(span_ms: i64) -> i64 {
    if span_ms <= 0 {
        0
    } else {
        (span_ms + HOUR_MS - 1) / HOUR_MS
    }
}

/// Reconcile a session's payment state at `now`.
///
/// # Arguments
///
/// * `entry_time` - when the vehicle entered
/// * `last_settled` - the settled payment with the greatest paid_at, if any
/// * `pending` - the session's single pending payment, if any
/// * `tiers` - current rate tiers, ascending by threshold
/// * `options` - current billing options snapshot
/// * `now` - evaluation instant
pub fn reconcile(
    entry_time: DateTime<Utc>,
    last_settled: Option<&Payment>,
    pending: Option<&Payment>,
    tiers: &[RateTier],
    options: &BillingOptions,
    now: DateTime<Utc>,
) -> Reconciliation {
    let discount = pending.map(|p| p.discount).unwrap_or(Decimal::ZERO);

    let mut needs_new_payment = true;
    let mut previously_paid_hours = 0i64;
    let mut valid_until = None;
    let mut start_time = entry_time;

    if let Some(settled) = last_settled {
        // paid_at is always present on a settled payment
        if let Some(paid_at) = settled.paid_at {
            let window_end = paid_at + Duration::milliseconds(options.exit_buffer_ms());
            previously_paid_hours = ceil_hours((window_end - entry_time).num_milliseconds());
            valid_until = Some(window_end);

            // Exactly at the window end still counts as covered
            if now <= window_end {
                needs_new_payment = false;
                start_time = paid_at;
            } else {
                start_time = window_end;
            }
        }
    }

    let base_rate = billing::next_hour_rate(tiers, previously_paid_hours, options.overflow_hour_rate);
    let amount_after_discount = (base_rate - discount).max(Decimal::ZERO);

    Reconciliation {
        needs_new_payment,
        base_rate,
        discount,
        amount_after_discount,
        previously_paid_hours,
        valid_until,
        start_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tiers() -> Vec<RateTier> {
        vec![
            RateTier {
                threshold_hours: 1,
                rate_per_hour: dec!(20),
            },
            RateTier {
                threshold_hours: 3,
                rate_per_hour: dec!(15),
            },
            RateTier {
                threshold_hours: 24,
                rate_per_hour: dec!(10),
            },
        ]
    }

    fn options() -> BillingOptions {
        BillingOptions {
            rounding_threshold_minutes: 30,
            exit_buffer_minutes: dec!(15),
            overflow_hour_rate: dec!(5),
        }
    }

    fn settled(paid_at: DateTime<Utc>, amount: Decimal) -> Payment {
        Payment {
            payment_id: 1,
            session_id: 1,
            amount,
            discount: Decimal::ZERO,
            paid_at: Some(paid_at),
        }
    }

    fn pending(discount: Decimal) -> Payment {
        Payment {
            payment_id: 2,
            session_id: 1,
            amount: Decimal::ZERO,
            discount,
            paid_at: None,
        }
    }

    #[test]
    fn test_first_payment_always_required() {
        let entry = Utc::now();
        let rec = reconcile(
            entry,
            None,
            Some(&pending(Decimal::ZERO)),
            &tiers(),
            &options(),
            entry + Duration::minutes(5),
        );

        assert!(rec.needs_new_payment);
        assert_eq!(rec.previously_paid_hours, 0);
        assert_eq!(rec.base_rate, dec!(20));
        assert_eq!(rec.amount_after_discount, dec!(20));
        assert_eq!(rec.valid_until, None);
        assert_eq!(rec.start_time, entry);
    }

    #[test]
    fn test_buffer_keeps_session_covered() {
        let entry = Utc::now();
        let paid_at = entry + Duration::minutes(5);
        let last = settled(paid_at, dec!(20));

        // 10 minutes after settlement, inside the 15-minute buffer
        let rec = reconcile(
            entry,
            Some(&last),
            None,
            &tiers(),
            &options(),
            paid_at + Duration::minutes(10),
        );
        assert!(!rec.needs_new_payment);
        assert_eq!(rec.start_time, paid_at);
        assert_eq!(rec.valid_until, Some(paid_at + Duration::minutes(15)));

        // 20 minutes after settlement, past the buffer
        let rec = reconcile(
            entry,
            Some(&last),
            None,
            &tiers(),
            &options(),
            paid_at + Duration::minutes(20),
        );
        assert!(rec.needs_new_payment);
        assert_eq!(rec.start_time, paid_at + Duration::minutes(15));
    }

    #[test]
    fn test_exactly_at_window_end_is_covered() {
        let entry = Utc::now();
        let paid_at = entry + Duration::minutes(5);
        let last = settled(paid_at, dec!(20));
        let window_end = paid_at + Duration::minutes(15);

        let rec = reconcile(entry, Some(&last), None, &tiers(), &options(), window_end);
        assert!(!rec.needs_new_payment);

        let rec = reconcile(
            entry,
            Some(&last),
            None,
            &tiers(),
            &options(),
            window_end + Duration::milliseconds(1),
        );
        assert!(rec.needs_new_payment);
    }

    #[test]
    fn test_previously_paid_hours_ceiling() {
        let entry = Utc::now();
        // Settled 5 minutes after entry: window end is entry + 20min,
        // which rounds up to 1 covered hour
        let last = settled(entry + Duration::minutes(5), dec!(20));
        let rec = reconcile(
            entry,
            Some(&last),
            None,
            &tiers(),
            &options(),
            entry + Duration::hours(1),
        );
        assert_eq!(rec.previously_paid_hours, 1);
        // Second increment is priced from the second tier
        assert_eq!(rec.base_rate, dec!(15));
    }

    #[test]
    fn test_next_increment_uses_overflow_past_schedule() {
        let entry = Utc::now();
        // Settled late enough that the window covers 24+ hours
        let last = settled(entry + Duration::hours(25), dec!(10));
        let rec = reconcile(
            entry,
            Some(&last),
            None,
            &tiers(),
            &options(),
            entry + Duration::hours(26),
        );

        assert!(rec.needs_new_payment);
        assert_eq!(rec.previously_paid_hours, 26); // ceil(25h15m)
        assert_eq!(rec.base_rate, dec!(5));
    }

    #[test]
    fn test_discount_clamped_at_zero() {
        let entry = Utc::now();
        let rec = reconcile(
            entry,
            None,
            Some(&pending(dec!(50))),
            &tiers(),
            &options(),
            entry + Duration::minutes(40),
        );

        assert_eq!(rec.base_rate, dec!(20));
        assert_eq!(rec.discount, dec!(50));
        assert_eq!(rec.amount_after_discount, dec!(0));
    }

    #[test]
    fn test_discount_untouched_by_reconciliation() {
        let entry = Utc::now();
        let pending_payment = pending(dec!(5));

        // Repeated reconciliations never consume the discount
        for _ in 0..3 {
            let rec = reconcile(
                entry,
                None,
                Some(&pending_payment),
                &tiers(),
                &options(),
                entry + Duration::minutes(10),
            );
            assert_eq!(rec.discount, dec!(5));
            assert_eq!(rec.amount_after_discount, dec!(15));
        }
        assert_eq!(pending_payment.discount, dec!(5));
    }

    #[test]
    fn test_ceil_hours() {
        assert_eq!(ceil_hours(0), 0);
        assert_eq!(ceil_hours(-100), 0);
        assert_eq!(ceil_hours(1), 1);
        assert_eq!(ceil_hours(HOUR_MS), 1);
        assert_eq!(ceil_hours(HOUR_MS + 1), 2);
    }
}
