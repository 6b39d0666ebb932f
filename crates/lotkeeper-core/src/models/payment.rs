//! Payment record model
//!
//! Payments are append-only. A record with `paid_at = None` is a pending
//! obligation: it is created with amount 0 and settled later by writing the
//! final amount and the settlement timestamp. Settlement never touches the
//! discount column.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment record entity
///
/// Lifecycle:
/// 1. Created pending (amount 0, paid_at None) at entry, or by an obligation
///    check after a prior payment's validity window expired
/// 2. Optionally annotated with a discount by the discount adapter
/// 3. Settled once: amount and paid_at are written together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub payment_id: i64,

    /// Owning session ID
    pub session_id: i64,

    /// Settled amount after discount (0 while pending)
    pub amount: Decimal,

    /// Discount applied against the next obligation
    pub discount: Decimal,

    /// Settlement timestamp (None = pending)
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Whether this record is an unsettled obligation
    pub fn is_pending(&self) -> bool {
        self.paid_at.is_none()
    }

    /// Whether this record has been settled
    pub fn is_settled(&self) -> bool {
        self.paid_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pending_vs_settled() {
        let mut payment = Payment {
            payment_id: 1,
            session_id: 1,
            amount: Decimal::ZERO,
            discount: dec!(5.00),
            paid_at: None,
        };

        assert!(payment.is_pending());
        assert!(!payment.is_settled());

        payment.amount = dec!(15.00);
        payment.paid_at = Some(Utc::now());
        assert!(payment.is_settled());
    }
}
