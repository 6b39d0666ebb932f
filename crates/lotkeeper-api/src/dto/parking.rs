//! Parking DTOs
//!
//! Request and response types for the session lifecycle endpoints.

use chrono::{DateTime, Utc};
use lotkeeper_core::models::Payment;
use lotkeeper_services::{
    EntryReceipt, ExitReceipt, ObligationStatus, PaymentHistory, SettlementReceipt,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Vehicle entry request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    /// License plate of the entering vehicle
    #[validate(length(min = 1, max = 20, message = "License plate is required"))]
    pub license_plate: String,

    /// Path to the captured entry image, if any
    pub image_path: Option<String>,
}

/// Vehicle entry response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub vehicle_id: i64,
    pub session_id: i64,
    pub payment_id: i64,
}

impl From<EntryReceipt> for EntryResponse {
    fn from(r: EntryReceipt) -> Self {
        Self {
            vehicle_id: r.vehicle_id,
            session_id: r.session_id,
            payment_id: r.payment_id,
        }
    }
}

/// A settled or pending payment row
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub payment_id: i64,
    pub amount: Decimal,
    pub discount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.payment_id,
            amount: p.amount,
            discount: p.discount,
            paid_at: p.paid_at,
        }
    }
}

/// The last settled payment, as reported by an obligation check
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPaymentDto {
    pub payment_id: i64,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Obligation check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationResponse {
    pub license_plate: String,
    pub entry_time: DateTime<Utc>,
    pub checked_at: DateTime<Utc>,
    pub needs_new_payment: bool,
    pub base_rate: Decimal,
    pub discount: Decimal,
    pub amount_after_discount: Decimal,
    pub previously_paid_hours: i64,
    pub valid_until: Option<DateTime<Utc>>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment: Option<LastPaymentDto>,
}

impl From<ObligationStatus> for ObligationResponse {
    fn from(s: ObligationStatus) -> Self {
        let rec = s.reconciliation;
        Self {
            license_plate: s.license_plate,
            entry_time: s.entry_time,
            checked_at: s.checked_at,
            needs_new_payment: rec.needs_new_payment,
            base_rate: rec.base_rate,
            discount: rec.discount,
            amount_after_discount: rec.amount_after_discount,
            previously_paid_hours: rec.previously_paid_hours,
            valid_until: rec.valid_until,
            start_time: rec.start_time,
            last_payment: s.last_payment.map(|p| LastPaymentDto {
                payment_id: p.payment_id,
                amount: p.amount,
                paid_at: p.paid_at,
            }),
        }
    }
}

/// Settlement response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub payment_id: i64,
    pub license_plate: String,
    pub original_amount: Decimal,
    pub discount: Decimal,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub entry_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub previously_paid_hours: i64,
}

impl From<SettlementReceipt> for SettlementResponse {
    fn from(r: SettlementReceipt) -> Self {
        Self {
            payment_id: r.payment_id,
            license_plate: r.license_plate,
            original_amount: r.original_amount,
            discount: r.discount,
            amount: r.amount,
            paid_at: r.paid_at,
            entry_time: r.entry_time,
            start_time: r.start_time,
            previously_paid_hours: r.previously_paid_hours,
        }
    }
}

/// Exit response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitResponse {
    pub license_plate: String,
    pub session_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub payments: Vec<PaymentDto>,
}

impl From<ExitReceipt> for ExitResponse {
    fn from(r: ExitReceipt) -> Self {
        Self {
            license_plate: r.license_plate,
            session_id: r.session_id,
            entry_time: r.entry_time,
            exit_time: r.exit_time,
            payments: r.payments.into_iter().map(Into::into).collect(),
        }
    }
}

/// A session with its payments, for history responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryDto {
    pub session_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub payments: Vec<PaymentDto>,
}

/// Payment history response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryResponse {
    pub license_plate: String,
    pub active_sessions: Vec<SessionHistoryDto>,
    pub completed_sessions: Vec<SessionHistoryDto>,
    pub summary: HistorySummaryDto,
}

/// Per-vehicle payment totals
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummaryDto {
    pub total_entries: i64,
    pub total_payments: i64,
    pub total_amount: Decimal,
}

impl From<PaymentHistory> for PaymentHistoryResponse {
    fn from(h: PaymentHistory) -> Self {
        let map = |sessions: Vec<lotkeeper_services::parking::SessionHistory>| {
            sessions
                .into_iter()
                .map(|s| SessionHistoryDto {
                    session_id: s.session_id,
                    entry_time: s.entry_time,
                    exit_time: s.exit_time,
                    payments: s.payments.into_iter().map(Into::into).collect(),
                })
                .collect()
        };

        Self {
            license_plate: h.license_plate,
            active_sessions: map(h.active_sessions),
            completed_sessions: map(h.completed_sessions),
            summary: HistorySummaryDto {
                total_entries: h.summary.total_entries,
                total_payments: h.summary.total_payments,
                total_amount: h.summary.total_amount,
            },
        }
    }
}

/// One row of a session listing, with the fee computed live
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListItem {
    pub session_id: i64,
    pub license_plate: String,
    pub is_vip: bool,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub parked_hours: i64,
    pub parking_fee: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_obligation_response_omits_absent_last_payment() {
        let response = ObligationResponse {
            license_plate: "AB-1234".to_string(),
            entry_time: Utc::now(),
            checked_at: Utc::now(),
            needs_new_payment: true,
            base_rate: dec!(20),
            discount: dec!(0),
            amount_after_discount: dec!(20),
            previously_paid_hours: 0,
            valid_until: None,
            start_time: Utc::now(),
            last_payment: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"needsNewPayment\":true"));
        assert!(!json.contains("lastPayment"));
    }

    #[test]
    fn test_payment_dto_serialization() {
        let dto = PaymentDto {
            payment_id: 9,
            amount: dec!(15),
            discount: dec!(5),
            paid_at: None,
        };

        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"paymentId\":9"));
        assert!(json.contains("\"paidAt\":null"));
    }
}
