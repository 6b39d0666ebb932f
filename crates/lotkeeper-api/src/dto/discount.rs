//! Discount DTOs

use chrono::{DateTime, Utc};
use lotkeeper_core::models::DiscountRule;
use lotkeeper_services::{DiscountApplication, DiscountListing};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Discount application request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDiscountRequest {
    /// License plate of the parked vehicle
    #[validate(length(min = 1, max = 20, message = "License plate is required"))]
    pub license_plate: String,

    /// Discount rule to apply
    #[validate(range(min = 1))]
    pub discount_id: i32,
}

/// A discount rule exposed to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRuleDto {
    pub discount_id: i32,
    pub title: String,
    pub customer_type: String,
    pub min_purchase: Decimal,
    pub max_purchase: Decimal,
    pub free_hours: i32,
}

impl From<DiscountRule> for DiscountRuleDto {
    fn from(rule: DiscountRule) -> Self {
        Self {
            discount_id: rule.discount_id,
            title: rule.title,
            customer_type: rule.customer_type.to_string(),
            min_purchase: rule.min_purchase,
            max_purchase: rule.max_purchase,
            free_hours: rule.free_hours,
        }
    }
}

/// Applicable discounts response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountListResponse {
    pub license_plate: String,
    pub is_vip: bool,
    pub applicable_discounts: Vec<DiscountRuleDto>,
}

impl From<DiscountListing> for DiscountListResponse {
    fn from(listing: DiscountListing) -> Self {
        Self {
            license_plate: listing.license_plate,
            is_vip: listing.is_vip,
            applicable_discounts: listing.discounts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Discount application response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountApplicationResponse {
    pub license_plate: String,
    pub discount_id: i32,
    pub entry_time: DateTime<Utc>,
    pub total_hours: i64,
    pub free_hours: i32,
    pub discount_amount: Decimal,
    pub payment_id: i64,
}

impl From<DiscountApplication> for DiscountApplicationResponse {
    fn from(a: DiscountApplication) -> Self {
        Self {
            license_plate: a.license_plate,
            discount_id: a.discount_id,
            entry_time: a.entry_time,
            total_hours: a.total_hours,
            free_hours: a.free_hours,
            discount_amount: a.discount_amount,
            payment_id: a.payment_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotkeeper_core::models::CustomerType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discount_rule_dto_from_model() {
        let rule = DiscountRule {
            discount_id: 2,
            title: "Weekend VIP".to_string(),
            customer_type: CustomerType::Vip,
            min_purchase: dec!(0),
            max_purchase: dec!(100),
            free_hours: 2,
            is_active: true,
        };

        let dto: DiscountRuleDto = rule.into();
        assert_eq!(dto.customer_type, "vip");
        assert_eq!(dto.free_hours, 2);

        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"customerType\":\"vip\""));
    }
}
