//! Discount rule model
//!
//! Discount rules are configured externally (CRUD lives with the
//! configuration collaborator); this core only reads active rules and turns
//! a rule's free hours into a discount amount on a pending payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which customers a discount rule targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    /// Applies to everyone
    #[default]
    All,
    /// VIP members only
    Vip,
    /// Non-VIP customers only
    General,
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerType::All => write!(f, "all"),
            CustomerType::Vip => write!(f, "vip"),
            CustomerType::General => write!(f, "general"),
        }
    }
}

impl CustomerType {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(CustomerType::All),
            "vip" => Some(CustomerType::Vip),
            "general" => Some(CustomerType::General),
            _ => None,
        }
    }
}

/// Discount rule entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountRule {
    /// Unique identifier
    pub discount_id: i32,

    /// Display title
    pub title: String,

    /// Targeted customer type
    pub customer_type: CustomerType,

    /// Minimum qualifying purchase
    pub min_purchase: Decimal,

    /// Maximum qualifying purchase
    pub max_purchase: Decimal,

    /// Free parking hours granted by this rule
    pub free_hours: i32,

    /// Whether the rule is currently active
    pub is_active: bool,
}

impl DiscountRule {
    /// Whether this rule can be applied to a customer with the given VIP status
    pub fn applies_to(&self, is_vip: bool) -> bool {
        match self.customer_type {
            CustomerType::All => true,
            CustomerType::Vip => is_vip,
            CustomerType::General => !is_vip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(customer_type: CustomerType) -> DiscountRule {
        DiscountRule {
            discount_id: 1,
            title: "Mall voucher".to_string(),
            customer_type,
            min_purchase: dec!(100),
            max_purchase: dec!(1000),
            free_hours: 2,
            is_active: true,
        }
    }

    #[test]
    fn test_applies_to() {
        assert!(rule(CustomerType::All).applies_to(true));
        assert!(rule(CustomerType::All).applies_to(false));
        assert!(rule(CustomerType::Vip).applies_to(true));
        assert!(!rule(CustomerType::Vip).applies_to(false));
        assert!(!rule(CustomerType::General).applies_to(true));
        assert!(rule(CustomerType::General).applies_to(false));
    }

    #[test]
    fn test_customer_type_roundtrip() {
        for ct in [CustomerType::All, CustomerType::Vip, CustomerType::General] {
            assert_eq!(CustomerType::from_str(&ct.to_string()), Some(ct));
        }
        assert_eq!(CustomerType::from_str("unknown"), None);
    }
}
