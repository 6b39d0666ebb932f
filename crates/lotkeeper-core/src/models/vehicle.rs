//! Vehicle model
//!
//! A vehicle is identified by its license plate and is created transparently
//! the first time it enters the lot. VIP status is driven by an expiry
//! timestamp maintained by the member registry (an external collaborator).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vehicle entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique identifier
    pub vehicle_id: i64,

    /// License plate (unique)
    pub license_plate: String,

    /// VIP membership expiry (None = never was VIP)
    pub vip_expires_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Whether the vehicle holds an unexpired VIP membership at `now`
    pub fn is_vip(&self, now: DateTime<Utc>) -> bool {
        self.vip_expires_at.map_or(false, |expiry| expiry > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn vehicle(vip_expires_at: Option<DateTime<Utc>>) -> Vehicle {
        Vehicle {
            vehicle_id: 1,
            license_plate: "AB-1234".to_string(),
            vip_expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_vip() {
        let now = Utc::now();

        assert!(!vehicle(None).is_vip(now));
        assert!(vehicle(Some(now + Duration::days(30))).is_vip(now));
        assert!(!vehicle(Some(now - Duration::days(1))).is_vip(now));
    }
}
