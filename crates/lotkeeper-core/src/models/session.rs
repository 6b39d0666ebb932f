//! Parking session model
//!
//! A session is created when a vehicle enters the lot and is closed exactly
//! once, by setting `exit_time` on a successful exit. A vehicle has at most
//! one open session at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parking session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSession {
    /// Unique identifier
    pub session_id: i64,

    /// Owning vehicle ID
    pub vehicle_id: i64,

    /// When the vehicle entered
    pub entry_time: DateTime<Utc>,

    /// When the vehicle exited (None = still parked)
    pub exit_time: Option<DateTime<Utc>>,

    /// Path of the entry camera snapshot, if any
    pub entry_image_path: Option<String>,
}

impl ParkingSession {
    /// Whether the session is still open
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_open_tracks_exit_time() {
        let entry = Utc::now();
        let mut session = ParkingSession {
            session_id: 1,
            vehicle_id: 1,
            entry_time: entry,
            exit_time: None,
            entry_image_path: None,
        };

        assert!(session.is_open());

        session.exit_time = Some(entry + Duration::hours(2));
        assert!(!session.is_open());
    }
}
