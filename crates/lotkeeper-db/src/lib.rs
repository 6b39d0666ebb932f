//! Lotkeeper Database Layer
//!
//! This crate provides PostgreSQL database access and repository
//! implementations for the lotkeeper system. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for vehicles, rate tiers, billing options,
//!   and discount rules
//! - Transaction support for atomic session lifecycle transitions

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use lotkeeper_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
