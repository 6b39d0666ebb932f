//! Business logic services for lotkeeper
//!
//! This crate contains the services that orchestrate the parking billing
//! operations: payment reconciliation, the session lifecycle state machine,
//! and discount application.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies (pool, repository seams)
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - Every lifecycle transition runs as a single database transaction with
//!   the session's rows locked, so transitions on one session serialize
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Services
//!
//! - `reconcile` - Pure payment reconciliation over a session's payment rows
//! - `ParkingService` - Entry, obligation check, settlement, exit, history
//! - `DiscountService` - Discount applicability and free-hours application

pub mod discount;
pub mod parking;
pub mod reconciler;

pub use discount::{DiscountApplication, DiscountListing, DiscountService};
pub use parking::{
    EntryReceipt, ExitReceipt, ObligationStatus, ParkingService, PaymentHistory,
    SettlementReceipt,
};
pub use reconciler::{reconcile, Reconciliation};
