//! Core types, errors, and shared functionality for atelier.
//!
//! This crate provides the foundational types used throughout the atelier system:
//!
//! - **Error types**: Comprehensive error handling with [`AtelierError`] and [`Result`]
//! - **Slug codec**: Identifier-bearing URL segments for event detail pages
//! - **Domain records**: Events, bookings, gift cards, private-event requests,
//!   payment-error records, and admin sessions
//!
//! # Overview
//!
//! atelier-core is designed as a dependency-light foundation (aside from
//! serialization and time handling) that all other atelier crates depend on. It
//! defines the core domain model and error types without implementing any
//! business logic or talking to any hosted service.
//!
//! # Examples
//!
//! ## Building an event link
//!
//! ```rust
//! use atelier_core::slug;
//!
//! let combined = slug::encode("Wheel Throwing for Beginners", "507f1f77bcf86cd799439011");
//! assert_eq!(slug::decode(&combined), "507f1f77bcf86cd799439011");
//! ```
//!
//! ## Error handling
//!
//! ```rust
//! use atelier_core::{Result, AtelierError};
//!
//! fn example_operation() -> Result<String> {
//!     Err(AtelierError::config("invalid configuration"))
//! }
//!
//! match example_operation() {
//!     Ok(val) => println!("Success: {}", val),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod commerce;
pub mod error;
pub mod event;
pub mod inquiry;
pub mod session;
pub mod slug;

// Re-export commonly used types for convenience
pub use commerce::{GiftCardBalance, GiftCardOrder, PaymentErrorRecord, PaymentFlow};
pub use error::{AtelierError, Result};
pub use event::{Booking, Event, EventCategory};
pub use inquiry::{InquiryStatus, PrivateEventRequest};
pub use session::{AdminUser, Session};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types so they can be
/// imported with a single glob import:
///
/// ```rust
/// use atelier_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::commerce::{GiftCardOrder, PaymentErrorRecord, PaymentFlow};
    pub use crate::error::{AtelierError, Result};
    pub use crate::event::{Booking, Event, EventCategory};
    pub use crate::inquiry::{InquiryStatus, PrivateEventRequest};
    pub use crate::session::{AdminUser, Session};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        // Verify we can use types from prelude
        let _error = AtelierError::config("test");
        let _flow = PaymentFlow::Booking;
        let _status = InquiryStatus::New;
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_result().unwrap(), 42);
    }
}
