//! Typed ID definitions for all domain entities.
//!
//! This module defines type aliases for each domain entity, providing
//! compile-time type safety for ID usage throughout the application.
//!
//! # Example
//!
//! ```rust
//! use server_core::common::{BookingId, UserId};
//!
//! // These are incompatible types - compiler prevents mixing them up
//! let user_id: UserId = UserId::new();
//! let booking_id: BookingId = BookingId::new();
//!
//! // This would be a compile error:
//! // let wrong: BookingId = user_id;
//! ```

// Re-export the core Id type and version markers
pub use super::id::{Id, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for User entities (accounts).
pub struct User;

/// Marker type for Booking entities (service appointments).
pub struct Booking;

/// Marker type for VerificationCode entities (OTP / login-token records).
pub struct VerificationCode;

/// Marker type for Listing entities (purchasable services/products).
pub struct Listing;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for User entities.
pub type UserId = Id<User>;

/// Typed ID for Booking entities.
pub type BookingId = Id<Booking>;

/// Typed ID for VerificationCode entities.
pub type CodeId = Id<VerificationCode>;

/// Typed ID for Listing entities.
pub type ListingId = Id<Listing>;
