//! Core types for Verdant Commerce.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod owner;
pub mod price;
pub mod status;

pub use id::*;
pub use owner::OwnerKey;
pub use price::Price;
pub use status::OrderStatus;
