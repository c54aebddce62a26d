//! Test repositories - in-memory implementations of the Verdant Commerce
//! repository traits.
//!
//! These back the engine's unit and integration tests and double as a
//! zero-setup backend for local experiments. The product repository's
//! conditional decrement holds one lock across the compare and the write,
//! so it is linearizable per product exactly like the production SQL
//! `UPDATE … WHERE stock >= n`.
//!
//! Failure injection:
//!
//! - [`FailingProductRepository`] - every call fails with a storage error
//! - [`ContestedProductRepository`] - decrements start failing after a
//!   configured number of successes, simulating a concurrent order
//!   claiming stock between a checkout's check and commit passes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carts;
pub mod orders;
pub mod products;

pub use carts::InMemoryCartRepository;
pub use orders::InMemoryOrderRepository;
pub use products::{
    ContestedProductRepository, FailingProductRepository, InMemoryProductRepository,
};
