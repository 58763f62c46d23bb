//! `sewa-core` — shared primitives for the Sewa backend.
//!
//! Strongly-typed identifiers and the clock seam. This crate is intentionally
//! free of HTTP, storage, and auth concerns.

pub mod clock;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use id::UserId;
