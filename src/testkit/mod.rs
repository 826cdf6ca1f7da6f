//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`] - [`MockTransport`](transport::MockTransport) with scripted
//!   responses and [`MockChannel`](transport::MockChannel) live channels.
//! - [`domain`] - Builders for orders, payloads and event bodies.

pub mod domain;
pub mod transport;
