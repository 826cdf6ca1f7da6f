//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The transport client that talks to the backend lives outside this crate.
//! It plugs in by implementing [`Transport`] and [`LiveChannel`].
//!
//! ```text
//!     ┌────────────────────────────┐
//!     │  OrderService / OrderStore │
//!     └─────────────┬──────────────┘
//!                   │ Transport, LiveChannel
//!                   ▼
//!     ┌────────────────────────────┐
//!     │   external GraphQL client  │
//!     └────────────────────────────┘
//! ```

pub mod transport;

pub use transport::{
    ChannelMessage, LiveChannel, MessageHandler, Transport, TransportError, WireRequest,
    MESSAGE_EVENT,
};
