//! # presence-bridge
//!
//! Reaches the persona engine, wherever it lives.
//!
//! A [`TransportResolver`] decides once per session whether the native
//! persona backend is reachable. The loop then talks to a [`BridgeAdapter`]:
//! either [`NativeAdapter`] (IPC commands over the backend socket, payloads
//! run through the wire normalizer) or [`FallbackAdapter`] (an in-process
//! [`FallbackEngine`]). Both present the same interface and never return an
//! error past the adapter boundary except from `initialize`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use presence_bridge::{adapter_for, SocketProbe, TransportResolver};
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let resolver = TransportResolver::new(SocketProbe::new(presence_bridge::paths::PERSONA_SOCKET));
//! let adapter = adapter_for(
//!     resolver.resolve(),
//!     presence_bridge::paths::PERSONA_SOCKET,
//!     Duration::from_secs(2),
//! );
//!
//! if adapter.initialize().await.is_ok() {
//!     let sample = adapter.get_state().await;
//!     println!("{:?}", sample.map(|s| s.persona.mood.current));
//! }
//! # }
//! ```

pub mod adapter;
pub mod channel;
pub mod fallback;
pub mod transport;

pub use adapter::{adapter_for, BridgeAdapter, FallbackAdapter, NativeAdapter};
pub use channel::{PersonaChannel, SocketChannel};
pub use fallback::{BaselineEngine, FallbackEngine};
pub use transport::{CapabilityProbe, SocketProbe, TransportMode, TransportResolver};

/// Default socket paths
pub mod paths {
    /// Native persona backend socket
    pub const PERSONA_SOCKET: &str = "/run/presence/persona.sock";
}
