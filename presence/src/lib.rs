//! Presence - persona state synchronization
//!
//! Keeps one living persona state per mounted scope with:
//! - Transport selected once per session (native backend or in-process engine)
//! - Fixed-interval single-flight polling
//! - Last-timestamp-wins acceptance of poll and command responses
//! - Silent degrade on sustained failure
//! - Teardown that ignores every result still in flight
//! - Explicit composition with the visual propagation sink

pub mod config;
pub mod dispatch;
pub mod engines;
pub mod sampler;
pub mod sync;

pub use config::PresenceConfig;
pub use dispatch::ReactionDispatcher;
pub use engines::{Actions, LivingEngines};
pub use sync::{Acceptance, LoopPhase, SyncLoop};
