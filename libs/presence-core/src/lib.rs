//! # Presence Core
//!
//! Shared types for the presence layer: the canonical persona state, the
//! native backend's wire schema and the normalizer between the two, and the
//! snapshot the synchronization loop publishes to the rest of the desktop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │   Native backend     │        │  In-process engine   │
//! │  (RawPersonaState)   │        │   (PersonaState)     │
//! └──────────┬───────────┘        └──────────┬───────────┘
//!            │ normalize()                   │
//!            └───────────────┬───────────────┘
//!                            │ PersonaState
//!                 ┌──────────┴──────────┐
//!                 │  Synchronization    │
//!                 │  loop               │
//!                 └──────────┬──────────┘
//!                            │ LivingEnginesState
//!                 ┌──────────┴──────────┐
//!                 │ Widgets / visual    │
//!                 │ propagation sink    │
//!                 └─────────────────────┘
//! ```

mod error;
mod persona;
mod snapshot;
mod system;
pub mod wire;

pub use error::*;
pub use persona::*;
pub use snapshot::*;
pub use system::*;
pub use wire::{normalize, normalize_sample, PersonaSample};

/// Re-export common types
pub mod prelude {
    pub use crate::error::{PresenceError, Result};
    pub use crate::persona::{
        Mood, PersonaState, Posture, ReactionKind, Temperament, VisualMultipliers,
    };
    pub use crate::snapshot::LivingEnginesState;
    pub use crate::system::{SystemMetrics, SystemState};
    pub use crate::wire::{normalize, PersonaSample, RawPersonaState};
}
