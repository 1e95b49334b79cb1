//! # presence-visual
//!
//! Fans the system state out as style variables.
//!
//! The [`Propagator`] maps a [`SystemState`](presence_core::SystemState) to a
//! fixed intensity, asks the glow and motion engines for module-specific
//! parameters, rewrites the depth layers, and writes everything into a
//! [`VisualSink`]. Rendering reads the sink; nothing reads back from it here.
//!
//! Keys written:
//!
//! | Key | Value |
//! |-----|-------|
//! | `system-state` | `stable`, `warning`, ... |
//! | `system-state-intensity` | `50`, `85`, ... |
//! | `module-{id}-glow-intensity` | `0.5325` |
//! | `module-{id}-glow-color` | `#ff6b35` |
//! | `module-{id}-glow-blur` | `14.65px` |
//! | `module-{id}-motion-type` | `pulse` |
//! | `module-{id}-motion-duration` | `600ms` |
//! | `depth-{layer}-opacity` | `0.8` |
//! | `depth-{layer}-parallax` | `0.6` |

pub mod engines;
pub mod propagate;
pub mod sink;

pub use engines::{
    BlurRange, DepthEngine, DepthLayer, GlowEngine, GlowParams, GlowProfile, ModuleGlowEngine,
    ModuleMotionEngine, ModuleTables, MotionEngine, MotionParams, MotionProfile, MotionStep,
    SinkDepthEngine,
};
pub use propagate::{keys, Propagator};
pub use sink::{MemorySink, StylesheetSink, VisualSink};
