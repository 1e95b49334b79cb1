//! Glow, motion and depth engines
//!
//! The propagator only sees the three traits. The default implementations
//! are table-driven: each known module carries a glow profile (colour and
//! intensity range) and a motion profile (calm and busy motion split by a
//! threshold on the 0-100 intensity scale). Unknown modules yield `None`.

use presence_core::MotionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sink::VisualSink;

/// Glow parameters for one module
#[derive(Debug, Clone, PartialEq)]
pub struct GlowParams {
    /// Opacity-like strength in `[0, 1]`
    pub intensity: f64,
    /// CSS colour
    pub color: String,
    /// Blur radius in px
    pub blur: f64,
}

/// Motion parameters for one module
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub kind: MotionKind,
    pub duration_ms: u64,
}

/// Depth layer parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthLayer {
    pub opacity: f64,
    pub parallax_factor: f64,
}

impl DepthLayer {
    pub const fn new(opacity: f64, parallax_factor: f64) -> Self {
        Self {
            opacity,
            parallax_factor,
        }
    }
}

pub trait GlowEngine: Send + Sync {
    /// Glow for `module_id` at `intensity` (0-100)
    fn glow(&self, module_id: &str, intensity: u8) -> Option<GlowParams>;
}

pub trait MotionEngine: Send + Sync {
    /// Motion for `module_id` at `intensity` (0-100)
    fn module_motion(&self, module_id: &str, intensity: u8) -> Option<MotionParams>;
}

pub trait DepthEngine: Send + Sync {
    fn update_layer(&self, name: &str, layer: DepthLayer);
}

/// Animation durations (ms)
pub mod speed {
    pub const FAST: u64 = 600;
    pub const MEDIUM: u64 = 1200;
    pub const SLOW: u64 = 2400;
    pub const VERY_SLOW: u64 = 4000;
}

/// Blur radius range (px) mapped from glow intensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurRange {
    pub min: f64,
    pub max: f64,
}

impl Default for BlurRange {
    fn default() -> Self {
        Self { min: 4.0, max: 24.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlowProfile {
    pub color: String,
    pub base_intensity: f64,
    pub max_intensity: f64,
}

impl GlowProfile {
    pub fn new(color: &str, base_intensity: f64, max_intensity: f64) -> Self {
        Self {
            color: color.to_string(),
            base_intensity,
            max_intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionStep {
    pub kind: MotionKind,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Intensity at which `busy` replaces `calm`
    pub threshold: u8,
    pub calm: MotionStep,
    pub busy: MotionStep,
}

impl MotionProfile {
    pub const fn new(threshold: u8, kind: MotionKind, calm_ms: u64, busy_ms: u64) -> Self {
        Self {
            threshold,
            calm: MotionStep {
                kind,
                duration_ms: calm_ms,
            },
            busy: MotionStep {
                kind,
                duration_ms: busy_ms,
            },
        }
    }
}

/// Per-module glow and motion tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleTables {
    pub blur: BlurRange,
    pub glow: BTreeMap<String, GlowProfile>,
    pub motion: BTreeMap<String, MotionProfile>,
}

impl Default for ModuleTables {
    fn default() -> Self {
        let glow = BTreeMap::from([
            ("helios".to_string(), GlowProfile::new("#ff6b35", 0.15, 0.60)),
            ("nexus".to_string(), GlowProfile::new("#667eea", 0.15, 0.50)),
            ("harmonia".to_string(), GlowProfile::new("#10b981", 0.15, 0.45)),
            ("memory".to_string(), GlowProfile::new("#a855f7", 0.15, 0.55)),
        ]);

        let motion = BTreeMap::from([
            (
                "helios".to_string(),
                MotionProfile::new(60, MotionKind::Pulse, speed::SLOW, speed::FAST),
            ),
            (
                "nexus".to_string(),
                MotionProfile::new(50, MotionKind::Flow, speed::MEDIUM, speed::FAST),
            ),
            (
                "harmonia".to_string(),
                MotionProfile::new(70, MotionKind::Sway, speed::VERY_SLOW, speed::SLOW),
            ),
            (
                "memory".to_string(),
                MotionProfile::new(50, MotionKind::Scan, speed::VERY_SLOW, speed::SLOW),
            ),
        ]);

        Self {
            blur: BlurRange::default(),
            glow,
            motion,
        }
    }
}

/// Table-driven [`GlowEngine`]
#[derive(Debug, Clone)]
pub struct ModuleGlowEngine {
    profiles: BTreeMap<String, GlowProfile>,
    blur: BlurRange,
}

impl ModuleGlowEngine {
    pub fn new(tables: &ModuleTables) -> Self {
        Self {
            profiles: tables.glow.clone(),
            blur: tables.blur,
        }
    }

    /// `base + (value / 100) * (max - base)`, value clamped to 0-100
    pub fn intensity(profile: &GlowProfile, value: u8) -> f64 {
        let normalized = f64::from(value.min(100)) / 100.0;
        profile.base_intensity + normalized * (profile.max_intensity - profile.base_intensity)
    }

    pub fn blur(&self, intensity: f64) -> f64 {
        self.blur.min + intensity * (self.blur.max - self.blur.min)
    }
}

impl Default for ModuleGlowEngine {
    fn default() -> Self {
        Self::new(&ModuleTables::default())
    }
}

impl GlowEngine for ModuleGlowEngine {
    fn glow(&self, module_id: &str, intensity: u8) -> Option<GlowParams> {
        let profile = self.profiles.get(module_id)?;
        let strength = Self::intensity(profile, intensity);
        Some(GlowParams {
            intensity: strength,
            color: profile.color.clone(),
            blur: self.blur(strength),
        })
    }
}

/// Table-driven [`MotionEngine`]
#[derive(Debug, Clone)]
pub struct ModuleMotionEngine {
    profiles: BTreeMap<String, MotionProfile>,
}

impl ModuleMotionEngine {
    pub fn new(tables: &ModuleTables) -> Self {
        Self {
            profiles: tables.motion.clone(),
        }
    }
}

impl Default for ModuleMotionEngine {
    fn default() -> Self {
        Self::new(&ModuleTables::default())
    }
}

impl MotionEngine for ModuleMotionEngine {
    fn module_motion(&self, module_id: &str, intensity: u8) -> Option<MotionParams> {
        let profile = self.profiles.get(module_id)?;
        let step = if intensity >= profile.threshold {
            profile.busy
        } else {
            profile.calm
        };
        Some(MotionParams {
            kind: step.kind,
            duration_ms: step.duration_ms,
        })
    }
}

/// [`DepthEngine`] writing each layer into a sink as
/// `depth-{name}-opacity` and `depth-{name}-parallax`
pub struct SinkDepthEngine<S> {
    sink: S,
}

impl<S: VisualSink> SinkDepthEngine<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: VisualSink> DepthEngine for SinkDepthEngine<S> {
    fn update_layer(&self, name: &str, layer: DepthLayer) {
        self.sink
            .set(&format!("depth-{}-opacity", name), &layer.opacity.to_string());
        self.sink.set(
            &format!("depth-{}-parallax", name),
            &layer.parallax_factor.to_string(),
        );
    }
}
