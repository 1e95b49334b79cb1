//! Canonical persona state
//!
//! This is the one shape consumers see, whichever backend produced it.
//! Field names serialize in camelCase so snapshots can be handed straight to
//! a web view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Personality traits, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub calm: f64,
    pub precise: f64,
    pub analytical: f64,
    pub stable: f64,
    pub responsive: f64,
}

/// Long-lived disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperament {
    Serene,
    Focused,
    Alert,
    Dormant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    pub traits: PersonalityTraits,
    pub temperament: Temperament,
    /// Evolution rate (ultra slow)
    pub evolution: f64,
}

/// Short-lived mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Clear,
    Vibrant,
    Attentive,
    Alert,
    Neutral,
    Dormant,
}

/// Where a mood change originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrigger {
    Internal,
    System,
    User,
}

/// Visual hint attached to the current mood
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodVisualEffect {
    pub glow_shift: f64,
    pub motion_speed: f64,
    pub depth_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodState {
    pub current: Mood,
    /// Intensity in `[0, 1]`
    pub intensity: f64,
    /// Time spent in the current mood (ms)
    pub duration: u64,
    pub trigger: MoodTrigger,
    pub visual_effect: MoodVisualEffect,
}

/// Behavioral posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    Attentive,
    Relaxed,
    Vigilant,
    Minimal,
}

/// Animation family used by reactions and module motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    Pulse,
    Sway,
    Flow,
    Scan,
    Breathe,
    Shimmer,
    Vibrate,
    Static,
}

impl MotionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pulse => "pulse",
            Self::Sway => "sway",
            Self::Flow => "flow",
            Self::Scan => "scan",
            Self::Breathe => "breathe",
            Self::Shimmer => "shimmer",
            Self::Vibrate => "vibrate",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for MotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete mood reactions the host can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Error,
    Success,
    Warning,
    Overload,
    Idle,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        Self::Error,
        Self::Success,
        Self::Warning,
        Self::Overload,
        Self::Idle,
    ];

    /// Wire spelling sent as `reactionType`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Overload => "overload",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown reaction: {}", s))
    }
}

/// How a reaction renders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionProfile {
    pub glow_intensity: f64,
    pub motion_type: MotionKind,
    pub duration_ms: u64,
}

impl ReactionProfile {
    pub const fn new(glow_intensity: f64, motion_type: MotionKind, duration_ms: u64) -> Self {
        Self {
            glow_intensity,
            motion_type,
            duration_ms,
        }
    }

    /// Fixed reaction table
    pub fn table() -> BTreeMap<ReactionKind, ReactionProfile> {
        BTreeMap::from([
            (ReactionKind::Error, Self::new(0.9, MotionKind::Pulse, 3000)),
            (ReactionKind::Success, Self::new(0.7, MotionKind::Flow, 2000)),
            (ReactionKind::Warning, Self::new(0.8, MotionKind::Pulse, 2500)),
            (ReactionKind::Overload, Self::new(1.0, MotionKind::Pulse, 5000)),
            (ReactionKind::Idle, Self::new(0.3, MotionKind::Breathe, 10000)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    pub posture: Posture,
    pub reactions: BTreeMap<ReactionKind, ReactionProfile>,
    pub adaptation_speed: f64,
    /// Reactions the backend reports as currently playing
    #[serde(default)]
    pub active_reactions: Vec<String>,
}

impl Behavior {
    /// Behavior with the fixed reaction table and default adaptation speed
    pub fn with_posture(posture: Posture) -> Self {
        Self {
            posture,
            reactions: ReactionProfile::table(),
            adaptation_speed: 0.5,
            active_reactions: Vec::new(),
        }
    }
}

/// Typical interaction rhythm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rhythm {
    Slow,
    Normal,
    Fast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub typical_rhythm: Rhythm,
    pub preferred_density: f64,
    pub visual_sensitivity: f64,
    pub sound_tolerance: f64,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            typical_rhythm: Rhythm::Normal,
            preferred_density: 0.5,
            visual_sensitivity: 0.7,
            sound_tolerance: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionHistory {
    pub total_sessions: u64,
    pub avg_session_duration: u64,
    pub most_used_archetype: String,
    pub error_tolerance: f64,
}

impl Default for InteractionHistory {
    fn default() -> Self {
        Self {
            total_sessions: 0,
            avg_session_duration: 0,
            most_used_archetype: "helios".to_string(),
            error_tolerance: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveProfile {
    pub needs_simplification: bool,
    pub prefers_speed: bool,
    pub sensitive_to_motion: bool,
}

/// Adaptive memory section. The native backend does not track it, so it is
/// always the fixed default there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaMemory {
    pub user_preferences: UserPreferences,
    pub interaction_history: InteractionHistory,
    pub adaptive_profile: AdaptiveProfile,
}

/// Complete persona state at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaState {
    pub personality: Personality,
    pub mood: MoodState,
    pub behavior: Behavior,
    pub memory: PersonaMemory,
    /// Presence level in `[0, 1]`
    pub presence_level: f64,
    /// Milliseconds since the Unix epoch, stamped by the producing backend
    pub last_update: u64,
}

/// Scalars driving presentation intensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualMultipliers {
    pub glow: f64,
    pub motion: f64,
    pub sound: f64,
    pub depth: f64,
}

impl Default for VisualMultipliers {
    fn default() -> Self {
        Self {
            glow: 1.0,
            motion: 1.0,
            sound: 0.5,
            depth: 0.5,
        }
    }
}
