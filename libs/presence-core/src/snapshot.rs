//! Published engine snapshot and its derived fields

use serde::{Deserialize, Serialize};

use crate::persona::{PersonaState, VisualMultipliers};
use crate::system::SystemState;

/// Consolidated state handed to consumers once per accepted tick.
///
/// Always replaced wholesale, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivingEnginesState {
    pub system_state: SystemState,
    pub glow: f64,
    pub motion: f64,
    pub depth: f64,
    pub sound: f64,
    pub persona: Option<PersonaState>,
    pub presence_level: f64,
    pub cognitive_load: f64,
    pub rhythm_score: f64,
    pub holo_active: bool,
    pub particle_count: u32,
    pub initialized: bool,
}

impl Default for LivingEnginesState {
    fn default() -> Self {
        let multipliers = VisualMultipliers::default();
        Self {
            system_state: SystemState::Stable,
            glow: multipliers.glow,
            motion: multipliers.motion,
            depth: multipliers.depth,
            sound: multipliers.sound,
            persona: None,
            presence_level: 0.0,
            cognitive_load: 0.0,
            rhythm_score: 0.0,
            holo_active: false,
            particle_count: 0,
            initialized: false,
        }
    }
}

impl LivingEnginesState {
    /// Snapshot for an accepted persona sample
    pub fn from_persona(
        system_state: SystemState,
        multipliers: VisualMultipliers,
        persona: &PersonaState,
    ) -> Self {
        Self {
            system_state,
            glow: multipliers.glow,
            motion: multipliers.motion,
            depth: multipliers.depth,
            sound: multipliers.sound,
            presence_level: persona.presence_level,
            cognitive_load: cognitive_load(persona),
            rhythm_score: rhythm_score(persona),
            holo_active: true,
            particle_count: particle_count(persona),
            initialized: true,
            persona: Some(persona.clone()),
        }
    }

    /// Same snapshot with `initialized` set
    pub fn mark_initialized(&self) -> Self {
        Self {
            initialized: true,
            ..self.clone()
        }
    }

    /// `lastUpdate` of the carried persona, if any
    pub fn last_update(&self) -> Option<u64> {
        self.persona.as_ref().map(|p| p.last_update)
    }
}

/// `clamp(mood.intensity, 0, 1)`
pub fn cognitive_load(persona: &PersonaState) -> f64 {
    persona.mood.intensity.clamp(0.0, 1.0)
}

/// `presenceLevel * 0.8 + 0.2`
pub fn rhythm_score(persona: &PersonaState) -> f64 {
    persona.presence_level * 0.8 + 0.2
}

/// Holographic particle budget, scaled by presence
pub fn particle_count(persona: &PersonaState) -> u32 {
    (500.0 + persona.presence_level.clamp(0.0, 1.0) * 1000.0).round() as u32
}
