//! Native backend wire schema and normalization
//!
//! The native engine answers with capitalized enum spellings (and French mood
//! names), snake_case fields, and no memory or reaction tables. [`normalize`]
//! turns such a payload into the canonical [`PersonaState`]. Sections the
//! native side never sends are synthesized from fixed constants, so the same
//! raw input always normalizes to the same output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PresenceError, Result};
use crate::persona::{
    Behavior, Mood, MoodState, MoodTrigger, MoodVisualEffect, Personality, PersonalityTraits,
    PersonaMemory, PersonaState, Posture, Temperament, VisualMultipliers,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPersonalityTraits {
    pub calm: f64,
    pub precise: f64,
    pub analytical: f64,
    pub stable: f64,
    pub responsive: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawTemperament {
    #[serde(alias = "serene")]
    Serene,
    #[serde(alias = "focused")]
    Focused,
    #[serde(alias = "alert")]
    Alert,
    #[serde(alias = "dormant")]
    Dormant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPersonalityCore {
    pub traits: RawPersonalityTraits,
    pub temperament: RawTemperament,
    pub evolution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawMood {
    #[serde(alias = "Clear", alias = "clear")]
    Clair,
    #[serde(alias = "vibrant")]
    Vibrant,
    #[serde(alias = "Attentive", alias = "attentive")]
    Attentif,
    #[serde(alias = "Alert", alias = "alert")]
    Alerte,
    #[serde(alias = "Neutral", alias = "neutral")]
    Neutre,
    #[serde(alias = "dormant")]
    Dormant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMoodState {
    pub current: RawMood,
    pub intensity: f64,
    pub duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawPosture {
    #[serde(alias = "attentive")]
    Attentive,
    #[serde(alias = "relaxed")]
    Relaxed,
    #[serde(alias = "vigilant")]
    Vigilant,
    #[serde(alias = "minimal")]
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBehaviorState {
    pub posture: RawPosture,
    #[serde(default, alias = "activeReactions")]
    pub active_reactions: Vec<String>,
}

/// Persona state as the native backend sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPersonaState {
    pub personality: RawPersonalityCore,
    pub mood: RawMoodState,
    pub behavior: RawBehaviorState,
    #[serde(alias = "presenceLevel")]
    pub presence_level: f64,
    #[serde(default)]
    pub visual_multipliers: Option<VisualMultipliers>,
    /// Milliseconds since the Unix epoch
    #[serde(alias = "lastUpdate")]
    pub timestamp: u64,
}

impl From<RawTemperament> for Temperament {
    fn from(raw: RawTemperament) -> Self {
        match raw {
            RawTemperament::Serene => Self::Serene,
            RawTemperament::Focused => Self::Focused,
            RawTemperament::Alert => Self::Alert,
            RawTemperament::Dormant => Self::Dormant,
        }
    }
}

impl From<RawMood> for Mood {
    fn from(raw: RawMood) -> Self {
        match raw {
            RawMood::Clair => Self::Clear,
            RawMood::Vibrant => Self::Vibrant,
            RawMood::Attentif => Self::Attentive,
            RawMood::Alerte => Self::Alert,
            RawMood::Neutre => Self::Neutral,
            RawMood::Dormant => Self::Dormant,
        }
    }
}

impl From<RawPosture> for Posture {
    fn from(raw: RawPosture) -> Self {
        match raw {
            RawPosture::Attentive => Self::Attentive,
            RawPosture::Relaxed => Self::Relaxed,
            RawPosture::Vigilant => Self::Vigilant,
            RawPosture::Minimal => Self::Minimal,
        }
    }
}

/// A normalized persona with the multipliers the backend sent alongside it
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaSample {
    pub persona: PersonaState,
    /// `None` when the response carried no multipliers
    pub multipliers: Option<VisualMultipliers>,
}

impl From<PersonaState> for PersonaSample {
    fn from(persona: PersonaState) -> Self {
        Self {
            persona,
            multipliers: None,
        }
    }
}

impl From<RawPersonaState> for PersonaSample {
    fn from(raw: RawPersonaState) -> Self {
        let multipliers = raw.visual_multipliers;
        Self {
            persona: raw.into(),
            multipliers,
        }
    }
}

impl From<RawPersonaState> for PersonaState {
    fn from(raw: RawPersonaState) -> Self {
        let traits = raw.personality.traits;
        let mut behavior = Behavior::with_posture(raw.behavior.posture.into());
        behavior.active_reactions = raw.behavior.active_reactions;

        PersonaState {
            personality: Personality {
                traits: PersonalityTraits {
                    calm: traits.calm,
                    precise: traits.precise,
                    analytical: traits.analytical,
                    stable: traits.stable,
                    responsive: traits.responsive,
                },
                temperament: raw.personality.temperament.into(),
                evolution: raw.personality.evolution,
            },
            mood: MoodState {
                current: raw.mood.current.into(),
                intensity: raw.mood.intensity,
                duration: raw.mood.duration,
                trigger: MoodTrigger::Internal,
                visual_effect: MoodVisualEffect {
                    glow_shift: 0.0,
                    motion_speed: 1.0,
                    depth_intensity: raw.mood.intensity,
                },
            },
            behavior,
            memory: PersonaMemory::default(),
            presence_level: raw.presence_level,
            last_update: raw.timestamp,
        }
    }
}

impl RawPersonaState {
    /// Decode a raw payload, rejecting anything that does not match the schema
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| PresenceError::NormalizationFailure(e.to_string()))
    }
}

/// Normalize a native payload into the canonical persona state
///
/// Fails with [`PresenceError::NormalizationFailure`] when a required field
/// is missing or has the wrong type; no partially populated state is built.
/// Canonical payloads are accepted as well, so normalizing an already
/// normalized state yields it unchanged.
pub fn normalize(raw: &Value) -> Result<PersonaState> {
    RawPersonaState::from_value(raw).map(PersonaState::from)
}

/// Like [`normalize`], keeping any embedded `visual_multipliers`
pub fn normalize_sample(raw: &Value) -> Result<PersonaSample> {
    RawPersonaState::from_value(raw).map(PersonaSample::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::ReactionKind;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "personality": {
                "traits": {
                    "calm": 0.85,
                    "precise": 0.92,
                    "analytical": 0.88,
                    "stable": 0.9,
                    "responsive": 0.78
                },
                "temperament": "Focused",
                "evolution": 0.0001
            },
            "mood": { "current": "Attentif", "intensity": 0.7, "duration": 1200 },
            "behavior": { "posture": "Vigilant", "active_reactions": ["warning"] },
            "presence_level": 0.68,
            "visual_multipliers": { "glow": 1.2, "motion": 1.1, "sound": 0.7, "depth": 0.6 },
            "timestamp": 1_700_000_000_000u64
        })
    }

    #[test]
    fn test_vocabulary_translation() {
        let state = normalize(&sample()).unwrap();

        assert_eq!(state.mood.current, Mood::Attentive);
        assert_eq!(state.personality.temperament, Temperament::Focused);
        assert_eq!(state.behavior.posture, Posture::Vigilant);
        assert_eq!(state.presence_level, 0.68);
        assert_eq!(state.last_update, 1_700_000_000_000);
        assert_eq!(state.behavior.active_reactions, vec!["warning".to_string()]);
    }

    #[test]
    fn test_all_native_moods_map() {
        let cases = [
            ("Clair", Mood::Clear),
            ("Vibrant", Mood::Vibrant),
            ("Attentif", Mood::Attentive),
            ("Alerte", Mood::Alert),
            ("Neutre", Mood::Neutral),
            ("Dormant", Mood::Dormant),
            ("Alert", Mood::Alert),
        ];

        for (spelling, expected) in cases {
            let mut raw = sample();
            raw["mood"]["current"] = json!(spelling);
            assert_eq!(normalize(&raw).unwrap().mood.current, expected, "{}", spelling);
        }
    }

    #[test]
    fn test_synthesized_sections_are_constant() {
        let first = normalize(&sample()).unwrap();
        let second = normalize(&sample()).unwrap();
        assert_eq!(first, second);

        assert_eq!(first.mood.trigger, MoodTrigger::Internal);
        assert_eq!(first.mood.visual_effect.depth_intensity, 0.7);
        assert_eq!(first.behavior.adaptation_speed, 0.5);
        assert_eq!(first.behavior.reactions.len(), ReactionKind::ALL.len());
        assert_eq!(first.memory.interaction_history.most_used_archetype, "helios");
        assert!(!first.memory.adaptive_profile.sensitive_to_motion);
    }

    #[test]
    fn test_missing_mood_current_is_rejected() {
        let mut raw = sample();
        raw["mood"].as_object_mut().unwrap().remove("current");

        let err = normalize(&raw).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("current"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut raw = sample();
        raw["mood"]["current"] = json!(3);
        assert!(normalize(&raw).is_err());

        let mut raw = sample();
        raw["mood"]["current"] = json!("Furious");
        assert!(normalize(&raw).is_err());

        assert!(normalize(&json!(null)).is_err());
    }

    #[test]
    fn test_optional_native_fields() {
        let mut raw = sample();
        let root = raw.as_object_mut().unwrap();
        root.remove("visual_multipliers");
        raw["behavior"].as_object_mut().unwrap().remove("active_reactions");

        let state = normalize(&raw).unwrap();
        assert!(state.behavior.active_reactions.is_empty());
    }

    #[test]
    fn test_embedded_multipliers_are_kept() {
        let decoded = normalize_sample(&sample()).unwrap();
        assert_eq!(decoded.multipliers.unwrap().glow, 1.2);
        assert_eq!(decoded.persona, normalize(&sample()).unwrap());

        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("visual_multipliers");
        assert!(normalize_sample(&raw).unwrap().multipliers.is_none());
    }

    #[test]
    fn test_normalizing_twice_changes_nothing() {
        let once = normalize(&sample()).unwrap();
        let twice = normalize(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);

        let mut moved = once.clone();
        moved.mood.trigger = MoodTrigger::System;
        moved.mood.visual_effect.glow_shift = 0.9;
        let renormalized = normalize(&serde_json::to_value(&moved).unwrap()).unwrap();
        assert_eq!(renormalized.mood.trigger, MoodTrigger::Internal);
        assert_eq!(renormalized.mood.current, Mood::Attentive);
        assert_eq!(renormalized.behavior.posture, Posture::Vigilant);
    }

    #[test]
    fn test_canonical_json_shape() {
        let state = normalize(&sample()).unwrap();
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["mood"]["current"], "attentive");
        assert_eq!(json["presenceLevel"], 0.68);
        assert_eq!(json["lastUpdate"], 1_700_000_000_000u64);
        assert_eq!(json["memory"]["userPreferences"]["typicalRhythm"], "normal");
    }
}
