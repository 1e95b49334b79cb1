//! In-process persona engine used when no native backend is reachable

use chrono::Utc;
use parking_lot::Mutex;
use presence_core::{
    Behavior, Mood, MoodState, MoodTrigger, MoodVisualEffect, Personality, PersonalityTraits,
    PersonaMemory, PersonaState, Posture, PresenceError, ReactionKind, Result, SystemMetrics,
    SystemState, Temperament, VisualMultipliers,
};
use tracing::debug;

/// Call surface of an in-process persona engine
///
/// Engines own their state; the adapter only reads snapshots out of them.
pub trait FallbackEngine: Send + Sync {
    fn initialize(&self) -> Result<()>;

    /// Current state, `None` before initialization or after `destroy`
    fn get_state(&self) -> Option<PersonaState>;

    fn update(&self, system_state: SystemState, metrics: &SystemMetrics) -> Result<()>;

    fn react(&self, kind: ReactionKind) -> Result<()>;

    /// Return to the baseline persona in one step. Readers never observe
    /// the engine without state while a reset is in progress.
    fn reset(&self) -> Result<()>;

    /// Release engine resources. Safe to call more than once.
    fn destroy(&self);

    fn visual_multipliers(&self) -> VisualMultipliers;
}

/// Minimal engine: holds the baseline persona and follows system pressure
/// with a fixed mood and posture per state
#[derive(Default)]
pub struct BaselineEngine {
    inner: Mutex<EngineInner>,
}

#[derive(Default)]
struct EngineInner {
    persona: Option<PersonaState>,
    /// Last issued timestamp, kept across `destroy` so a reset never goes back in time
    clock: u64,
}

impl EngineInner {
    fn tick(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.clock = now.max(self.clock.saturating_add(1));
        self.clock
    }
}

impl BaselineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn baseline(now: u64) -> PersonaState {
        PersonaState {
            personality: Personality {
                traits: PersonalityTraits {
                    calm: 0.85,
                    precise: 0.92,
                    analytical: 0.88,
                    stable: 0.90,
                    responsive: 0.78,
                },
                temperament: Temperament::Focused,
                evolution: 0.0001,
            },
            mood: MoodState {
                current: Mood::Neutral,
                intensity: 0.6,
                duration: 0,
                trigger: MoodTrigger::Internal,
                visual_effect: MoodVisualEffect {
                    glow_shift: 0.0,
                    motion_speed: 1.0,
                    depth_intensity: 0.6,
                },
            },
            behavior: Behavior::with_posture(Posture::Relaxed),
            memory: PersonaMemory::default(),
            presence_level: 0.68,
            last_update: now,
        }
    }

    /// Mood, intensity and posture the engine settles into for a system state
    fn disposition(system_state: SystemState) -> (Mood, f64, Posture) {
        match system_state {
            SystemState::Stable => (Mood::Clear, 0.5, Posture::Relaxed),
            SystemState::Processing => (Mood::Attentive, 0.65, Posture::Attentive),
            SystemState::Warning => (Mood::Alert, 0.8, Posture::Vigilant),
            SystemState::Danger => (Mood::Alert, 0.95, Posture::Vigilant),
            SystemState::Null => (Mood::Neutral, 0.3, Posture::Minimal),
            SystemState::Offline => (Mood::Dormant, 0.1, Posture::Minimal),
        }
    }

    /// Apply `mutate` to the live state and stamp it. `mutate` receives the
    /// milliseconds elapsed since the previous stamp.
    fn with_state<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut PersonaState, u64),
    {
        let mut inner = self.inner.lock();
        let stamp = inner.tick();
        let state = inner
            .persona
            .as_mut()
            .ok_or_else(|| PresenceError::StateFetchFailure("engine not initialized".into()))?;

        let elapsed = stamp.saturating_sub(state.last_update);
        mutate(state, elapsed);
        state.last_update = stamp;
        Ok(())
    }
}

impl FallbackEngine for BaselineEngine {
    fn initialize(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.persona.is_none() {
            let stamp = inner.tick();
            inner.persona = Some(Self::baseline(stamp));
            debug!("Baseline persona engine initialized");
        }
        Ok(())
    }

    fn get_state(&self) -> Option<PersonaState> {
        self.inner.lock().persona.clone()
    }

    fn update(&self, system_state: SystemState, metrics: &SystemMetrics) -> Result<()> {
        let (mood, intensity, posture) = Self::disposition(system_state);
        let errors = metrics.errors;

        self.with_state(|state, elapsed| {
            if state.mood.current == mood {
                state.mood.duration += elapsed;
            } else {
                state.mood.current = mood;
                state.mood.duration = 0;
            }
            state.mood.intensity = if errors > 0 {
                (intensity + 0.05).min(1.0)
            } else {
                intensity
            };
            state.mood.trigger = MoodTrigger::System;
            state.mood.visual_effect.depth_intensity = state.mood.intensity;
            state.behavior.posture = posture;
        })
    }

    fn react(&self, kind: ReactionKind) -> Result<()> {
        self.with_state(|state, _| {
            let name = kind.as_str().to_string();
            if !state.behavior.active_reactions.contains(&name) {
                state.behavior.active_reactions.push(name);
            }
            if let Some(profile) = state.behavior.reactions.get(&kind) {
                state.mood.visual_effect.glow_shift = profile.glow_intensity;
            }
        })
    }

    fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let stamp = inner.tick();
        inner.persona = Some(Self::baseline(stamp));
        debug!("Baseline persona engine reset");
        Ok(())
    }

    fn destroy(&self) {
        if self.inner.lock().persona.take().is_some() {
            debug!("Baseline persona engine destroyed");
        }
    }

    fn visual_multipliers(&self) -> VisualMultipliers {
        match self.inner.lock().persona.as_ref() {
            Some(state) => VisualMultipliers {
                glow: 0.8 + state.mood.intensity * 0.4,
                motion: 0.8 + state.presence_level * 0.4,
                sound: 0.5,
                depth: state.mood.visual_effect.depth_intensity.clamp(0.0, 1.0),
            },
            None => VisualMultipliers::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_uninitialized_engine() {
        let engine = BaselineEngine::new();
        assert!(engine.get_state().is_none());
        assert!(engine.react(ReactionKind::Error).is_err());
        assert_eq!(engine.visual_multipliers(), VisualMultipliers::default());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let engine = BaselineEngine::new();
        engine.initialize().unwrap();
        engine.react(ReactionKind::Success).unwrap();
        engine.initialize().unwrap();

        let state = engine.get_state().unwrap();
        assert_eq!(state.behavior.active_reactions, vec!["success".to_string()]);
        assert_eq!(state.presence_level, 0.68);
    }

    #[test]
    fn test_update_follows_system_state() {
        let engine = BaselineEngine::new();
        engine.initialize().unwrap();
        let before = engine.get_state().unwrap().last_update;

        engine
            .update(SystemState::Danger, &SystemMetrics::new(95.0, 80.0, 0))
            .unwrap();
        let state = engine.get_state().unwrap();

        assert_eq!(state.mood.current, Mood::Alert);
        assert_eq!(state.behavior.posture, Posture::Vigilant);
        assert_eq!(state.mood.trigger, MoodTrigger::System);
        assert!(state.last_update > before);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let engine = BaselineEngine::new();
        engine.initialize().unwrap();

        let mut last = engine.get_state().unwrap().last_update;
        for _ in 0..50 {
            engine.react(ReactionKind::Idle).unwrap();
            let next = engine.get_state().unwrap().last_update;
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_reset_restores_baseline() {
        let engine = BaselineEngine::new();
        engine.initialize().unwrap();
        engine
            .update(SystemState::Warning, &SystemMetrics::new(80.0, 50.0, 1))
            .unwrap();
        engine.react(ReactionKind::Error).unwrap();
        let before = engine.get_state().unwrap().last_update;

        engine.reset().unwrap();
        let state = engine.get_state().unwrap();

        assert_eq!(state.mood.current, Mood::Neutral);
        assert_eq!(state.behavior.posture, Posture::Relaxed);
        assert!(state.behavior.active_reactions.is_empty());
        assert!(state.last_update > before);
    }

    #[test]
    fn test_reset_never_exposes_empty_state() {
        let engine = BaselineEngine::new();
        engine.initialize().unwrap();
        let missing = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..2_000 {
                        if engine.get_state().is_none() {
                            missing.fetch_add(1, Ordering::SeqCst);
                        }
                        if engine.react(ReactionKind::Idle).is_err() {
                            missing.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..2_000 {
                    engine.reset().unwrap();
                }
            });
        });

        assert_eq!(missing.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_destroy_clears_state() {
        let engine = BaselineEngine::new();
        engine.initialize().unwrap();
        engine.destroy();
        engine.destroy();

        assert!(engine.get_state().is_none());
        assert!(engine
            .update(SystemState::Stable, &SystemMetrics::default())
            .is_err());
    }
}
