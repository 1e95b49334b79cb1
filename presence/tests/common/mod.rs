//! Scripted adapters and persona fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use presence::config::SyncConfig;
use presence_bridge::{BridgeAdapter, PersonaChannel, TransportMode};
use presence_core::{
    normalize, PersonaSample, PersonaState, PresenceError, ReactionKind, Result, SystemMetrics,
    SystemState, VisualMultipliers,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Raw native payload
pub fn raw_persona(mood: &str, intensity: f64, presence: f64, timestamp: u64) -> Value {
    json!({
        "personality": {
            "traits": { "calm": 0.85, "precise": 0.92, "analytical": 0.88, "stable": 0.9, "responsive": 0.78 },
            "temperament": "Focused",
            "evolution": 0.0001
        },
        "mood": { "current": mood, "intensity": intensity, "duration": 0 },
        "behavior": { "posture": "Relaxed", "active_reactions": [] },
        "presence_level": presence,
        "timestamp": timestamp
    })
}

pub fn persona(mood: &str, timestamp: u64) -> PersonaState {
    persona_with(mood, 0.6, 0.68, timestamp)
}

pub fn persona_with(mood: &str, intensity: f64, presence: f64, timestamp: u64) -> PersonaState {
    normalize(&raw_persona(mood, intensity, presence, timestamp)).unwrap()
}

pub fn sync_config(interval_ms: u64, degraded_threshold: u32) -> SyncConfig {
    SyncConfig {
        interval_ms,
        degraded_threshold,
    }
}

/// One scripted adapter answer
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub persona: Option<PersonaState>,
}

impl Step {
    pub fn ok(delay_ms: u64, persona: PersonaState) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            persona: Some(persona),
        }
    }

    pub fn fail(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            persona: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Calls {
    pub initialize: AtomicUsize,
    pub get_state: AtomicUsize,
    pub update: AtomicUsize,
    pub react: AtomicUsize,
    pub reset: AtomicUsize,
    pub shutdown: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Adapter answering polls and commands from scripts
///
/// Polls pop from `polls` and repeat `idle` once the script runs out.
/// `update`, `react` and `reset` share the `commands` script. Multiplier
/// fetches pop from `multipliers` and answer `None` once it runs out.
pub struct MockAdapter {
    mode: TransportMode,
    init_error: bool,
    polls: Mutex<VecDeque<Step>>,
    idle: Mutex<Step>,
    commands: Mutex<VecDeque<Step>>,
    multipliers: Mutex<VecDeque<Option<VisualMultipliers>>>,
    pub calls: Calls,
    pub poll_started: Mutex<Vec<Instant>>,
    pub updates: Mutex<Vec<(SystemState, SystemMetrics)>>,
}

impl MockAdapter {
    pub fn new(mode: TransportMode) -> Self {
        Self {
            mode,
            init_error: false,
            polls: Mutex::new(VecDeque::new()),
            idle: Mutex::new(Step::fail(0)),
            commands: Mutex::new(VecDeque::new()),
            multipliers: Mutex::new(VecDeque::new()),
            calls: Calls::default(),
            poll_started: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.init_error = true;
        self
    }

    pub fn polls(self, steps: Vec<Step>) -> Self {
        *self.polls.lock() = steps.into();
        self
    }

    pub fn idle(self, step: Step) -> Self {
        *self.idle.lock() = step;
        self
    }

    pub fn commands(self, steps: Vec<Step>) -> Self {
        *self.commands.lock() = steps.into();
        self
    }

    pub fn multipliers(self, script: Vec<Option<VisualMultipliers>>) -> Self {
        *self.multipliers.lock() = script.into();
        self
    }

    pub fn set_idle(&self, step: Step) {
        *self.idle.lock() = step;
    }

    async fn run(&self, step: Step) -> Option<PersonaSample> {
        let now = self.calls.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(step.delay).await;

        self.calls.in_flight.fetch_sub(1, Ordering::SeqCst);
        step.persona.map(PersonaSample::from)
    }

    async fn command(&self) -> Option<PersonaSample> {
        let step = self.commands.lock().pop_front();
        match step {
            Some(step) => {
                tokio::time::sleep(step.delay).await;
                step.persona.map(PersonaSample::from)
            }
            None => None,
        }
    }
}

#[async_trait]
impl BridgeAdapter for MockAdapter {
    fn mode(&self) -> TransportMode {
        self.mode
    }

    async fn initialize(&self) -> Result<()> {
        self.calls.initialize.fetch_add(1, Ordering::SeqCst);
        if self.init_error {
            Err(PresenceError::InitializationFailure("backend refused".into()))
        } else {
            Ok(())
        }
    }

    async fn get_state(&self) -> Option<PersonaSample> {
        self.calls.get_state.fetch_add(1, Ordering::SeqCst);
        self.poll_started.lock().push(Instant::now());

        let step = self.polls.lock().pop_front();
        let step = step.unwrap_or_else(|| self.idle.lock().clone());
        self.run(step).await
    }

    async fn update(
        &self,
        system_state: SystemState,
        metrics: SystemMetrics,
    ) -> Option<PersonaSample> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().push((system_state, metrics));
        self.command().await
    }

    async fn react(&self, _kind: ReactionKind) -> Option<PersonaSample> {
        self.calls.react.fetch_add(1, Ordering::SeqCst);
        self.command().await
    }

    async fn reset(&self) -> Option<PersonaSample> {
        self.calls.reset.fetch_add(1, Ordering::SeqCst);
        self.command().await
    }

    async fn get_multipliers(&self) -> Option<VisualMultipliers> {
        self.multipliers.lock().pop_front().flatten()
    }

    fn shutdown(&self) {
        self.calls.shutdown.fetch_add(1, Ordering::SeqCst);
    }
}

/// IPC channel answering each command from its own script
#[derive(Default)]
pub struct ScriptedChannel {
    replies: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
}

impl ScriptedChannel {
    pub fn reply(self, command: &str, reply: Result<Value>) -> Self {
        self.replies
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }
}

#[async_trait]
impl PersonaChannel for ScriptedChannel {
    async fn invoke(&self, command: &str, _args: Value) -> Result<Value> {
        self.replies
            .lock()
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(PresenceError::Unavailable(command.to_string())))
    }
}
