//! Bridge adapters
//!
//! One interface over both transports. Apart from `initialize`, adapter calls
//! never fail: errors from the channel, the normalizer or the engine are
//! logged here and surface as `None`.
//!
//! State-returning calls answer with a [`PersonaSample`]: the normalized
//! persona plus any multipliers the backend sent with it.

use async_trait::async_trait;
use presence_core::{
    normalize_sample, PersonaSample, PresenceError, ReactionKind, Result, SystemMetrics,
    SystemState, VisualMultipliers,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::channel::{commands, PersonaChannel, SocketChannel};
use crate::fallback::{BaselineEngine, FallbackEngine};
use crate::transport::TransportMode;

/// State and command surface shared by the native and fallback transports
#[async_trait]
pub trait BridgeAdapter: Send + Sync {
    /// Transport this adapter talks to
    fn mode(&self) -> TransportMode;

    /// Start the backend. Fails with [`PresenceError::InitializationFailure`].
    async fn initialize(&self) -> Result<()>;

    async fn get_state(&self) -> Option<PersonaSample>;

    async fn update(
        &self,
        system_state: SystemState,
        metrics: SystemMetrics,
    ) -> Option<PersonaSample>;

    async fn react(&self, kind: ReactionKind) -> Option<PersonaSample>;

    async fn reset(&self) -> Option<PersonaSample>;

    async fn get_multipliers(&self) -> Option<VisualMultipliers>;

    /// Release transport resources on teardown
    fn shutdown(&self) {}
}

/// Adapter over the native backend's IPC command surface
pub struct NativeAdapter<C> {
    channel: C,
}

impl<C: PersonaChannel> NativeAdapter<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Invoke a state-returning command and normalize its payload
    async fn persona(&self, command: &str, args: Value) -> Option<PersonaSample> {
        let raw = match self.channel.invoke(command, args).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} failed: {}", command, e);
                return None;
            }
        };

        match normalize_sample(&raw) {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!("Discarding malformed {} payload: {}", command, e);
                None
            }
        }
    }
}

#[async_trait]
impl<C: PersonaChannel> BridgeAdapter for NativeAdapter<C> {
    fn mode(&self) -> TransportMode {
        TransportMode::Native
    }

    async fn initialize(&self) -> Result<()> {
        self.channel
            .invoke(commands::INITIALIZE, Value::Null)
            .await
            .map(|_| ())
            .map_err(|e| PresenceError::InitializationFailure(e.to_string()))
    }

    async fn get_state(&self) -> Option<PersonaSample> {
        self.persona(commands::GET_STATE, Value::Null).await
    }

    async fn update(
        &self,
        system_state: SystemState,
        metrics: SystemMetrics,
    ) -> Option<PersonaSample> {
        let args = json!({
            "systemState": system_state.as_str(),
            "cpu": metrics.cpu,
            "memory": metrics.memory,
            "errors": metrics.errors,
        });
        self.persona(commands::UPDATE, args).await
    }

    async fn react(&self, kind: ReactionKind) -> Option<PersonaSample> {
        self.persona(commands::REACT, json!({ "reactionType": kind.as_str() }))
            .await
    }

    async fn reset(&self) -> Option<PersonaSample> {
        self.persona(commands::RESET, Value::Null).await
    }

    async fn get_multipliers(&self) -> Option<VisualMultipliers> {
        let raw = match self.channel.invoke(commands::GET_MULTIPLIERS, Value::Null).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} failed: {}", commands::GET_MULTIPLIERS, e);
                return None;
            }
        };

        serde_json::from_value(raw)
            .map_err(|e| warn!("Discarding malformed multipliers: {}", e))
            .ok()
    }
}

/// Adapter over an in-process [`FallbackEngine`]
pub struct FallbackAdapter<E> {
    engine: E,
}

impl<E: FallbackEngine> FallbackAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn settle(&self, operation: &str, outcome: Result<()>) -> Option<PersonaSample> {
        match outcome {
            Ok(()) => self.snapshot(),
            Err(e) => {
                warn!("Fallback {} failed: {}", operation, e);
                None
            }
        }
    }

    /// Current persona with the engine's multipliers for it
    fn snapshot(&self) -> Option<PersonaSample> {
        let Some(persona) = self.engine.get_state() else {
            debug!("Fallback engine has no state");
            return None;
        };
        Some(PersonaSample {
            persona,
            multipliers: Some(self.engine.visual_multipliers()),
        })
    }
}

#[async_trait]
impl<E: FallbackEngine> BridgeAdapter for FallbackAdapter<E> {
    fn mode(&self) -> TransportMode {
        TransportMode::Fallback
    }

    async fn initialize(&self) -> Result<()> {
        self.engine
            .initialize()
            .map_err(|e| PresenceError::InitializationFailure(e.to_string()))
    }

    async fn get_state(&self) -> Option<PersonaSample> {
        self.snapshot()
    }

    async fn update(
        &self,
        system_state: SystemState,
        metrics: SystemMetrics,
    ) -> Option<PersonaSample> {
        let outcome = self.engine.update(system_state, &metrics);
        self.settle("update", outcome)
    }

    async fn react(&self, kind: ReactionKind) -> Option<PersonaSample> {
        let outcome = self.engine.react(kind);
        self.settle("react", outcome)
    }

    async fn reset(&self) -> Option<PersonaSample> {
        let outcome = self.engine.reset();
        self.settle("reset", outcome)
    }

    async fn get_multipliers(&self) -> Option<VisualMultipliers> {
        Some(self.engine.visual_multipliers())
    }

    fn shutdown(&self) {
        self.engine.destroy();
    }
}

/// Build the adapter for a resolved transport
///
/// `Unresolved` is treated as fallback; callers are expected to pass
/// [`TransportResolver::resolve`](crate::TransportResolver::resolve)'s answer.
pub fn adapter_for(
    mode: TransportMode,
    socket_path: impl Into<PathBuf>,
    timeout: Duration,
) -> Arc<dyn BridgeAdapter> {
    match mode {
        TransportMode::Native => Arc::new(NativeAdapter::new(SocketChannel::new(
            socket_path,
            timeout,
        ))),
        TransportMode::Fallback | TransportMode::Unresolved => {
            Arc::new(FallbackAdapter::new(BaselineEngine::new()))
        }
    }
}
