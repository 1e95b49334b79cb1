//! Consumer-facing living engines handle
//!
//! Bundles one [`SyncLoop`] with its dispatcher and exposes the state plus
//! the actions widgets are allowed to take. Visual propagation is composed
//! explicitly through [`LivingEngines::attach_visuals`].

use presence_bridge::{adapter_for, BridgeAdapter, SocketProbe, TransportMode, TransportResolver};
use presence_core::{LivingEnginesState, ReactionKind, SystemMetrics, SystemState};
use presence_visual::Propagator;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::info;

use crate::config::{PresenceConfig, SyncConfig};
use crate::dispatch::ReactionDispatcher;
use crate::sync::{Acceptance, LoopInner, LoopPhase, SyncLoop};

/// One mounted persona scope
pub struct LivingEngines {
    sync: SyncLoop,
    dispatcher: ReactionDispatcher,
}

impl LivingEngines {
    /// Mount over an already selected adapter. Initialization runs in the
    /// background; watch [`subscribe`](Self::subscribe) for `initialized`.
    ///
    /// Outside a Tokio runtime nothing is spawned and the scope stays idle
    /// until `sync().start()` is awaited.
    pub fn mount(adapter: Arc<dyn BridgeAdapter>, config: SyncConfig) -> Self {
        let sync = SyncLoop::new(adapter, config);
        let dispatcher = ReactionDispatcher::new(&sync);
        sync.spawn_start();
        Self { sync, dispatcher }
    }

    /// Resolve the transport once from `config` and mount over it
    pub fn connect(config: &PresenceConfig) -> Self {
        let resolver = if config.transport.force_fallback {
            TransportResolver::fixed(TransportMode::Fallback)
        } else {
            TransportResolver::new(SocketProbe::new(&config.transport.socket_path))
        };
        Self::connect_with(&resolver, config)
    }

    /// Mount over whatever `resolver` selects
    pub fn connect_with(resolver: &TransportResolver, config: &PresenceConfig) -> Self {
        let mode = resolver.resolve();
        let adapter = adapter_for(
            mode,
            &config.transport.socket_path,
            config.transport.request_timeout(),
        );
        info!("Mounting living engines over {} transport", mode);
        Self::mount(adapter, config.sync.clone())
    }

    pub fn state(&self) -> LivingEnginesState {
        self.sync.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LivingEnginesState> {
        self.sync.subscribe()
    }

    pub fn phase(&self) -> LoopPhase {
        self.sync.phase()
    }

    pub fn transport(&self) -> TransportMode {
        self.sync.transport()
    }

    pub fn sync(&self) -> &SyncLoop {
        &self.sync
    }

    pub fn actions(&self) -> Actions {
        Actions {
            target: self.sync.downgrade(),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Publish the current and every later accepted snapshot's system state
    /// through `propagator`. After teardown nothing is written and `false`
    /// is returned.
    pub fn attach_visuals(&self, propagator: Propagator, module_id: Option<String>) -> bool {
        self.sync.attach(move |snapshot| {
            propagator.publish(snapshot.system_state, module_id.as_deref());
        })
    }

    /// Tear the scope down. In-flight results are ignored from here on.
    pub fn unmount(self) {
        self.sync.teardown();
    }
}

/// Cloneable handle to the actions of a mounted scope
///
/// Every action is a no-op returning [`Acceptance::Inactive`] once the
/// scope is gone.
#[derive(Clone)]
pub struct Actions {
    target: Weak<LoopInner>,
    dispatcher: ReactionDispatcher,
}

impl Actions {
    pub async fn update_system_state(&self, state: SystemState) -> Acceptance {
        self.report_metrics(state, SystemMetrics::default()).await
    }

    /// Send `state` together with measured load
    pub async fn report_metrics(&self, state: SystemState, metrics: SystemMetrics) -> Acceptance {
        match self.target.upgrade() {
            Some(inner) => inner.update(state, metrics).await,
            None => Acceptance::Inactive,
        }
    }

    /// Fire-and-forget reaction. Returns whether it was issued.
    pub fn trigger_persona_reaction(&self, kind: ReactionKind) -> bool {
        self.dispatcher.dispatch(kind)
    }

    /// `load > 0.8` is danger, `> 0.6` warning, anything else stable
    pub async fn update_cognitive_load(&self, load: f64) -> Acceptance {
        self.report_metrics(
            SystemState::from_cognitive_load(load),
            SystemMetrics::for_cognitive_load(load),
        )
        .await
    }

    pub async fn reset_persona(&self) -> Acceptance {
        match self.target.upgrade() {
            Some(inner) => inner.reset().await,
            None => Acceptance::Inactive,
        }
    }

    /// Whether the scope behind this handle still exists
    pub fn is_mounted(&self) -> bool {
        self.target.upgrade().map_or(false, |inner| inner.alive())
    }
}
