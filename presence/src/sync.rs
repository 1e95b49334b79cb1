//! Persona synchronization loop
//!
//! Owns the canonical persona state for one mounted scope. After the bridge
//! has been initialized, a fixed-interval timer polls the adapter; a tick
//! that finds the previous poll still in flight is skipped. Every response,
//! whether from a poll or from a command, goes through the same acceptance
//! step: it is applied only if its `last_update` is not older than the
//! cached one, and only while the loop is alive.
//!
//! ```text
//! Idle ─▶ Initializing ─▶ NativeActive / FallbackActive ◀─▶ Degraded
//!   │          │                        │                      │
//!   └──────────┴────────── teardown ────┴──────────────────────┴─▶ TornDown
//! ```

use parking_lot::{Mutex, RwLock};
use presence_bridge::{BridgeAdapter, TransportMode};
use presence_core::{
    LivingEnginesState, PersonaSample, PersonaState, ReactionKind, SystemMetrics, SystemState,
    VisualMultipliers,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;

/// Lifecycle phase of a [`SyncLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Initializing,
    NativeActive,
    FallbackActive,
    /// Consecutive failures reached the threshold; polling continues
    Degraded,
    TornDown,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::NativeActive => "native-active",
            Self::FallbackActive => "fallback-active",
            Self::Degraded => "degraded",
            Self::TornDown => "torn-down",
        };
        f.write_str(name)
    }
}

/// Outcome of offering a response to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Cached and published
    Accepted,
    /// Older than the cached state; discarded
    Stale,
    /// The adapter returned nothing
    Failed,
    /// The loop is not initialized or already torn down
    Inactive,
}

type Listener = Box<dyn Fn(&LivingEnginesState) + Send + Sync>;

struct Cache {
    persona: Option<PersonaState>,
    multipliers: VisualMultipliers,
    system_state: SystemState,
}

pub(crate) struct LoopInner {
    adapter: Arc<dyn BridgeAdapter>,
    config: SyncConfig,
    alive: AtomicBool,
    started: AtomicBool,
    initialized: AtomicBool,
    polling: AtomicBool,
    failures: AtomicU32,
    phase: Mutex<LoopPhase>,
    cache: Mutex<Cache>,
    state: watch::Sender<LivingEnginesState>,
    listeners: RwLock<Vec<Listener>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the single-flight flag when a poll settles or is dropped
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LoopInner {
    pub(crate) fn alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Initialized and not torn down
    pub(crate) fn ready(&self) -> bool {
        self.initialized.load(Ordering::SeqCst) && self.alive()
    }

    fn active_phase(&self) -> LoopPhase {
        match self.adapter.mode() {
            TransportMode::Native => LoopPhase::NativeActive,
            _ => LoopPhase::FallbackActive,
        }
    }

    async fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Persona sync already started");
            return;
        }
        if !self.alive() {
            return;
        }

        *self.phase.lock() = LoopPhase::Initializing;
        info!("Initializing persona bridge ({})", self.adapter.mode());

        match self.adapter.initialize().await {
            Ok(()) => info!("Persona bridge initialized"),
            Err(e) => error!("Persona bridge initialization failed: {}", e),
        }

        {
            let _cache = self.cache.lock();
            if !self.alive() {
                return;
            }
            self.initialized.store(true, Ordering::SeqCst);
            *self.phase.lock() = self.active_phase();

            let snapshot = self.state.borrow().mark_initialized();
            self.publish(snapshot);
        }

        self.spawn_timer();
    }

    fn spawn_timer(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let period = self.config.interval();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                if !inner.alive() {
                    break;
                }
                inner.tick();
            }
        });

        *self.timer.lock() = Some(handle);

        // Teardown may have raced the spawn
        if !self.alive() {
            if let Some(handle) = self.timer.lock().take() {
                handle.abort();
            }
        }
    }

    fn tick(self: &Arc<Self>) {
        if self.polling.swap(true, Ordering::SeqCst) {
            debug!("Skipping tick: previous poll still in flight");
            return;
        }

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let _flight = FlightGuard(&inner.polling);
            inner.poll().await;
        });
    }

    async fn poll(&self) -> Acceptance {
        let mut sample = self.adapter.get_state().await;
        if let Some(sample) = sample.as_mut() {
            if sample.multipliers.is_none() {
                sample.multipliers = self.adapter.get_multipliers().await;
            }
        }
        self.settle("poll", sample)
    }

    pub(crate) async fn update(
        &self,
        system_state: SystemState,
        metrics: SystemMetrics,
    ) -> Acceptance {
        if !self.ready() {
            return Acceptance::Inactive;
        }
        self.cache.lock().system_state = system_state;

        let sample = self.adapter.update(system_state, metrics).await;
        self.settle("update", sample)
    }

    pub(crate) async fn react(&self, kind: ReactionKind) -> Acceptance {
        if !self.ready() {
            return Acceptance::Inactive;
        }
        let sample = self.adapter.react(kind).await;
        self.settle("react", sample)
    }

    pub(crate) async fn reset(&self) -> Acceptance {
        if !self.ready() {
            return Acceptance::Inactive;
        }
        let sample = self.adapter.reset().await;
        self.settle("reset", sample)
    }

    fn settle(&self, operation: &str, sample: Option<PersonaSample>) -> Acceptance {
        if !self.alive() {
            debug!("Ignoring {} result after teardown", operation);
            return Acceptance::Inactive;
        }

        match sample {
            Some(PersonaSample {
                persona,
                multipliers,
            }) => self.accept(operation, persona, multipliers),
            None => {
                self.record_failure(operation);
                Acceptance::Failed
            }
        }
    }

    fn accept(
        &self,
        operation: &str,
        persona: PersonaState,
        multipliers: Option<VisualMultipliers>,
    ) -> Acceptance {
        let mut cache = self.cache.lock();
        if !self.alive() {
            return Acceptance::Inactive;
        }

        if let Some(current) = &cache.persona {
            if persona.last_update < current.last_update {
                debug!(
                    "Discarding stale {} response ({} < {})",
                    operation, persona.last_update, current.last_update
                );
                return Acceptance::Stale;
            }
        }

        if let Some(multipliers) = multipliers {
            cache.multipliers = multipliers;
        }
        let snapshot =
            LivingEnginesState::from_persona(cache.system_state, cache.multipliers, &persona);
        cache.persona = Some(persona);

        self.record_success();
        self.publish(snapshot);
        Acceptance::Accepted
    }

    /// Replace the published snapshot. Callers hold the cache lock.
    fn publish(&self, snapshot: LivingEnginesState) {
        for listener in self.listeners.read().iter() {
            listener(&snapshot);
        }
        self.state.send_replace(snapshot);
    }

    fn record_failure(&self, operation: &str) {
        let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("{} returned no state ({} consecutive)", operation, failures);

        if failures >= self.config.degraded_threshold {
            let mut phase = self.phase.lock();
            if matches!(*phase, LoopPhase::NativeActive | LoopPhase::FallbackActive) {
                *phase = LoopPhase::Degraded;
                warn!(
                    "Persona sync degraded after {} consecutive failures",
                    failures
                );
            }
        }
    }

    fn record_success(&self) {
        self.failures.store(0, Ordering::SeqCst);

        let mut phase = self.phase.lock();
        if *phase == LoopPhase::Degraded {
            *phase = self.active_phase();
            info!("Persona sync recovered ({})", *phase);
        }
    }

    fn teardown(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }

        // Waits out an acceptance already past its liveness check
        let fence = self.cache.lock();
        *self.phase.lock() = LoopPhase::TornDown;
        drop(fence);

        self.adapter.shutdown();
        info!("Persona sync torn down");
    }
}

/// Fixed-interval persona synchronization loop
///
/// Dropping the loop tears it down.
pub struct SyncLoop {
    inner: Arc<LoopInner>,
}

impl SyncLoop {
    pub fn new(adapter: Arc<dyn BridgeAdapter>, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(LivingEnginesState::default());

        Self {
            inner: Arc::new(LoopInner {
                adapter,
                config,
                alive: AtomicBool::new(true),
                started: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                polling: AtomicBool::new(false),
                failures: AtomicU32::new(0),
                phase: Mutex::new(LoopPhase::Idle),
                cache: Mutex::new(Cache {
                    persona: None,
                    multipliers: VisualMultipliers::default(),
                    system_state: SystemState::default(),
                }),
                state,
                listeners: RwLock::new(Vec::new()),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Initialize the bridge and start polling
    ///
    /// Completes once `initialize` has settled, whatever its outcome. Only
    /// the first call has any effect.
    pub async fn start(&self) {
        self.inner.start().await;
    }

    /// Run [`start`](Self::start) on the current runtime without waiting
    ///
    /// Returns `None` when called outside a Tokio runtime; the loop then
    /// stays idle until [`start`](Self::start) is awaited.
    pub fn spawn_start(&self) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("Persona sync not started: no async runtime");
            return None;
        };
        let inner = Arc::clone(&self.inner);
        Some(runtime.spawn(async move { inner.start().await }))
    }

    /// Latest published snapshot
    pub fn state(&self) -> LivingEnginesState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LivingEnginesState> {
        self.inner.state.subscribe()
    }

    pub fn phase(&self) -> LoopPhase {
        *self.inner.phase.lock()
    }

    pub fn transport(&self) -> TransportMode {
        self.inner.adapter.mode()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive()
    }

    /// Consecutive failed adapter calls
    pub fn failures(&self) -> u32 {
        self.inner.failures.load(Ordering::SeqCst)
    }

    /// Call `listener` with every snapshot published from now on
    ///
    /// Listeners run synchronously inside the publish step and are never
    /// called after teardown.
    pub fn on_publish<F>(&self, listener: F)
    where
        F: Fn(&LivingEnginesState) + Send + Sync + 'static,
    {
        self.inner.listeners.write().push(Box::new(listener));
    }

    /// Call `listener` with the current snapshot, then as
    /// [`on_publish`](Self::on_publish) does. Returns `false`, without
    /// calling or keeping the listener, once the loop is torn down.
    pub fn attach<F>(&self, listener: F) -> bool
    where
        F: Fn(&LivingEnginesState) + Send + Sync + 'static,
    {
        let _cache = self.inner.cache.lock();
        if !self.inner.alive() {
            return false;
        }
        let current = self.inner.state.borrow().clone();
        listener(&current);
        self.inner.listeners.write().push(Box::new(listener));
        true
    }

    pub async fn update(&self, system_state: SystemState, metrics: SystemMetrics) -> Acceptance {
        self.inner.update(system_state, metrics).await
    }

    pub async fn react(&self, kind: ReactionKind) -> Acceptance {
        self.inner.react(kind).await
    }

    pub async fn reset(&self) -> Acceptance {
        self.inner.reset().await
    }

    /// Stop polling and ignore every result still in flight
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    pub(crate) fn downgrade(&self) -> Weak<LoopInner> {
        Arc::downgrade(&self.inner)
    }
}

impl Drop for SyncLoop {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}
