//! System load sampling
//!
//! Reads CPU and memory usage with `sysinfo` and feeds the derived system
//! state into the persona on a fixed interval.

use presence_core::{SystemMetrics, SystemState};
use std::time::Duration;
use sysinfo::System;
use tracing::debug;

use crate::engines::Actions;
use crate::sync::Acceptance;

/// CPU and memory sampler
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }

    /// Take one reading. CPU usage is measured since the previous call.
    pub fn sample(&mut self) -> SystemMetrics {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu = f64::from(self.system.global_cpu_usage());
        let total = self.system.total_memory();
        let memory = if total > 0 {
            self.system.used_memory() as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        SystemMetrics::new(cpu, memory, 0)
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// System state implied by the busier of CPU and memory
pub fn classify(metrics: &SystemMetrics) -> SystemState {
    let peak = metrics.cpu.max(metrics.memory);
    if peak >= 90.0 {
        SystemState::Danger
    } else if peak >= 75.0 {
        SystemState::Warning
    } else if peak >= 50.0 {
        SystemState::Processing
    } else {
        SystemState::Stable
    }
}

/// Sample every `interval` and report to `actions` until the scope is gone
pub async fn run(actions: Actions, interval: Duration) {
    let mut sampler = SystemSampler::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let metrics = sampler.sample();
        let state = classify(&metrics);
        debug!(
            "Sampled cpu {:.1}% memory {:.1}% -> {}",
            metrics.cpu, metrics.memory, state
        );

        if actions.report_metrics(state, metrics).await == Acceptance::Inactive
            && !actions.is_mounted()
        {
            debug!("Sampler stopping: scope unmounted");
            break;
        }
    }
}
