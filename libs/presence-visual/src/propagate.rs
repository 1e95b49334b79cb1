//! System-state propagation into the style-variable sink

use presence_core::SystemState;
use std::sync::Arc;

use crate::engines::{
    DepthEngine, DepthLayer, GlowEngine, ModuleGlowEngine, ModuleMotionEngine, ModuleTables,
    MotionEngine, SinkDepthEngine,
};
use crate::sink::VisualSink;

/// Sink key names
pub mod keys {
    pub const SYSTEM_STATE: &str = "system-state";
    pub const SYSTEM_STATE_INTENSITY: &str = "system-state-intensity";

    /// `module-{id}-{field}`
    pub fn module(module_id: &str, field: &str) -> String {
        format!("module-{}-{}", module_id, field)
    }
}

/// Depth layers rewritten on every publish, back to front
pub const DEPTH_LAYERS: [(&str, DepthLayer); 3] = [
    ("far", DepthLayer::new(0.6, 0.3)),
    ("mid", DepthLayer::new(0.8, 0.6)),
    ("near", DepthLayer::new(1.0, 1.0)),
];

/// Publishes system state and module parameters into a [`VisualSink`]
pub struct Propagator {
    sink: Arc<dyn VisualSink>,
    glow: Box<dyn GlowEngine>,
    motion: Box<dyn MotionEngine>,
    depth: Box<dyn DepthEngine>,
}

impl Propagator {
    pub fn new(
        sink: Arc<dyn VisualSink>,
        glow: Box<dyn GlowEngine>,
        motion: Box<dyn MotionEngine>,
        depth: Box<dyn DepthEngine>,
    ) -> Self {
        Self {
            sink,
            glow,
            motion,
            depth,
        }
    }

    /// Table-driven engines, depth layers written into the same sink
    pub fn with_tables(sink: Arc<dyn VisualSink>, tables: &ModuleTables) -> Self {
        Self::new(
            Arc::clone(&sink),
            Box::new(ModuleGlowEngine::new(tables)),
            Box::new(ModuleMotionEngine::new(tables)),
            Box::new(SinkDepthEngine::new(Arc::clone(&sink))),
        )
    }

    pub fn sink(&self) -> &Arc<dyn VisualSink> {
        &self.sink
    }

    /// Publish `state` globally and, with `module_id`, that module's glow and
    /// motion. Returns the intensity used.
    ///
    /// Idempotent: identical inputs leave the sink with identical contents.
    pub fn publish(&self, state: SystemState, module_id: Option<&str>) -> u8 {
        let intensity = state.intensity();

        self.sink
            .set(keys::SYSTEM_STATE_INTENSITY, &intensity.to_string());
        self.sink.set(keys::SYSTEM_STATE, state.as_str());

        if let Some(id) = module_id {
            self.publish_module(id, intensity);
        }

        for (name, layer) in DEPTH_LAYERS {
            self.depth.update_layer(name, layer);
        }

        self.sink.flush();
        intensity
    }

    fn publish_module(&self, id: &str, intensity: u8) {
        if let Some(glow) = self.glow.glow(id, intensity) {
            self.sink
                .set(&keys::module(id, "glow-intensity"), &format_number(glow.intensity));
            self.sink.set(&keys::module(id, "glow-color"), &glow.color);
            self.sink.set(
                &keys::module(id, "glow-blur"),
                &format!("{}px", format_number(glow.blur)),
            );
        }

        if let Some(motion) = self.motion.module_motion(id, intensity) {
            self.sink
                .set(&keys::module(id, "motion-type"), motion.kind.as_str());
            self.sink.set(
                &keys::module(id, "motion-duration"),
                &format!("{}ms", motion.duration_ms),
            );
        }
    }
}

/// Shortest decimal form, rounded to four places
fn format_number(value: f64) -> String {
    ((value * 10_000.0).round() / 10_000.0).to_string()
}
