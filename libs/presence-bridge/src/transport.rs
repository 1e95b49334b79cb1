//! Transport selection
//!
//! The capability probe is consulted exactly once per resolver; the answer
//! is cached for the rest of the session. Switching transports means building
//! a new resolver (and a new loop), never an implicit re-check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Which channel the synchronization loop talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Unresolved,
    Native,
    Fallback,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unresolved => "unresolved",
            Self::Native => "native",
            Self::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Detects whether the native bridge entry point exists in this environment
pub trait CapabilityProbe: Send + Sync {
    fn native_available(&self) -> bool;
}

impl<F> CapabilityProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn native_available(&self) -> bool {
        self()
    }
}

/// Treats the backend socket's presence on disk as the capability marker
#[derive(Debug, Clone)]
pub struct SocketProbe {
    socket_path: PathBuf,
}

impl SocketProbe {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl CapabilityProbe for SocketProbe {
    fn native_available(&self) -> bool {
        self.socket_path.exists()
    }
}

/// Resolves the transport once and caches it
pub struct TransportResolver {
    probe: Box<dyn CapabilityProbe>,
    mode: OnceLock<TransportMode>,
}

impl TransportResolver {
    pub fn new(probe: impl CapabilityProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            mode: OnceLock::new(),
        }
    }

    /// Resolver pinned to a mode without probing
    pub fn fixed(mode: TransportMode) -> Self {
        let resolver = Self::new(move || mode == TransportMode::Native);
        // A fresh OnceLock is always empty, so this cannot be rejected.
        let _ = resolver.mode.set(mode);
        resolver
    }

    /// Decide the transport, probing on first call only
    pub fn resolve(&self) -> TransportMode {
        *self.mode.get_or_init(|| {
            let mode = if self.probe.native_available() {
                TransportMode::Native
            } else {
                TransportMode::Fallback
            };
            info!("Persona transport resolved: {}", mode);
            mode
        })
    }

    /// Current mode without triggering resolution
    pub fn mode(&self) -> TransportMode {
        self.mode.get().copied().unwrap_or(TransportMode::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_probe_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolver = TransportResolver::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        assert_eq!(resolver.mode(), TransportMode::Unresolved);
        assert_eq!(resolver.resolve(), TransportMode::Native);
        assert_eq!(resolver.resolve(), TransportMode::Native);
        assert_eq!(resolver.mode(), TransportMode::Native);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_marker_absent_is_fallback() {
        let resolver = TransportResolver::new(|| false);
        assert_eq!(resolver.resolve(), TransportMode::Fallback);
    }

    #[test]
    fn test_cached_mode_ignores_later_marker() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("persona.sock");
        let resolver = TransportResolver::new(SocketProbe::new(&socket));

        assert_eq!(resolver.resolve(), TransportMode::Fallback);

        std::fs::write(&socket, b"").unwrap();
        assert!(SocketProbe::new(&socket).native_available());
        assert_eq!(resolver.resolve(), TransportMode::Fallback);
    }

    #[test]
    fn test_fixed_resolver() {
        let resolver = TransportResolver::fixed(TransportMode::Native);
        assert_eq!(resolver.mode(), TransportMode::Native);
        assert_eq!(resolver.resolve(), TransportMode::Native);
    }
}
